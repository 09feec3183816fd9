mod ai_session_repository;
mod interview_repository;
mod notification_repository;
mod slot_repository;
mod user_repository;

pub use ai_session_repository::AiSessionRepository;
pub use interview_repository::InterviewRepository;
pub use notification_repository::NotificationRepository;
pub use slot_repository::SlotRepository;
pub use user_repository::UserRepository;
