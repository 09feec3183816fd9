mod ai_session;
mod available_slot;
mod interview;
mod notification;
mod user;

pub use ai_session::*;
pub use available_slot::*;
pub use interview::*;
pub use notification::*;
pub use user::*;
