use time::{Date, Duration, OffsetDateTime, UtcOffset};

use super::time_label::TimeOfDay;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowViolation {
    PastDate,
    TooSoon { buffer_minutes: i32 },
}

impl WindowViolation {
    pub fn message(self) -> String {
        match self {
            WindowViolation::PastDate => "cannot book a date in the past".to_string(),
            WindowViolation::TooSoon { buffer_minutes } => format!(
                "time slot must start at least {} minutes from now",
                buffer_minutes
            ),
        }
    }
}

/// Decides which `(date, time)` pairs can still be booked.
///
/// "Today" and "now" are read in the business offset, not in the offset of
/// whichever instant the clock returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingWindow {
    pub buffer_minutes: i32,
    pub offset: UtcOffset,
}

impl BookingWindow {
    pub fn new(buffer_minutes: i32, offset: UtcOffset) -> Self {
        Self {
            buffer_minutes,
            offset,
        }
    }

    pub fn today(&self, now: OffsetDateTime) -> Date {
        now.to_offset(self.offset).date()
    }

    pub fn is_past_day(&self, date: Date, now: OffsetDateTime) -> bool {
        date < self.today(now)
    }

    /// The instant `time` starts on `date` in the business offset.
    pub fn starts_at(&self, date: Date, time: TimeOfDay) -> OffsetDateTime {
        date.midnight().assume_offset(self.offset) + Duration::minutes(i64::from(time.minutes()))
    }

    pub fn check(&self, date: Date, time: TimeOfDay, now: OffsetDateTime) -> Result<(), WindowViolation> {
        let today = self.today(now);
        if date < today {
            return Err(WindowViolation::PastDate);
        }
        let lead = self.starts_at(date, time) - now;
        if date == today && lead < Duration::minutes(i64::from(self.buffer_minutes)) {
            return Err(WindowViolation::TooSoon {
                buffer_minutes: self.buffer_minutes,
            });
        }
        Ok(())
    }

    pub fn admits(&self, date: Date, time: TimeOfDay, now: OffsetDateTime) -> bool {
        self.check(date, time, now).is_ok()
    }
}
