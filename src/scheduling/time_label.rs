use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const MINUTES_PER_DAY: i32 = 24 * 60;

/// Start times offered for the self-serve modes (ai, peer, family).
const DEFAULT_SLOT_MINUTES: [i32; 8] = [540, 600, 660, 720, 840, 900, 960, 1020];

/// Time of day as minutes since midnight.
///
/// On the wire this is always the 12-hour label (`"09:00 AM"`), in the
/// database it is a plain integer column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, sqlx::Type)]
#[sqlx(transparent)]
pub struct TimeOfDay(i32);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid time '{0}', expected a label like 09:00 AM")]
pub struct InvalidTimeLabel(String);

impl TimeOfDay {
    pub fn from_hm(hour: u8, minute: u8) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self(i32::from(hour) * 60 + i32::from(minute)))
        } else {
            None
        }
    }

    pub fn from_minutes(minutes: i32) -> Option<Self> {
        (0..MINUTES_PER_DAY).contains(&minutes).then_some(Self(minutes))
    }

    pub fn minutes(self) -> i32 {
        self.0
    }

    pub fn label(self) -> String {
        self.to_string()
    }
}

pub fn default_time_catalogue() -> Vec<TimeOfDay> {
    DEFAULT_SLOT_MINUTES.iter().map(|m| TimeOfDay(*m)).collect()
}

fn parse_two_digits(part: &str, max_len: usize) -> Option<u8> {
    if part.is_empty() || part.len() > max_len || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

impl FromStr for TimeOfDay {
    type Err = InvalidTimeLabel;

    /// Accepts `hh:mm AM/PM`, `h:mm am`, and the 24-hour `HH:MM` sent by
    /// browser time inputs.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidTimeLabel(s.to_string());
        let upper = s.trim().to_ascii_uppercase();

        let (clock, pm) = if let Some(rest) = upper.strip_suffix("AM") {
            (rest.trim_end(), Some(false))
        } else if let Some(rest) = upper.strip_suffix("PM") {
            (rest.trim_end(), Some(true))
        } else {
            (upper.as_str(), None)
        };

        let (hour, minute) = clock.split_once(':').ok_or_else(invalid)?;
        let hour = parse_two_digits(hour, 2).ok_or_else(invalid)?;
        if minute.len() != 2 {
            return Err(invalid());
        }
        let minute = parse_two_digits(minute, 2).ok_or_else(invalid)?;

        let hour = match pm {
            Some(pm) => {
                if !(1..=12).contains(&hour) {
                    return Err(invalid());
                }
                match (hour, pm) {
                    (12, false) => 0,
                    (12, true) => 12,
                    (h, false) => h,
                    (h, true) => h + 12,
                }
            }
            None => hour,
        };

        Self::from_hm(hour, minute).ok_or_else(invalid)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hour = self.0 / 60;
        let minute = self.0 % 60;
        let (display_hour, meridiem) = match hour {
            0 => (12, "AM"),
            1..=11 => (hour, "AM"),
            12 => (12, "PM"),
            _ => (hour - 12, "PM"),
        };
        write!(f, "{:02}:{:02} {}", display_hour, minute, meridiem)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
