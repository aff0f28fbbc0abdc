use std::{fmt::Display, str::FromStr};

use lazy_regex::regex_captures;
use time::Time;

/// A wall-clock time of day with minute precision, no date attached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("Invalid time of day: `{0}`")]
pub struct InvalidTimeOfDay(pub String);

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Option<TimeOfDay> {
        (hour < 24 && minute < 60).then_some(TimeOfDay { hour, minute })
    }

    /// Minutes elapsed since midnight, `hours * 60 + minutes`.
    pub fn minutes_since_midnight(&self) -> u16 {
        self.hour as u16 * 60 + self.minute as u16
    }

    /// 12-hour clock rendering, e.g. `9:05 PM`.
    pub fn to_12_hour(&self) -> String {
        let period = if self.hour >= 12 { "PM" } else { "AM" };
        let hour = match self.hour % 12 {
            0 => 12,
            hour => hour,
        };

        format!("{hour}:{:02} {period}", self.minute)
    }
}

impl From<Time> for TimeOfDay {
    fn from(value: Time) -> Self {
        TimeOfDay {
            hour: value.hour(),
            minute: value.minute(),
        }
    }
}

impl FromStr for TimeOfDay {
    type Err = InvalidTimeOfDay;

    /// Accepts `HH:MM`, `H:MM` and `HH:MM:SS`. Seconds are dropped.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidTimeOfDay(s.to_owned());

        let (_, hour, minute, _, _second) =
            regex_captures!(r"^(\d{1,2}):(\d{2})(:(\d{2}))?$", s.trim()).ok_or_else(invalid)?;

        let hour = hour.parse().map_err(|_| invalid())?;
        let minute = minute.parse().map_err(|_| invalid())?;

        TimeOfDay::new(hour, minute).ok_or_else(invalid)
    }
}

impl Display for TimeOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}
