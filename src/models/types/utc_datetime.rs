use std::str::FromStr;

use time::{
    format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime,
    PrimitiveDateTime, UtcOffset,
};

/// An absolute instant normalized to UTC.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UtcDateTime(OffsetDateTime);

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("Invalid timestamp: `{0}`")]
pub struct InvalidTimestamp(pub String);

impl UtcDateTime {
    pub fn assume_utc(datetime: PrimitiveDateTime) -> UtcDateTime {
        UtcDateTime(datetime.assume_utc())
    }

    /// Shifts the instant into the given offset without changing the instant itself.
    pub fn in_offset(self, offset: UtcOffset) -> OffsetDateTime {
        self.0.to_offset(offset)
    }
}

impl FromStr for UtcDateTime {
    type Err = InvalidTimestamp;

    /// Accepts RFC 3339 timestamps. Timestamps without an offset and bare
    /// dates are taken as UTC.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if let Ok(datetime) = OffsetDateTime::parse(s, &Rfc3339) {
            return Ok(UtcDateTime::from(datetime));
        }

        if let Ok(datetime) = PrimitiveDateTime::parse(
            s,
            format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
        ) {
            return Ok(UtcDateTime::assume_utc(datetime));
        }

        if let Ok(date) = Date::parse(s, format_description!("[year]-[month]-[day]")) {
            return Ok(UtcDateTime::assume_utc(date.midnight()));
        }

        Err(InvalidTimestamp(s.to_owned()))
    }
}

impl From<OffsetDateTime> for UtcDateTime {
    fn from(value: OffsetDateTime) -> Self {
        UtcDateTime(value.to_offset(UtcOffset::UTC))
    }
}

impl From<UtcDateTime> for OffsetDateTime {
    fn from(value: UtcDateTime) -> Self {
        value.0
    }
}
