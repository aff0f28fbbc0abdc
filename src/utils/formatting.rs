use time::macros::format_description;
use time::{format_description, OffsetDateTime, UtcOffset};

use crate::models::types::UtcDateTime;

const DATETIME_FORMAT: &[format_description::FormatItem<'_>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");

const DATE_FORMAT: &[format_description::FormatItem<'_>] =
    format_description!("[day]/[month]/[year]");

pub fn format_utc(date_time: impl Into<OffsetDateTime>) -> String {
    format_in(date_time, UtcOffset::UTC)
}

/// Formats the instant as wall-clock time in the given offset.
pub fn format_in(date_time: impl Into<OffsetDateTime>, offset: UtcOffset) -> String {
    let offset_date_time: OffsetDateTime = date_time.into();
    offset_date_time
        .to_offset(offset)
        .format(DATETIME_FORMAT)
        .expect("Hard-coded format should be correct")
}

/// Formats only the calendar date the instant falls on in the given offset.
pub fn format_date_in(date_time: UtcDateTime, offset: UtcOffset) -> String {
    date_time
        .in_offset(offset)
        .format(DATE_FORMAT)
        .expect("Hard-coded format should be correct")
}

#[cfg(test)]
mod tests {
    use test_log::test;
    use time::macros::{datetime, offset};

    use super::{format_date_in, format_in, format_utc};

    #[test]
    fn utc() {
        assert_eq!(format_utc(datetime!(2024-03-10 4:30 UTC)), "2024-03-10 04:30");
    }

    #[test]
    fn shifted() {
        assert_eq!(
            format_in(datetime!(2024-03-10 20:00 UTC), offset!(+5:30)),
            "2024-03-11 01:30"
        );
    }

    #[test]
    fn date_crosses_day_boundary() {
        assert_eq!(
            format_date_in(datetime!(2024-02-29 18:30 UTC).into(), offset!(+5:30)),
            "01/03/2024"
        );
    }
}
