mod time_of_day;
mod utc_datetime;

pub use time_of_day::TimeOfDay;
pub use utc_datetime::UtcDateTime;
