use super::ConfigError;

mod human_duration;
mod human_utc_offset;

pub use human_duration::HumanDuration;
pub use human_utc_offset::HumanUtcOffset;

pub fn invalid_argument(message: String) -> ConfigError {
    ConfigError::InvalidArgument { message }
}
