//! Environment configuration.
//!
//! Every variable is prefixed with `CTF_PORTAL_`, e.g. `CTF_PORTAL_API_BASE_URL`.

use std::{str::FromStr, time::Duration};

use serde::Deserialize;

use crate::{
    board::{BoardQuery, BoardSettings, StatusFilter},
    status::AvailabilityPolicy,
};

pub mod arguments;

use arguments::{HumanDuration, HumanUtcOffset};

const ENV_PREFIX: &str = "CTF_PORTAL_";

const DEFAULT_CLOCK_TICK: Duration = Duration::from_secs(60);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("{message}")]
    InvalidArgument { message: String },
    #[error(transparent)]
    Env(#[from] envy::Error),
}

#[derive(Deserialize)]
pub struct AppConfig {
    pub api_base_url: String,
    pub student_token: Option<String>,
    pub admin_token: Option<String>,
    pub timezone_offset: Option<HumanUtcOffset>,
    pub timezone_label: Option<String>,
    pub clock_tick: Option<HumanDuration>,
    pub poll_interval: Option<HumanDuration>,
    pub request_timeout: Option<HumanDuration>,
    pub auto_refresh: Option<bool>,
    pub status_filter: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<AppConfig, ConfigError> {
        Ok(envy::prefixed(ENV_PREFIX).from_env()?)
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
            .map(HumanDuration::to_std)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn availability_policy(&self) -> AvailabilityPolicy {
        let default = AvailabilityPolicy::default();

        AvailabilityPolicy {
            offset: self
                .timezone_offset
                .map(Into::into)
                .unwrap_or(default.offset),
            zone_label: self
                .timezone_label
                .clone()
                .filter(|label| !label.trim().is_empty())
                .unwrap_or(default.zone_label),
        }
    }

    pub fn board_settings(&self) -> Result<BoardSettings, ConfigError> {
        let status = match self.status_filter.as_deref() {
            Some(filter) => StatusFilter::from_str(filter).map_err(|_| {
                arguments::invalid_argument(format!(
                    "Unknown status filter: `{filter}`. Use `all`, `active`, `inactive_hours`, `upcoming`, `ended` or `inactive`."
                ))
            })?,
            None => StatusFilter::All,
        };

        Ok(BoardSettings {
            policy: self.availability_policy(),
            clock_tick: self
                .clock_tick
                .map(HumanDuration::to_std)
                .unwrap_or(DEFAULT_CLOCK_TICK),
            poll_interval: self
                .poll_interval
                .map(HumanDuration::to_std)
                .unwrap_or(DEFAULT_POLL_INTERVAL),
            auto_refresh: self.auto_refresh.unwrap_or(true),
            query: BoardQuery::new(status, self.search.clone(), self.category.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use test_log::test;
    use time::macros::offset;

    use crate::{
        board::StatusFilter,
        status::DerivedStatus,
    };

    use super::{AppConfig, ConfigError, ENV_PREFIX};

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        Ok(envy::prefixed(ENV_PREFIX).from_iter(
            vars.iter()
                .map(|(key, value)| (format!("{ENV_PREFIX}{key}"), value.to_string())),
        )?)
    }

    #[test]
    fn defaults() {
        let config = config(&[("API_BASE_URL", "https://ctf.example.com/api")]).unwrap();
        let settings = config.board_settings().unwrap();

        assert_eq!(config.api_base_url, "https://ctf.example.com/api");
        assert_eq!(config.request_timeout(), Duration::from_secs(15));
        assert_eq!(settings.policy.offset, offset!(+5:30));
        assert_eq!(settings.policy.zone_label, "IST");
        assert_eq!(settings.clock_tick, Duration::from_secs(60));
        assert_eq!(settings.poll_interval, Duration::from_secs(30));
        assert!(settings.auto_refresh);
        assert_eq!(settings.query.status, StatusFilter::All);
    }

    #[test]
    fn overrides() {
        let config = config(&[
            ("API_BASE_URL", "https://ctf.example.com/api"),
            ("STUDENT_TOKEN", "abc"),
            ("TIMEZONE_OFFSET", "UTC-3"),
            ("TIMEZONE_LABEL", "BRT"),
            ("CLOCK_TICK", "10s"),
            ("POLL_INTERVAL", "2m"),
            ("AUTO_REFRESH", "false"),
            ("STATUS_FILTER", "inactive_hours"),
            ("CATEGORY", "Pwn"),
        ])
        .unwrap();
        let settings = config.board_settings().unwrap();

        assert_eq!(config.student_token.as_deref(), Some("abc"));
        assert_eq!(settings.policy.offset, offset!(-3));
        assert_eq!(settings.policy.zone_label, "BRT");
        assert_eq!(settings.clock_tick, Duration::from_secs(10));
        assert_eq!(settings.poll_interval, Duration::from_secs(120));
        assert!(!settings.auto_refresh);
        assert_eq!(
            settings.query.status,
            StatusFilter::Only(DerivedStatus::InactiveHours)
        );
        assert_eq!(settings.query.category.as_deref(), Some("Pwn"));
    }

    #[test]
    fn missing_base_url() {
        assert!(matches!(config(&[]), Err(ConfigError::Env(_))));
    }

    #[test]
    fn bad_duration() {
        assert!(config(&[
            ("API_BASE_URL", "https://ctf.example.com/api"),
            ("POLL_INTERVAL", "soon"),
        ])
        .is_err());
    }

    #[test]
    fn bad_status_filter() {
        let config = config(&[
            ("API_BASE_URL", "https://ctf.example.com/api"),
            ("STATUS_FILTER", "paused"),
        ])
        .unwrap();

        assert!(matches!(
            config.board_settings(),
            Err(ConfigError::InvalidArgument { .. })
        ));
    }
}
