use std::str::FromStr;

use serde::{Deserialize, Deserializer};
use time::Duration;

use crate::config::ConfigError;

const EXAMPLE_1: &str = "1 minute 30 seconds";
const EXAMPLE_2: &str = "1m 30s";

fn invalid_argument(message: String) -> ConfigError {
    super::invalid_argument(format!(
        "{message} Duration examples: `{EXAMPLE_1}`, `{EXAMPLE_2}`."
    ))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HumanDuration(Duration);

impl HumanDuration {
    /// Converts to a std duration for tokio timers. Negative durations cannot
    /// be written, so the conversion never fails in practice.
    pub fn to_std(self) -> std::time::Duration {
        std::time::Duration::try_from(self.0).unwrap_or_default()
    }
}

impl FromStr for HumanDuration {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut s = s.to_owned();

        if let Some(c) = s
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || c.is_ascii_whitespace()))
        {
            return Err(invalid_argument(format!(
                "Invalid character in duration: `{}`.",
                c.escape_default()
            )));
        }

        s.make_ascii_lowercase();

        let mut tokens = s
            .split_ascii_whitespace()
            .filter(|s| !s.is_empty())
            .flat_map(|s| {
                if let Some((first_non_digit, _)) =
                    s.char_indices().find(|(_i, c)| !c.is_ascii_digit())
                {
                    if first_non_digit > 0 {
                        let prefix = &s[0..first_non_digit];
                        let suffix = &s[first_non_digit..];
                        vec![prefix, suffix]
                    } else {
                        vec![s]
                    }
                } else {
                    vec![s]
                }
            });

        let mut duration = Duration::ZERO;
        let mut any_unit = false;

        while let Some(count) = tokens.next() {
            let unit = tokens
                .next()
                .ok_or(invalid_argument("Unexpected end of duration.".to_string()))?;
            let count: u32 = count
                .parse()
                .map_err(|_| invalid_argument(format!("Expected a number, got `{count}`.")))?;

            match unit {
                unit if "hours".starts_with(unit) => duration += Duration::hours(count as _),

                unit if "minutes".starts_with(unit) => duration += Duration::minutes(count as _),

                unit if "seconds".starts_with(unit) => duration += Duration::seconds(count as _),

                unit if unit == "ms" || (unit.len() > 1 && "milliseconds".starts_with(unit)) => {
                    duration += Duration::milliseconds(count as _)
                }

                unit => return Err(invalid_argument(format!("Unknown time unit: `{unit}`."))),
            }

            any_unit = true;
        }

        if !any_unit {
            return Err(invalid_argument("Empty duration.".to_string()));
        }

        if duration == Duration::ZERO {
            return Err(invalid_argument("Duration must not be zero.".to_string()));
        }

        Ok(HumanDuration(duration))
    }
}

impl<'de> Deserialize<'de> for HumanDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
