use std::str::FromStr;

use lazy_regex::regex_captures;
use serde::{Deserialize, Deserializer};
use time::UtcOffset;

use crate::config::ConfigError;

const EXAMPLE_1: &str = "UTC+5:30";
const EXAMPLE_2: &str = "-03:00";

fn invalid_argument(message: String) -> ConfigError {
    super::invalid_argument(format!(
        "{message} UTC offset examples: `{EXAMPLE_1}`, `{EXAMPLE_2}`."
    ))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HumanUtcOffset(UtcOffset);

impl From<HumanUtcOffset> for UtcOffset {
    fn from(value: HumanUtcOffset) -> Self {
        value.0
    }
}

impl FromStr for HumanUtcOffset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();

        let Some((_, _, sign, hour, _, minute)) =
            regex_captures!(r"^(?:UTC|GMT)?(([+-])(\d{1,2})(:?(\d{2}))?)?$"i, token)
        else {
            return Err(invalid_argument(format!("Invalid UTC offset: `{token}`.")));
        };

        if sign.is_empty() {
            if token.is_empty() {
                return Err(invalid_argument("Empty UTC offset.".to_string()));
            }
            return Ok(HumanUtcOffset(UtcOffset::UTC));
        }

        let sign = if sign == "+" { 1 } else { -1 };

        let hour: i8 = hour
            .parse()
            .map_err(|_| invalid_argument(format!("Invalid hour: `{hour}`.")))?;
        let minute: i8 = if minute.is_empty() {
            0
        } else {
            minute
                .parse()
                .map_err(|_| invalid_argument(format!("Invalid minute: `{minute}`.")))?
        };

        UtcOffset::from_hms(hour * sign, minute * sign, 0)
            .map(HumanUtcOffset)
            .map_err(|_| invalid_argument(format!("Invalid UTC offset: `{token}`.")))
    }
}

impl<'de> Deserialize<'de> for HumanUtcOffset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use test_log::test;
    use time::{macros::offset, UtcOffset};

    use super::{HumanUtcOffset, EXAMPLE_1, EXAMPLE_2};

    fn parse(s: &str) -> UtcOffset {
        HumanUtcOffset::from_str(s).unwrap().into()
    }

    #[test]
    fn example_1() {
        assert_eq!(parse(EXAMPLE_1), offset!(+5:30));
    }

    #[test]
    fn example_2() {
        assert_eq!(parse(EXAMPLE_2), offset!(-3));
    }

    #[test]
    fn utc() {
        assert_eq!(parse("UTC"), UtcOffset::UTC);
        assert_eq!(parse("gmt"), UtcOffset::UTC);
    }

    #[test]
    fn whole_hours() {
        assert_eq!(parse("UTC+7"), offset!(+7));
        assert_eq!(parse("UTC-10"), offset!(-10));
    }

    #[test]
    fn negative_with_minutes() {
        assert_eq!(parse("UTC-2:30"), offset!(-2:30));
        assert_eq!(parse("-0930"), offset!(-9:30));
    }

    #[test]
    fn invalid() {
        assert!(HumanUtcOffset::from_str("").is_err());
        assert!(HumanUtcOffset::from_str("IST").is_err());
        assert!(HumanUtcOffset::from_str("UTC+26").is_err());
        assert!(HumanUtcOffset::from_str("UTC+5:3").is_err());
    }
}
