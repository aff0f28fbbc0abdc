use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use strum::{Display as StrumDisplay, EnumString};
use tracing::debug;

use crate::status::{ActiveHours, CampaignWindow, CtfSchedulingInfo, ServerStatus};

use super::types::TimeOfDay;

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CtfId(pub String);

impl Display for CtfId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CtfId {
    fn from(value: &str) -> Self {
        CtfId(value.to_owned())
    }
}

/// A CTF as the backend reports it. Every field except the id is optional so
/// that a partially-populated record still lists.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CtfRecord {
    #[serde(rename = "_id", alias = "id")]
    pub id: CtfId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub points: Option<u32>,
    #[serde(default)]
    pub participants: Vec<serde_json::Value>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub schedule: Option<ScheduleRecord>,
    #[serde(default)]
    pub active_hours: Option<ActiveHoursRecord>,
    #[serde(default)]
    pub ctf_link: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRecord {
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveHoursRecord {
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString, StrumDisplay)]
#[strum(ascii_case_insensitive)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

impl CtfRecord {
    /// Projects the record onto the fields the classifier looks at.
    /// Malformed values are dropped rather than reported.
    pub fn scheduling_info(&self) -> CtfSchedulingInfo {
        let status = ServerStatus::from_reported(self.status.as_deref());

        let campaign = self.schedule.as_ref().and_then(|schedule| {
            let start = parse_field(&self.id, "schedule.startDate", &schedule.start_date)?;
            let end = parse_field(&self.id, "schedule.endDate", &schedule.end_date)?;
            Some(CampaignWindow { start, end })
        });

        let active_hours = self.active_hours.as_ref().and_then(|hours| {
            let start: TimeOfDay = parse_field(&self.id, "activeHours.startTime", &hours.start_time)?;
            let end: TimeOfDay = parse_field(&self.id, "activeHours.endTime", &hours.end_time)?;
            Some(ActiveHours { start, end })
        });

        CtfSchedulingInfo {
            status,
            campaign,
            active_hours,
        }
    }

    /// Unknown or missing difficulties display as `Easy`.
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
            .as_deref()
            .and_then(|difficulty| Difficulty::from_str(difficulty).ok())
            .unwrap_or(Difficulty::Easy)
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// The external challenge link, if one is configured.
    pub fn challenge_link(&self) -> Option<&str> {
        self.ctf_link
            .as_deref()
            .map(str::trim)
            .filter(|link| !link.is_empty())
    }

    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();

        self.title.to_lowercase().contains(&needle)
            || self
                .description
                .as_deref()
                .is_some_and(|description| description.to_lowercase().contains(&needle))
    }
}

fn parse_field<T: FromStr>(id: &CtfId, field: &str, value: &Option<String>) -> Option<T>
where
    T::Err: Display,
{
    let raw = value.as_deref()?;
    match raw.parse() {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            debug!("Ignoring malformed {field} of CTF {id}: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use test_log::test;
    use time::macros::datetime;

    use crate::{
        models::types::TimeOfDay,
        status::{ActiveHours, CampaignWindow, ServerStatus},
    };

    use super::{CtfId, CtfRecord, Difficulty};

    fn record(value: serde_json::Value) -> CtfRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn full_record() {
        let ctf = record(json!({
            "_id": "65f1",
            "title": "Web Warmup",
            "description": "Find the flag in the cookie jar",
            "category": "Web Security",
            "difficulty": "Hard",
            "points": 150,
            "participants": [{ "user": "a" }, { "user": "b" }],
            "status": "active",
            "schedule": {
                "startDate": "2024-03-01T00:00:00.000Z",
                "endDate": "2024-03-31T18:30:00.000Z"
            },
            "activeHours": { "startTime": "09:00", "endTime": "18:00" },
            "ctfLink": "https://ctf.example.com/web-warmup"
        }));

        assert_eq!(ctf.id, CtfId::from("65f1"));
        assert_eq!(ctf.difficulty(), Difficulty::Hard);
        assert_eq!(ctf.participant_count(), 2);
        assert_eq!(
            ctf.challenge_link(),
            Some("https://ctf.example.com/web-warmup")
        );

        let info = ctf.scheduling_info();
        assert_eq!(info.status, ServerStatus::Active);
        assert_eq!(
            info.campaign,
            Some(CampaignWindow {
                start: datetime!(2024-03-01 0:00 UTC).into(),
                end: datetime!(2024-03-31 18:30 UTC).into(),
            })
        );
        assert_eq!(
            info.active_hours,
            Some(ActiveHours {
                start: TimeOfDay::new(9, 0).unwrap(),
                end: TimeOfDay::new(18, 0).unwrap(),
            })
        );
    }

    #[test]
    fn bare_record() {
        let ctf = record(json!({ "_id": "1" }));

        assert_eq!(ctf.title, "");
        assert_eq!(ctf.difficulty(), Difficulty::Easy);
        assert_eq!(ctf.participant_count(), 0);
        assert_eq!(ctf.challenge_link(), None);

        let info = ctf.scheduling_info();
        assert_eq!(info.status, ServerStatus::Inactive);
        assert_eq!(info.campaign, None);
        assert_eq!(info.active_hours, None);
    }

    #[test]
    fn half_active_hours_are_dropped() {
        let ctf = record(json!({
            "_id": "1",
            "activeHours": { "startTime": "09:00" }
        }));

        assert_eq!(ctf.scheduling_info().active_hours, None);
    }

    #[test]
    fn malformed_schedule_is_dropped() {
        let ctf = record(json!({
            "_id": "1",
            "schedule": { "startDate": "soon", "endDate": "2024-03-31T18:30:00Z" },
            "activeHours": { "startTime": "9am", "endTime": "18:00" }
        }));

        let info = ctf.scheduling_info();
        assert_eq!(info.campaign, None);
        assert_eq!(info.active_hours, None);
    }

    #[test]
    fn blank_link_is_not_a_link() {
        let ctf = record(json!({ "_id": "1", "ctfLink": "   " }));
        assert_eq!(ctf.challenge_link(), None);
    }

    #[test]
    fn id_alias() {
        assert_eq!(record(json!({ "id": "abc" })).id, CtfId::from("abc"));
    }

    #[test]
    fn search_is_case_insensitive_over_title_and_description() {
        let ctf = record(json!({
            "_id": "1",
            "title": "Crypto Basics",
            "description": "XOR all the things"
        }));

        assert!(ctf.matches_search("crypto"));
        assert!(ctf.matches_search("xor"));
        assert!(!ctf.matches_search("forensics"));
    }
}
