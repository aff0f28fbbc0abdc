use strum::{AsRefStr, Display, EnumIter, EnumString};
use time::{macros::offset, OffsetDateTime, UtcOffset};
use tracing::trace;

use crate::models::types::{TimeOfDay, UtcDateTime};

/// The coarse status flag the backend reports for a CTF.
#[derive(Clone, Debug, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ServerStatus {
    Active,
    Inactive,
    Upcoming,
    Ended,
    #[strum(default)]
    Unrecognized(String),
}

impl ServerStatus {
    /// A missing or blank status reads as `inactive`.
    pub fn from_reported(raw: Option<&str>) -> ServerStatus {
        match raw.map(str::trim) {
            None | Some("") => ServerStatus::Inactive,
            Some(raw) => raw
                .parse()
                .unwrap_or_else(|_| ServerStatus::Unrecognized(raw.to_owned())),
        }
    }

    fn passthrough(&self) -> DerivedStatus {
        match self {
            ServerStatus::Active => DerivedStatus::Active,
            ServerStatus::Upcoming => DerivedStatus::Upcoming,
            ServerStatus::Ended => DerivedStatus::Ended,
            ServerStatus::Inactive | ServerStatus::Unrecognized(_) => DerivedStatus::Inactive,
        }
    }
}

/// The display-facing playability of a CTF.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumString, Display, AsRefStr, EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum DerivedStatus {
    Active,
    InactiveHours,
    Upcoming,
    Ended,
    Inactive,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Availability {
    pub status: DerivedStatus,
    pub is_currently_active: bool,
}

impl Availability {
    fn playable() -> Availability {
        Availability {
            status: DerivedStatus::Active,
            is_currently_active: true,
        }
    }

    fn not_playable(status: DerivedStatus) -> Availability {
        Availability {
            status,
            is_currently_active: false,
        }
    }
}

/// The absolute date range a CTF exists in. Both bounds are inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CampaignWindow {
    pub start: UtcDateTime,
    pub end: UtcDateTime,
}

impl CampaignWindow {
    pub fn contains(&self, instant: UtcDateTime) -> bool {
        self.start <= instant && instant <= self.end
    }
}

/// A daily recurring window of local time. `end < start` wraps past midnight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActiveHours {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl ActiveHours {
    pub fn contains(&self, time: TimeOfDay) -> bool {
        let current = time.minutes_since_midnight();
        let start = self.start.minutes_since_midnight();
        let end = self.end.minutes_since_midnight();

        if end < start {
            current >= start || current <= end
        } else {
            start <= current && current <= end
        }
    }

    pub fn crosses_midnight(&self) -> bool {
        self.end < self.start
    }
}

/// Everything the classifier needs to know about a CTF.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CtfSchedulingInfo {
    pub status: ServerStatus,
    pub campaign: Option<CampaignWindow>,
    pub active_hours: Option<ActiveHours>,
}

/// The timezone active hours are expressed in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AvailabilityPolicy {
    pub offset: UtcOffset,
    pub zone_label: String,
}

impl Default for AvailabilityPolicy {
    fn default() -> Self {
        AvailabilityPolicy {
            offset: offset!(+5:30),
            zone_label: "IST".to_string(),
        }
    }
}

impl AvailabilityPolicy {
    pub fn local_time(&self, now: OffsetDateTime) -> TimeOfDay {
        TimeOfDay::from(now.to_offset(self.offset).time())
    }
}

/// Derives the playability of a CTF at `now`.
///
/// A non-active server status is returned as is. An active one is only
/// playable when `now` falls both inside the campaign window and inside the
/// daily active hours; otherwise it is `inactive_hours`. Missing schedule or
/// active hours never make a CTF playable.
pub fn classify(
    info: &CtfSchedulingInfo,
    now: OffsetDateTime,
    policy: &AvailabilityPolicy,
) -> Availability {
    if info.status != ServerStatus::Active {
        return Availability::not_playable(info.status.passthrough());
    }

    let local_time = policy.local_time(now);

    let in_campaign = info
        .campaign
        .is_some_and(|campaign| campaign.contains(UtcDateTime::from(now)));
    let in_active_hours = in_campaign
        && info
            .active_hours
            .is_some_and(|hours| hours.contains(local_time));

    trace!(
        "Classifying at {local_time} {}: in campaign {in_campaign}, in active hours {in_active_hours}",
        policy.zone_label
    );

    if in_active_hours {
        Availability::playable()
    } else {
        Availability::not_playable(DerivedStatus::InactiveHours)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use strum::IntoEnumIterator;
    use test_log::test;
    use time::{
        macros::{datetime, offset},
        OffsetDateTime,
    };

    use crate::models::types::TimeOfDay;

    use super::{
        classify, ActiveHours, Availability, AvailabilityPolicy, CampaignWindow,
        CtfSchedulingInfo, DerivedStatus, ServerStatus,
    };

    fn hours(start: &str, end: &str) -> ActiveHours {
        ActiveHours {
            start: TimeOfDay::from_str(start).unwrap(),
            end: TimeOfDay::from_str(end).unwrap(),
        }
    }

    fn march() -> CampaignWindow {
        CampaignWindow {
            start: datetime!(2024-03-01 0:00 +5:30).into(),
            end: datetime!(2024-03-31 23:59 +5:30).into(),
        }
    }

    fn active_ctf(active_hours: Option<ActiveHours>) -> CtfSchedulingInfo {
        CtfSchedulingInfo {
            status: ServerStatus::Active,
            campaign: Some(march()),
            active_hours,
        }
    }

    fn status_at(info: &CtfSchedulingInfo, now: OffsetDateTime) -> DerivedStatus {
        classify(info, now, &AvailabilityPolicy::default()).status
    }

    #[test]
    fn non_active_server_status_passes_through() {
        let policy = AvailabilityPolicy::default();
        let now = datetime!(2024-03-10 10:00 +5:30);

        for (status, expected) in [
            (ServerStatus::Inactive, DerivedStatus::Inactive),
            (ServerStatus::Upcoming, DerivedStatus::Upcoming),
            (ServerStatus::Ended, DerivedStatus::Ended),
        ] {
            let info = CtfSchedulingInfo {
                status,
                ..active_ctf(Some(hours("00:00", "23:59")))
            };

            assert_eq!(
                classify(&info, now, &policy),
                Availability {
                    status: expected,
                    is_currently_active: false,
                }
            );
        }
    }

    #[test]
    fn inside_active_hours() {
        let ctf = active_ctf(Some(hours("09:00", "18:00")));
        let availability = classify(
            &ctf,
            datetime!(2024-03-10 10:00 +5:30),
            &AvailabilityPolicy::default(),
        );

        assert_eq!(availability.status, DerivedStatus::Active);
        assert!(availability.is_currently_active);
    }

    #[test]
    fn outside_active_hours() {
        let ctf = active_ctf(Some(hours("09:00", "18:00")));
        let availability = classify(
            &ctf,
            datetime!(2024-03-10 20:00 +5:30),
            &AvailabilityPolicy::default(),
        );

        assert_eq!(availability.status, DerivedStatus::InactiveHours);
        assert!(!availability.is_currently_active);
    }

    #[test]
    fn active_hours_bounds_are_inclusive() {
        let ctf = active_ctf(Some(hours("09:00", "18:00")));

        assert_eq!(
            status_at(&ctf, datetime!(2024-03-10 9:00 +5:30)),
            DerivedStatus::Active
        );
        assert_eq!(
            status_at(&ctf, datetime!(2024-03-10 18:00:59 +5:30)),
            DerivedStatus::Active
        );
        assert_eq!(
            status_at(&ctf, datetime!(2024-03-10 18:01 +5:30)),
            DerivedStatus::InactiveHours
        );
    }

    #[test]
    fn window_crossing_midnight() {
        let ctf = active_ctf(Some(hours("22:00", "06:00")));

        assert_eq!(
            status_at(&ctf, datetime!(2024-03-10 23:30 +5:30)),
            DerivedStatus::Active
        );
        assert_eq!(
            status_at(&ctf, datetime!(2024-03-11 7:00 +5:30)),
            DerivedStatus::InactiveHours
        );
        assert_eq!(
            status_at(&ctf, datetime!(2024-03-11 5:00 +5:30)),
            DerivedStatus::Active
        );
    }

    #[test]
    fn instant_is_read_in_policy_offset() {
        let ctf = active_ctf(Some(hours("09:00", "18:00")));

        // 04:30 UTC is 10:00 IST.
        assert_eq!(
            status_at(&ctf, datetime!(2024-03-10 4:30 UTC)),
            DerivedStatus::Active
        );
        // 14:00 UTC is 19:30 IST.
        assert_eq!(
            status_at(&ctf, datetime!(2024-03-10 14:00 UTC)),
            DerivedStatus::InactiveHours
        );
    }

    #[test]
    fn custom_offset() {
        let ctf = active_ctf(Some(hours("09:00", "18:00")));
        let policy = AvailabilityPolicy {
            offset: offset!(-5),
            zone_label: "EST".to_string(),
        };

        // 10:00 IST is 23:30 the day before in UTC-5.
        assert_eq!(
            classify(&ctf, datetime!(2024-03-10 10:00 +5:30), &policy).status,
            DerivedStatus::InactiveHours
        );
        assert_eq!(
            classify(&ctf, datetime!(2024-03-10 10:00 -5), &policy).status,
            DerivedStatus::Active
        );
    }

    #[test]
    fn outside_campaign_window() {
        let ctf = active_ctf(Some(hours("00:00", "23:59")));

        assert_eq!(
            status_at(&ctf, datetime!(2024-02-29 12:00 +5:30)),
            DerivedStatus::InactiveHours
        );
        assert_eq!(
            status_at(&ctf, datetime!(2024-04-01 12:00 +5:30)),
            DerivedStatus::InactiveHours
        );
    }

    #[test]
    fn campaign_bounds_are_inclusive() {
        let ctf = active_ctf(Some(hours("00:00", "23:59")));

        assert_eq!(
            status_at(&ctf, datetime!(2024-03-01 0:00 +5:30)),
            DerivedStatus::Active
        );
        assert_eq!(
            status_at(&ctf, datetime!(2024-03-31 23:59 +5:30)),
            DerivedStatus::Active
        );
    }

    #[test]
    fn missing_active_hours() {
        let ctf = active_ctf(None);

        let availability = classify(
            &ctf,
            datetime!(2024-03-10 10:00 +5:30),
            &AvailabilityPolicy::default(),
        );
        assert_eq!(availability.status, DerivedStatus::InactiveHours);
        assert!(!availability.is_currently_active);
    }

    #[test]
    fn missing_campaign_window() {
        let ctf = CtfSchedulingInfo {
            campaign: None,
            ..active_ctf(Some(hours("00:00", "23:59")))
        };

        assert_eq!(
            status_at(&ctf, datetime!(2024-03-10 10:00 +5:30)),
            DerivedStatus::InactiveHours
        );
    }

    #[test]
    fn unrecognized_status_falls_back_to_inactive() {
        let ctf = CtfSchedulingInfo {
            status: ServerStatus::from_reported(Some("paused")),
            ..active_ctf(Some(hours("00:00", "23:59")))
        };

        assert_eq!(ctf.status, ServerStatus::Unrecognized("paused".to_string()));
        assert_eq!(
            classify(
                &ctf,
                datetime!(2024-03-10 10:00 +5:30),
                &AvailabilityPolicy::default()
            ),
            Availability {
                status: DerivedStatus::Inactive,
                is_currently_active: false,
            }
        );
    }

    #[test]
    fn reported_status_parsing() {
        assert_eq!(ServerStatus::from_reported(None), ServerStatus::Inactive);
        assert_eq!(ServerStatus::from_reported(Some("  ")), ServerStatus::Inactive);
        assert_eq!(
            ServerStatus::from_reported(Some("Active")),
            ServerStatus::Active
        );
        assert_eq!(
            ServerStatus::from_reported(Some("ended")),
            ServerStatus::Ended
        );
        assert_eq!(
            ServerStatus::from_reported(Some("upcoming")),
            ServerStatus::Upcoming
        );
    }

    #[test]
    fn classification_is_idempotent() {
        let policy = AvailabilityPolicy::default();
        let now = datetime!(2024-03-10 23:30 +5:30);

        for ctf in [
            active_ctf(Some(hours("22:00", "06:00"))),
            active_ctf(None),
            CtfSchedulingInfo {
                status: ServerStatus::Upcoming,
                ..active_ctf(None)
            },
        ] {
            assert_eq!(classify(&ctf, now, &policy), classify(&ctf, now, &policy));
        }
    }

    #[test]
    fn derived_status_names() {
        let names: Vec<String> = DerivedStatus::iter().map(|s| s.to_string()).collect();
        assert_eq!(
            names,
            ["active", "inactive_hours", "upcoming", "ended", "inactive"]
        );
        assert_eq!(
            DerivedStatus::from_str("inactive_hours").unwrap(),
            DerivedStatus::InactiveHours
        );
    }
}
