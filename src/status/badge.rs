use crate::utils::formatting::format_date_in;

use super::{Availability, AvailabilityPolicy, CtfSchedulingInfo, DerivedStatus};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusBadge {
    pub label: &'static str,
    pub description: String,
}

pub fn status_badge(
    availability: &Availability,
    info: &CtfSchedulingInfo,
    policy: &AvailabilityPolicy,
) -> StatusBadge {
    use DerivedStatus::*;

    match availability.status {
        Active => StatusBadge {
            label: "Active Now",
            description: "Ready to play!".to_string(),
        },

        InactiveHours => StatusBadge {
            label: "Inactive Hours",
            description: match info.active_hours {
                Some(hours) => format!("Active {}-{} {}", hours.start, hours.end, policy.zone_label),
                None => "No active hours configured".to_string(),
            },
        },

        Upcoming => StatusBadge {
            label: "Upcoming",
            description: match info.campaign {
                Some(campaign) => format!("Starts {}", format_date_in(campaign.start, policy.offset)),
                None => "Start date not announced".to_string(),
            },
        },

        Ended => StatusBadge {
            label: "Ended",
            description: "Challenge has ended".to_string(),
        },

        Inactive => StatusBadge {
            label: "Not Available",
            description: "CTF is not currently available".to_string(),
        },
    }
}
