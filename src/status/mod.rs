mod badge;
mod classifier;
mod gating;

pub use badge::{status_badge, StatusBadge};
pub use classifier::{
    classify, ActiveHours, Availability, AvailabilityPolicy, CampaignWindow, CtfSchedulingInfo,
    DerivedStatus, ServerStatus,
};
pub use gating::Affordances;
