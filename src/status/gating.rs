use super::Availability;

/// A CTF can be joined only while it is playable and only once.
pub fn can_join(availability: &Availability, joined: bool) -> bool {
    availability.is_currently_active && !joined
}

pub fn can_visit_link(link: Option<&str>, availability: &Availability) -> bool {
    link.is_some_and(|link| !link.trim().is_empty()) && availability.is_currently_active
}

/// Members may always re-enter a CTF they joined, even outside active hours.
pub fn shows_continue(joined: bool) -> bool {
    joined
}

pub fn can_submit_flag(availability: &Availability, joined: bool) -> bool {
    joined && availability.is_currently_active
}

/// What a student may do with a CTF right now.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Affordances {
    pub can_join: bool,
    pub can_visit_link: bool,
    pub shows_continue: bool,
    pub can_submit_flag: bool,
}

impl Affordances {
    pub fn evaluate(availability: &Availability, joined: bool, link: Option<&str>) -> Affordances {
        Affordances {
            can_join: can_join(availability, joined),
            can_visit_link: can_visit_link(link, availability),
            shows_continue: shows_continue(joined),
            can_submit_flag: can_submit_flag(availability, joined),
        }
    }
}
