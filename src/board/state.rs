use std::collections::{HashMap, HashSet};

use time::OffsetDateTime;

use crate::{
    models::{CtfId, CtfRecord},
    status::{classify, status_badge, Affordances, Availability, AvailabilityPolicy, StatusBadge},
};

use super::BoardQuery;

/// The result of one fetch cycle.
#[derive(Clone, Debug, Default)]
pub struct BoardData {
    pub ctfs: Vec<CtfRecord>,
    pub joined: HashSet<CtfId>,
}

/// Identifies a refresh request. Only results newer than what is already on
/// the board get applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefreshTicket {
    pub generation: u64,
    pub query: BoardQuery,
}

/// A CTF as the board shows it at one instant.
#[derive(Clone, Debug, PartialEq)]
pub struct BoardEntry {
    pub ctf: CtfRecord,
    pub availability: Availability,
    pub joined: bool,
    pub affordances: Affordances,
    pub badge: StatusBadge,
}

impl BoardEntry {
    pub fn evaluate(
        ctf: CtfRecord,
        joined: bool,
        now: OffsetDateTime,
        policy: &AvailabilityPolicy,
    ) -> BoardEntry {
        let info = ctf.scheduling_info();
        let availability = classify(&info, now, policy);
        let affordances = Affordances::evaluate(&availability, joined, ctf.challenge_link());
        let badge = status_badge(&availability, &info, policy);

        BoardEntry {
            ctf,
            availability,
            joined,
            affordances,
            badge,
        }
    }
}

/// The student CTF list: the last fetched data plus the instant it is
/// classified at. Holds no timers and does no I/O.
#[derive(Debug)]
pub struct CtfBoard {
    policy: AvailabilityPolicy,
    now: OffsetDateTime,
    query: BoardQuery,
    ctfs: Vec<CtfRecord>,
    joined: HashSet<CtfId>,
    /// Joins made here, keyed by the last generation issued before them.
    /// Refreshes up to that generation read membership too early to see them.
    local_joins: HashMap<CtfId, u64>,
    issued_generation: u64,
    applied_generation: u64,
}

impl CtfBoard {
    pub fn new(policy: AvailabilityPolicy, query: BoardQuery, now: OffsetDateTime) -> CtfBoard {
        CtfBoard {
            policy,
            now,
            query,
            ctfs: Vec::new(),
            joined: HashSet::new(),
            local_joins: HashMap::new(),
            issued_generation: 0,
            applied_generation: 0,
        }
    }

    pub fn policy(&self) -> &AvailabilityPolicy {
        &self.policy
    }

    pub fn now(&self) -> OffsetDateTime {
        self.now
    }

    pub fn set_now(&mut self, now: OffsetDateTime) {
        self.now = now;
    }

    pub fn set_query(&mut self, query: BoardQuery) {
        self.query = query;
    }

    pub fn is_loaded(&self) -> bool {
        self.applied_generation > 0
    }

    pub fn applied_generation(&self) -> u64 {
        self.applied_generation
    }

    pub fn total(&self) -> usize {
        self.ctfs.len()
    }

    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.issued_generation += 1;

        RefreshTicket {
            generation: self.issued_generation,
            query: self.query.clone(),
        }
    }

    /// Replaces the board contents unless a newer refresh already landed.
    /// Joins made after `ticket` was issued are kept. Returns whether the data
    /// was applied.
    pub fn apply_refresh(&mut self, ticket: &RefreshTicket, mut data: BoardData) -> bool {
        if ticket.generation <= self.applied_generation {
            return false;
        }

        for (id, joined_after) in &self.local_joins {
            if ticket.generation <= *joined_after {
                data.joined.insert(id.clone());
            }
        }
        self.local_joins
            .retain(|_, joined_after| *joined_after > ticket.generation);

        self.applied_generation = ticket.generation;
        self.ctfs = data.ctfs;
        self.joined = data.joined;
        true
    }

    /// Whether a failure of `ticket` would still describe the latest state.
    pub fn is_current(&self, ticket: &RefreshTicket) -> bool {
        ticket.generation > self.applied_generation
    }

    pub fn mark_joined(&mut self, id: &CtfId) {
        self.joined.insert(id.clone());
        self.local_joins.insert(id.clone(), self.issued_generation);
    }

    pub fn is_joined(&self, id: &CtfId) -> bool {
        self.joined.contains(id)
    }

    /// Entries matching the current query, classified at the board's instant.
    pub fn entries(&self) -> Vec<BoardEntry> {
        self.ctfs
            .iter()
            .map(|ctf| self.evaluate(ctf))
            .filter(|entry| self.query.matches(&entry.ctf, entry.availability.status))
            .collect()
    }

    /// Looks a CTF up regardless of the current query.
    pub fn entry(&self, id: &CtfId) -> Option<BoardEntry> {
        self.ctfs
            .iter()
            .find(|ctf| &ctf.id == id)
            .map(|ctf| self.evaluate(ctf))
    }

    fn evaluate(&self, ctf: &CtfRecord) -> BoardEntry {
        BoardEntry::evaluate(ctf.clone(), self.is_joined(&ctf.id), self.now, &self.policy)
    }
}
