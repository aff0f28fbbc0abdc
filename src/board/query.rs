use std::str::FromStr;

use crate::{
    api::CtfListParams,
    models::CtfRecord,
    status::DerivedStatus,
};

/// Which derived statuses the board shows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(DerivedStatus),
}

impl FromStr for StatusFilter {
    type Err = strum::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            Ok(StatusFilter::All)
        } else {
            DerivedStatus::from_str(&s.to_ascii_lowercase()).map(StatusFilter::Only)
        }
    }
}

impl StatusFilter {
    pub fn matches(&self, status: DerivedStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }

    /// The status to ask the backend for. The backend only knows its own
    /// coarse flag, so both playable and off-hours CTFs are fetched as `active`.
    pub fn server_status(&self) -> Option<&'static str> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Only(DerivedStatus::Active | DerivedStatus::InactiveHours) => {
                Some("active")
            }
            StatusFilter::Only(DerivedStatus::Upcoming) => Some("upcoming"),
            StatusFilter::Only(DerivedStatus::Ended) => Some("ended"),
            StatusFilter::Only(DerivedStatus::Inactive) => Some("inactive"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BoardQuery {
    pub status: StatusFilter,
    pub search: Option<String>,
    pub category: Option<String>,
}

impl BoardQuery {
    /// Blank searches and the `all` category mean no restriction.
    pub fn new(status: StatusFilter, search: Option<String>, category: Option<String>) -> BoardQuery {
        let search = search
            .map(|search| search.trim().to_owned())
            .filter(|search| !search.is_empty());
        let category = category
            .map(|category| category.trim().to_owned())
            .filter(|category| !category.is_empty() && !category.eq_ignore_ascii_case("all"));

        BoardQuery {
            status,
            search,
            category,
        }
    }

    pub fn matches(&self, ctf: &CtfRecord, status: DerivedStatus) -> bool {
        if !self.status.matches(status) {
            return false;
        }

        if let Some(search) = &self.search {
            if !ctf.matches_search(search) {
                return false;
            }
        }

        if let Some(category) = &self.category {
            if ctf.category.as_deref() != Some(category.as_str()) {
                return false;
            }
        }

        true
    }

    pub fn to_params(&self) -> CtfListParams {
        CtfListParams {
            status: self.status.server_status().map(str::to_owned),
            search: self.search.clone(),
            category: self.category.clone(),
        }
    }
}
