use serde::Deserialize;

use super::types::UtcDateTime;

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardUser {
    #[serde(default)]
    pub full_name: Option<String>,
}

/// One row of a global or per-CTF leaderboard.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    #[serde(default)]
    pub user: Option<LeaderboardUser>,
    #[serde(default, alias = "points")]
    pub total_points: u32,
    #[serde(default)]
    pub rank: Option<u32>,
}

impl LeaderboardEntry {
    pub fn display_name(&self) -> &str {
        self.user
            .as_ref()
            .and_then(|user| user.full_name.as_deref())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or("Anonymous")
    }
}

/// The CTF of a submission, either populated or as a bare id.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SubmissionCtf {
    Populated {
        #[serde(default)]
        title: String,
    },
    Id(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    #[serde(default)]
    pub ctf: Option<SubmissionCtf>,
    #[serde(default)]
    pub is_correct: Option<bool>,
    #[serde(default)]
    pub points: Option<u32>,
    #[serde(default)]
    pub submitted_at: Option<String>,
}

impl SubmissionRecord {
    pub fn ctf_title(&self) -> &str {
        match &self.ctf {
            Some(SubmissionCtf::Populated { title }) if !title.is_empty() => title,
            Some(SubmissionCtf::Id(id)) => id,
            _ => "Unknown CTF",
        }
    }

    pub fn submitted_at(&self) -> Option<UtcDateTime> {
        self.submitted_at.as_deref()?.parse().ok()
    }
}
