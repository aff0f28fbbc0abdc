use std::{fmt::Write, str::FromStr, sync::Arc};

use indoc::indoc;
use lazy_regex::regex_captures;

use crate::{
    api::{ProgressBackend, SubmissionReceipt},
    board::{render_entry, ActionError, BoardHandle, BoardQuery, BoardSnapshot, StatusFilter},
    models::{CtfId, LeaderboardEntry, SubmissionRecord},
    status::AvailabilityPolicy,
    utils::formatting::format_in,
};

const LEADERBOARD_LIMIT: u32 = 10;
const SUBMISSIONS_LIMIT: u32 = 10;

pub const HELP: &str = indoc! {"
    Commands:
      refresh                 reload the board now
      auto on|off             toggle the periodic refresh
      filter <status>         all, active, inactive_hours, upcoming, ended or inactive
      search [text]           search titles and descriptions, empty to clear
      category [name]         show a single category, empty or `all` to clear
      open <id>               show a CTF with fresh membership
      join <id>               join a CTF
      submit <id> <flag>      submit a flag
      status                  show what the board is doing
      leaderboard [id]        global standings, or those of one CTF
      submissions             your latest submissions
      help                    show this message
      quit                    leave
"};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConsoleCommand {
    Refresh,
    AutoRefresh(bool),
    Filter(StatusFilter),
    Search(Option<String>),
    Category(Option<String>),
    Open(CtfId),
    Join(CtfId),
    Submit { id: CtfId, flag: String },
    Status,
    Leaderboard(Option<CtfId>),
    Submissions,
    Help,
    Quit,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ParseCommandError {
    #[error("Unknown command `{0}`. Type `help` for the list of commands.")]
    Unknown(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
    #[error("Unknown status `{0}`. Use `all`, `active`, `inactive_hours`, `upcoming`, `ended` or `inactive`.")]
    Status(String),
}

fn ctf_id(argument: &str, usage: &'static str) -> Result<CtfId, ParseCommandError> {
    match argument {
        "" => Err(ParseCommandError::Usage(usage)),
        id if id.contains(char::is_whitespace) => Err(ParseCommandError::Usage(usage)),
        id => Ok(CtfId::from(id)),
    }
}

fn optional(argument: &str) -> Option<String> {
    (!argument.is_empty()).then(|| argument.to_owned())
}

impl FromStr for ConsoleCommand {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (name, argument) = match s.split_once(char::is_whitespace) {
            Some((name, argument)) => (name, argument.trim()),
            None => (s, ""),
        };

        match name.to_ascii_lowercase().as_str() {
            "refresh" | "r" => Ok(ConsoleCommand::Refresh),

            "auto" => match argument.to_ascii_lowercase().as_str() {
                "on" => Ok(ConsoleCommand::AutoRefresh(true)),
                "off" => Ok(ConsoleCommand::AutoRefresh(false)),
                _ => Err(ParseCommandError::Usage("auto on|off")),
            },

            "filter" => StatusFilter::from_str(argument)
                .map(ConsoleCommand::Filter)
                .map_err(|_| ParseCommandError::Status(argument.to_owned())),

            "search" => Ok(ConsoleCommand::Search(optional(argument))),
            "category" => Ok(ConsoleCommand::Category(optional(argument))),

            "open" => ctf_id(argument, "open <id>").map(ConsoleCommand::Open),
            "join" => ctf_id(argument, "join <id>").map(ConsoleCommand::Join),

            "submit" => match regex_captures!(r"^(\S+)\s+(.+)$", argument) {
                Some((_, id, flag)) => Ok(ConsoleCommand::Submit {
                    id: CtfId::from(id),
                    flag: flag.to_owned(),
                }),
                None => Err(ParseCommandError::Usage("submit <id> <flag>")),
            },

            "status" => Ok(ConsoleCommand::Status),
            "leaderboard" | "lb" => match argument {
                "" => Ok(ConsoleCommand::Leaderboard(None)),
                id => ctf_id(id, "leaderboard [id]")
                    .map(|id| ConsoleCommand::Leaderboard(Some(id))),
            },
            "submissions" => Ok(ConsoleCommand::Submissions),

            "help" | "?" => Ok(ConsoleCommand::Help),
            "quit" | "exit" | "q" => Ok(ConsoleCommand::Quit),

            _ => Err(ParseCommandError::Unknown(name.to_owned())),
        }
    }
}

pub fn describe_receipt(receipt: &SubmissionReceipt) -> String {
    let verdict = match receipt.is_correct {
        Some(true) => match receipt.points {
            Some(points) => format!("Correct flag, +{points} points"),
            None => "Correct flag".to_string(),
        },
        Some(false) => "Incorrect flag".to_string(),
        None => "Flag submitted".to_string(),
    };

    match &receipt.message {
        Some(message) if !message.trim().is_empty() => format!("{verdict}. {}", message.trim()),
        _ => format!("{verdict}."),
    }
}

pub fn render_status(snapshot: &BoardSnapshot, policy: &AvailabilityPolicy) -> String {
    let mut out = format!(
        "Board at {} {}: data generation {}, showing {} of {}, {}, auto refresh {}.",
        format_in(snapshot.now, policy.offset),
        policy.zone_label,
        snapshot.applied_generation,
        snapshot.entries.len(),
        snapshot.total,
        if snapshot.refreshing { "refreshing" } else { "idle" },
        if snapshot.auto_refresh { "on" } else { "off" },
    );

    if let Some(error) = &snapshot.last_error {
        let _ = write!(out, " Last refresh: {error}");
    }

    out
}

pub fn render_leaderboard(title: &str, entries: &[LeaderboardEntry]) -> String {
    let mut out = format!("# {title}\n");

    if entries.is_empty() {
        out.push_str("Nobody has scored yet.\n");
    }

    for (index, entry) in entries.iter().enumerate() {
        let rank = entry.rank.unwrap_or(index as u32 + 1);
        let _ = writeln!(
            out,
            "{rank:>3}. {} ({} points)",
            entry.display_name(),
            entry.total_points
        );
    }

    out
}

pub fn render_submissions(submissions: &[SubmissionRecord], policy: &AvailabilityPolicy) -> String {
    let mut out = "# Your submissions\n".to_string();

    if submissions.is_empty() {
        out.push_str("No submissions yet.\n");
    }

    for submission in submissions {
        let verdict = match (submission.is_correct, submission.points) {
            (Some(true), Some(points)) => format!("+{points}"),
            (Some(true), None) => "correct".to_string(),
            (Some(false), _) => "failed".to_string(),
            (None, _) => "pending".to_string(),
        };
        let when = submission
            .submitted_at()
            .map(|at| format!("{} {}", format_in(at, policy.offset), policy.zone_label))
            .unwrap_or_else(|| "unknown time".to_string());

        let _ = writeln!(out, "- {} [{verdict}] at {when}", submission.ctf_title());
    }

    out
}

/// Runs commands against the board and the progress endpoints. Tracks the
/// filters so they can be changed one at a time.
pub struct Console {
    handle: BoardHandle,
    progress: Arc<dyn ProgressBackend>,
    policy: AvailabilityPolicy,
    query: BoardQuery,
}

impl Console {
    pub fn new(
        handle: BoardHandle,
        progress: Arc<dyn ProgressBackend>,
        policy: AvailabilityPolicy,
        query: BoardQuery,
    ) -> Console {
        Console {
            handle,
            progress,
            policy,
            query,
        }
    }

    async fn change_query(&mut self, query: BoardQuery) -> Result<Option<String>, ActionError> {
        self.query = query;
        self.handle.set_query(self.query.clone()).await?;
        Ok(None)
    }

    /// Returns a message to show, if any.
    pub async fn execute(&mut self, command: ConsoleCommand) -> Result<Option<String>, ActionError> {
        use ConsoleCommand::*;

        match command {
            Refresh => {
                self.handle.refresh().await?;
                Ok(None)
            }

            AutoRefresh(enabled) => {
                self.handle.set_auto_refresh(enabled).await?;
                Ok(Some(format!(
                    "Auto refresh is {}.",
                    if enabled { "on" } else { "off" }
                )))
            }

            Filter(status) => {
                let query = BoardQuery::new(
                    status,
                    self.query.search.clone(),
                    self.query.category.clone(),
                );
                self.change_query(query).await
            }

            Search(search) => {
                let query = BoardQuery::new(self.query.status, search, self.query.category.clone());
                self.change_query(query).await
            }

            Category(category) => {
                let query = BoardQuery::new(self.query.status, self.query.search.clone(), category);
                self.change_query(query).await
            }

            Open(id) => {
                let entry = self.handle.open(id).await?;
                Ok(Some(render_entry(&entry, &self.policy)))
            }

            Join(id) => {
                self.handle.join(id.clone()).await?;
                Ok(Some(format!("Joined {id}.")))
            }

            Submit { id, flag } => {
                let receipt = self.handle.submit_flag(id, flag).await?;
                Ok(Some(describe_receipt(&receipt)))
            }

            Status => {
                let snapshot = self.handle.snapshot().await?;
                Ok(Some(render_status(&snapshot, &self.policy)))
            }

            Leaderboard(None) => {
                let entries = self
                    .progress
                    .global_leaderboard(Some(LEADERBOARD_LIMIT))
                    .await?;
                Ok(Some(render_leaderboard("Global leaderboard", &entries)))
            }

            Leaderboard(Some(id)) => {
                let entries = self.progress.ctf_leaderboard(&id).await?;
                Ok(Some(render_leaderboard(&format!("Leaderboard of {id}"), &entries)))
            }

            Submissions => {
                let submissions = self
                    .progress
                    .my_submissions(Some(SUBMISSIONS_LIMIT))
                    .await?;
                Ok(Some(render_submissions(&submissions, &self.policy)))
            }

            Help => Ok(Some(HELP.to_string())),

            Quit => Ok(None),
        }
    }
}
