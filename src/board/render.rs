use std::fmt::Write;

use indoc::formatdoc;

use crate::{status::AvailabilityPolicy, utils::formatting::format_in};

use super::{BoardEntry, BoardSnapshot};

/// Renders a snapshot as plain text for the terminal.
pub fn render_board(snapshot: &BoardSnapshot, policy: &AvailabilityPolicy) -> String {
    let mut out = formatdoc! {
        r#"
            # CTFs at {now} {zone}

            Showing {shown} of {total}. Auto refresh is {auto_refresh}.
        "#,
        now = format_in(snapshot.now, policy.offset),
        zone = policy.zone_label,
        shown = snapshot.entries.len(),
        total = snapshot.total,
        auto_refresh = if snapshot.auto_refresh { "on" } else { "off" },
    };

    if snapshot.signed_out {
        out.push_str("\nYour session has expired. Sign in again to see the board.\n");
        return out;
    }

    if let Some(error) = &snapshot.last_error {
        let _ = writeln!(out, "\n**{error}**");
    }

    if !snapshot.loaded {
        out.push_str("\nLoading CTFs...\n");
        return out;
    }

    if snapshot.refreshing {
        out.push_str("\nRefreshing...\n");
    }

    if snapshot.entries.is_empty() {
        out.push_str("\nNo CTFs match the current filters.\n");
    }

    for entry in &snapshot.entries {
        out.push('\n');
        out.push_str(&render_entry(entry, policy));
    }

    out
}

pub fn render_entry(entry: &BoardEntry, policy: &AvailabilityPolicy) -> String {
    let ctf = &entry.ctf;

    let active_hours = match ctf.scheduling_info().active_hours {
        Some(hours) => format!(
            "{} - {} {}{}",
            hours.start.to_12_hour(),
            hours.end.to_12_hour(),
            policy.zone_label,
            if hours.crosses_midnight() { ", overnight" } else { "" }
        ),
        None => "not set".to_string(),
    };

    let mut actions = Vec::new();
    if entry.affordances.can_join {
        actions.push("join");
    }
    if entry.affordances.shows_continue {
        actions.push("continue");
    }
    if entry.affordances.can_visit_link {
        actions.push("visit challenge");
    }
    if entry.affordances.can_submit_flag {
        actions.push("submit flag");
    }

    formatdoc! {
        r#"
            ## {title} [{label}]
            {description}
            {category} | {difficulty} | {points} points | {participants} participants
            Active hours: {active_hours}
            Actions: {actions}
        "#,
        title = ctf.title,
        label = entry.badge.label,
        description = entry.badge.description,
        category = ctf.category.as_deref().unwrap_or("Uncategorized"),
        difficulty = ctf.difficulty(),
        points = ctf.points.unwrap_or(0),
        participants = ctf.participant_count(),
        actions = if actions.is_empty() { "none".to_string() } else { actions.join(", ") },
    }
}
