//! Text rendering of dashboards and results.
//!
//! Views are built as strings so they can be tested; [`emit`] and
//! [`prompt`] are the only functions that write to the terminal.

use std::fmt::Write as _;
use std::io::Write as _;

use chrono::Local;
use upvote_client::LoadPhase;
use upvote_client::dashboard::{VoteOutcome, VoteStatus, VoterState};
use upvote_core::{CurrentUser, Idea};

pub const EMPTY_VOTER_LIST: &str = "No approved ideas yet; wait for an admin to approve some.";
pub const LOADING: &str = "Loading...";

/// Write a rendered block to stdout.
#[allow(clippy::print_stdout)]
pub fn emit(text: &str) {
    println!("{text}");
}

/// Write a prompt without a trailing newline.
#[allow(clippy::print_stdout)]
pub fn prompt(text: &str) -> std::io::Result<()> {
    print!("{text}");
    std::io::stdout().flush()
}

fn phase_line(phase: &LoadPhase) -> Option<String> {
    match phase {
        LoadPhase::Loading => Some(LOADING.to_string()),
        LoadPhase::Failed(message) => Some(format!("{message} Type `refresh` to try again.")),
        LoadPhase::Ready => None,
    }
}

fn votes_label(votes: u32) -> String {
    if votes == 1 {
        "1 vote".to_string()
    } else {
        format!("{votes} votes")
    }
}

fn idea_card(out: &mut String, idea: &Idea, button: Option<&str>) {
    let _ = write!(out, "#{} {}  [{}]", idea.id, idea.title, votes_label(idea.votes));
    if let Some(label) = button {
        let _ = write!(out, "  ({label})");
    }
    let _ = writeln!(out);
    for line in idea.description.lines() {
        let _ = writeln!(out, "    {line}");
    }
    let _ = writeln!(
        out,
        "    submitted {}",
        idea.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
    );
}

/// The voter dashboard.
#[must_use]
pub fn voter_view(state: &VoterState) -> String {
    let mut out = String::from("Approved ideas\n");

    match state.status() {
        VoteStatus::Voted { title: Some(title) } => {
            let _ = writeln!(out, "You voted for: {title}");
        }
        VoteStatus::Voted { title: None } => {
            let _ = writeln!(out, "You have already voted.");
        }
        VoteStatus::Voting { title, .. } => {
            let _ = writeln!(out, "Voting for {title}...");
        }
        VoteStatus::NotVoted => {}
    }

    if let Some(line) = phase_line(state.phase()) {
        out.push_str(&line);
        return out;
    }

    if state.ideas().is_empty() {
        out.push_str(EMPTY_VOTER_LIST);
        return out;
    }

    for idea in state.ideas() {
        out.push('\n');
        idea_card(&mut out, idea, Some(state.button(idea.id).label()));
    }
    out.trim_end().to_string()
}

/// The admin dashboard: review queue, approved list and total votes.
#[must_use]
pub fn admin_view(pending: &[Idea], approved: &[Idea], phase: &LoadPhase, total: u64) -> String {
    let mut out = String::new();

    if let Some(line) = phase_line(phase) {
        if pending.is_empty() && approved.is_empty() {
            out.push_str(&line);
            return out;
        }
        let _ = writeln!(out, "{line}\n");
    }

    let _ = writeln!(out, "Pending ideas ({})", pending.len());
    if pending.is_empty() {
        let _ = writeln!(out, "Nothing to review.");
    }
    for idea in pending {
        out.push('\n');
        idea_card(&mut out, idea, None);
    }

    let _ = writeln!(out, "\nApproved ideas ({})", approved.len());
    for idea in approved {
        out.push('\n');
        idea_card(&mut out, idea, None);
    }

    let _ = write!(out, "\nTotal votes: {total}");
    out
}

#[must_use]
pub fn vote_outcome(outcome: &VoteOutcome) -> String {
    match outcome {
        VoteOutcome::Recorded { idea } => format!(
            "Vote recorded for \"{}\" (now {}).",
            idea.title,
            votes_label(idea.votes)
        ),
        VoteOutcome::AlreadyVoted {
            title: Some(title), ..
        } => format!("You have already voted for \"{title}\"."),
        VoteOutcome::AlreadyVoted { message, .. } => message.clone(),
    }
}

#[must_use]
pub fn user_line(user: &CurrentUser) -> String {
    format!("Signed in as {} <{}> ({})", user.username, user.email, user.role)
}
