//! Plain-text rendering of sessions and shared record sets.

use std::fmt::Write;

use anyhow::Result;
use rollshare_core::utils::truncate_string;
use rollshare_core::{Session, ShareViewer, StudentRecord, ViewState};

// ============================================================================
// Constants
// ============================================================================

/// Maximum displayed width of the name column
const NAME_COLUMN_MAX: usize = 28;

/// Maximum displayed width of the email column
const EMAIL_COLUMN_MAX: usize = 36;

/// Maximum displayed width of the roll number column
const ROLL_COLUMN_MAX: usize = 14;

pub const EMPTY_SHARE_MESSAGE: &str = "The share link is valid, but no student data was found.";
pub const NO_MATCHES_MESSAGE: &str = "No students match your filter criteria.";

/// Render the viewer's current state: a table, or the message for an empty
/// or fully filtered record set.
pub fn render_view(viewer: &ShareViewer) -> String {
    match viewer.view_state() {
        ViewState::Empty => EMPTY_SHARE_MESSAGE.to_string(),
        ViewState::NoMatches => NO_MATCHES_MESSAGE.to_string(),
        ViewState::Rows(count) => {
            let mut out = render_table(&viewer.visible());
            let total = viewer.records().len();
            if count == total {
                let _ = write!(out, "\n{} student{}", total, plural(total));
            } else {
                let _ = write!(out, "\n{} of {} students", count, total);
            }
            out
        }
    }
}

/// Render records as an aligned table of roll number, name and email.
pub fn render_table(records: &[&StudentRecord]) -> String {
    let rows: Vec<[String; 3]> = records
        .iter()
        .map(|r| {
            [
                truncate_string(&r.roll_no, ROLL_COLUMN_MAX),
                truncate_string(&r.full_name(), NAME_COLUMN_MAX),
                truncate_string(&r.email, EMAIL_COLUMN_MAX),
            ]
        })
        .collect();

    let headers = ["Roll No", "Name", "Email"];
    let mut widths = headers.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &headers.map(String::from), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_row(&mut out, &[rule[0].clone(), rule[1].clone(), rule[2].clone()], &widths);
    for row in &rows {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row(out: &mut String, cells: &[String; 3], widths: &[usize; 3]) {
    let line = format!(
        "{:<w0$}  {:<w1$}  {}",
        cells[0],
        cells[1],
        cells[2],
        w0 = widths[0],
        w1 = widths[1],
    );
    out.push_str(line.trim_end());
    out.push('\n');
}

/// Records as pretty-printed JSON, in the wire shape.
pub fn render_json(records: &[&StudentRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

pub fn render_status(session: &Session) -> String {
    let state = if session.is_authenticated {
        "logged in"
    } else if session.refresh_token.is_some() {
        "logged out (refresh token stored)"
    } else {
        "logged out"
    };
    format!(
        "Session: {}\nAccess token: {}\nRefresh token: {}",
        state,
        present(session.access_token.is_some()),
        present(session.refresh_token.is_some()),
    )
}

fn present(stored: bool) -> &'static str {
    if stored {
        "stored"
    } else {
        "none"
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}
