//! TUI rendering traits for gradesync types.
//!
//! Extension traits that add colored terminal rendering to gradesync-core
//! types using owo_colors.

use gradesync_core::reconcile::{Action, ActionKind, ActionSummary};
use gradesync_core::store::CalendarInfo;
use gradesync_core::task::{TaskRecord, TaskStatus};
use owo_colors::OwoColorize;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for ActionKind {
    fn render(&self) -> String {
        colorize(*self, self.symbol())
    }
}

impl Render for CalendarInfo {
    fn render(&self) -> String {
        format!("📅 {}", self.label())
    }
}

/// Colorize text according to the action kind
fn colorize(kind: ActionKind, text: &str) -> String {
    match kind {
        ActionKind::Create => text.green().to_string(),
        ActionKind::MarkNeedsAttention => text.yellow().to_string(),
        ActionKind::Failed => text.red().to_string(),
        ActionKind::Preserve | ActionKind::Skipped => text.dimmed().to_string(),
    }
}

fn status_label(status: Option<TaskStatus>) -> String {
    status.map_or_else(|| "no status".to_string(), |s| s.to_string())
}

/// One line for an action, titled after the local record it came from.
fn render_action(action: &Action, record: &TaskRecord) -> String {
    let kind = action.kind();
    let title = colorize(kind, &record.to_string());

    let detail = match action {
        Action::Create(created) => created
            .due
            .as_ref()
            .map(|due| format!("due {}", due))
            .unwrap_or_default(),
        Action::Preserve { status, .. } => status_label(*status),
        Action::MarkNeedsAttention { previous, .. } => {
            format!("{} -> {}", status_label(*previous), TaskStatus::NeedsAction)
        }
        Action::Skipped { reason } => format!("skipped: {}", reason),
        Action::Failed { operation, error, .. } => {
            return format!(
                "{} {} {}",
                kind.render(),
                title,
                format!("{} failed: {}", operation, error).red()
            );
        }
    };

    format!("{} {} {}", kind.render(), title, detail.dimmed())
}

/// Render each action next to its local record (actions and records are
/// index-aligned). Unchanged tasks are folded into a count unless verbose.
pub fn render_actions(actions: &[Action], local: &[TaskRecord], verbose: bool) -> Vec<String> {
    let mut lines = Vec::new();
    let mut unchanged = 0;

    for (action, record) in actions.iter().zip(local) {
        if !verbose && action.kind() == ActionKind::Preserve {
            unchanged += 1;
            continue;
        }
        lines.push(render_action(action, record));
    }

    if unchanged > 0 {
        let label = format!("({} unchanged {})", unchanged, pluralize("task", unchanged));
        lines.push(format!("{} {}", ActionKind::Preserve.render(), label.dimmed()));
    }

    if lines.is_empty() {
        lines.push("No assignments".dimmed().to_string());
    }

    lines
}

/// Simple pluralization helper
fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}

pub fn render_summary(summary: &ActionSummary, dry_run: bool) -> String {
    let prefix = if dry_run { "Would sync" } else { "Synced" };

    let mut line = format!(
        "{}: {} created, {} reopened, {} unchanged",
        prefix, summary.created, summary.marked, summary.preserved
    );
    if summary.skipped > 0 {
        line.push_str(&format!(", {} skipped", summary.skipped));
    }
    if summary.failed > 0 {
        line.push_str(&format!(", {}", format!("{} failed", summary.failed).red()));
    }

    line
}
