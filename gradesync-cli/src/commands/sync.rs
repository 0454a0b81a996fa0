use anyhow::Result;
use gradesync_core::config::Config;
use gradesync_core::store::{CalendarStore, select_calendar};
use gradesync_core::sync::{SyncOptions, SyncReport, sync_tasks};
use gradesync_core::task::TaskRecord;
use owo_colors::OwoColorize;

use super::{connect_store, fetch_local_tasks};
use crate::render::{Render, render_actions, render_summary};
use crate::utils::tui;

/// Fetch assignments, pick the calendar and reconcile.
///
/// With `dry_run` set this is the `status` command.
pub async fn run(config: &Config, options: SyncOptions, json: bool, verbose: bool) -> Result<()> {
    let local = fetch_local_tasks(config).await?;

    let store = connect_store(config)?;
    let spinner = tui::create_spinner("Discovering calendars".to_string());
    let calendars = store.list_calendars().await;
    spinner.finish_and_clear();
    let calendar = select_calendar(calendars?, config.caldav.calendar.as_deref())?;

    let verb = if options.dry_run { "Checking" } else { "Syncing" };
    let spinner = tui::create_spinner(format!("{} {}", verb, calendar.render()));
    let report = sync_tasks(&store, calendar, &local, options).await;
    spinner.finish_and_clear();
    let report = report?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report_json(&report, options))?);
    } else {
        print_report(&report, &local, options, verbose);
    }

    Ok(())
}

fn print_report(report: &SyncReport, local: &[TaskRecord], options: SyncOptions, verbose: bool) {
    println!("{}", report.calendar.render());

    for line in render_actions(&report.actions, local, verbose) {
        println!("   {}", line);
    }

    for unparsed in &report.unparsed_remote {
        println!(
            "   {} {}",
            "Ignored unreadable task".dimmed(),
            format!("{} ({})", unparsed.href, unparsed.reason).dimmed()
        );
    }

    println!("\n{}", render_summary(&report.summary(), options.dry_run));
}

fn report_json(report: &SyncReport, options: SyncOptions) -> serde_json::Value {
    let unparsed: Vec<_> = report
        .unparsed_remote
        .iter()
        .map(|u| serde_json::json!({ "href": u.href, "reason": u.reason.to_string() }))
        .collect();

    serde_json::json!({
        "calendar": report.calendar.label(),
        "dry_run": options.dry_run,
        "actions": report.actions,
        "unparsed_remote": unparsed,
    })
}
