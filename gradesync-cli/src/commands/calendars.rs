use anyhow::Result;
use gradesync_core::config::Config;
use gradesync_core::store::{CalendarStore, select_calendar};
use owo_colors::OwoColorize;

use super::connect_store;
use crate::render::Render;
use crate::utils::tui;

pub async fn run(config: &Config) -> Result<()> {
    let store = connect_store(config)?;

    let spinner = tui::create_spinner("Discovering calendars".to_string());
    let result = store.list_calendars().await;
    spinner.finish_and_clear();
    let calendars = result?;

    let selected = select_calendar(calendars.clone(), config.caldav.calendar.as_deref())?;

    for calendar in &calendars {
        if *calendar == selected {
            println!("{} {}", calendar.render(), "(selected)".green());
        } else {
            println!("{}", calendar.render());
        }
    }

    Ok(())
}
