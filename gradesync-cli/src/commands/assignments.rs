use anyhow::Result;
use gradesync_core::config::Config;
use gradesync_core::ics::generate_todo;
use owo_colors::OwoColorize;

use super::fetch_local_tasks;

pub async fn run(config: &Config) -> Result<()> {
    let tasks = fetch_local_tasks(config).await?;

    if tasks.is_empty() {
        println!("{}", "No assignments found for the configured term".dimmed());
        return Ok(());
    }

    for task in &tasks {
        print!("{}", generate_todo(task)?);
    }

    Ok(())
}
