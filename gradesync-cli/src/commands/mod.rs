pub mod assignments;
pub mod calendars;
pub mod sync;

use anyhow::Result;
use gradesync_core::config::Config;
use gradesync_core::coursework::collect_local_tasks;
use gradesync_core::task::TaskRecord;
use gradesync_provider_caldav::CalDavStore;
use gradesync_provider_gradescope::GradescopeClient;

use crate::utils::tui;

/// Log in to Gradescope and build a task record per assignment.
async fn fetch_local_tasks(config: &Config) -> Result<Vec<TaskRecord>> {
    let mut client = GradescopeClient::new(&config.gradescope.email, &config.gradescope.password)?;

    let spinner = tui::create_spinner(format!(
        "Fetching {} {} assignments from Gradescope",
        config.gradescope.term.season, config.gradescope.term.year
    ));
    let result = collect_local_tasks(&mut client, &config.gradescope.term).await;
    spinner.finish_and_clear();

    Ok(result?)
}

fn connect_store(config: &Config) -> Result<CalDavStore> {
    Ok(CalDavStore::connect(
        &config.caldav.url,
        &config.caldav.username,
        &config.caldav.password,
    )?)
}
