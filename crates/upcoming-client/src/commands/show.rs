//! The agenda view.

use std::io::Write;

use tracing::debug;
use upcoming_core::render_events;

use crate::config::AppConfig;
use crate::error::ClientResult;

/// Authorizes if needed, fetches the upcoming events and prints the box.
pub async fn run(config: &AppConfig) -> ClientResult<()> {
    let client = super::terminal_authenticator(config)?
        .ensure_authorized_client()
        .await?;

    let events = client.fetch_upcoming_events(&config.event_query()).await?;
    debug!(count = events.len(), calendar = %config.calendar_id, "fetched events");

    let terminal = config.terminal()?;
    let agenda = render_events(&terminal, &events)?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(agenda.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
