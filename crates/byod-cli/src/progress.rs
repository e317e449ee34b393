//! Follow a progress stream to its outcome on the terminal

use std::time::Duration;

use anyhow::{bail, Result};
use byod_core::{ProgressEvent, StreamConsumer, StreamRequest};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::output::progress_line;

/// Start `request` on `consumer`, report progress through `on_progress`,
/// and return the completion payload.
///
/// Fails on an error outcome, on a close without outcome, and when no
/// update arrives within `idle`. The latter two reset the consumer.
pub async fn follow_with<F>(
    consumer: &StreamConsumer,
    request: StreamRequest,
    idle: Duration,
    mut on_progress: F,
) -> Result<Map<String, Value>>
where
    F: FnMut(&ProgressEvent),
{
    let mut rx = consumer.subscribe();
    consumer.start(request);

    let mut last_seen: Option<ProgressEvent> = None;
    loop {
        let state = rx.borrow_and_update().clone();

        if let Some(progress) = &state.last_progress {
            if last_seen.as_ref() != Some(progress) {
                on_progress(progress);
                last_seen = Some(progress.clone());
            }
        }
        if let Some(error) = state.error {
            bail!(error);
        }
        if let Some(result) = state.result {
            return Ok(result);
        }
        if state.closed_without_outcome() {
            consumer.reset();
            bail!("connection closed before the operation reported an outcome");
        }

        match tokio::time::timeout(idle, rx.changed()).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => bail!("stream consumer went away"),
            Err(_) => {
                warn!("No stream update for {:?}, giving up", idle);
                consumer.reset();
                bail!("no update from the server for {}s", idle.as_secs());
            }
        }
        debug!("Stream state changed");
    }
}

/// [`follow_with`] printing each progress update to stderr
pub async fn follow(
    consumer: &StreamConsumer,
    request: StreamRequest,
    idle: Duration,
) -> Result<Map<String, Value>> {
    follow_with(consumer, request, idle, |progress| {
        eprintln!("{}", progress_line(progress))
    })
    .await
}
