//! Perception adapter: recognizer output into a running session.
//!
//! The recognizer itself lives outside this crate. It produces one
//! `PerceptionEvent` per processed frame, either as a stream or as JSON lines
//! such as `{"label":"rock","confidence":0.91}`.

use tokio_stream::{Stream, StreamExt};

use rpshand_core::types::PerceptionEvent;

use crate::session::SessionHandle;

/// Parse one JSON line. Blank or malformed lines yield `None`.
pub fn parse_event_line(line: &str) -> Option<PerceptionEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str(line) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::debug!("skipping perception line: {e}");
            None
        }
    }
}

/// Pump `events` into the session until the stream ends or the session
/// closes. Returns how many events were queued.
pub async fn forward<S>(mut events: S, handle: SessionHandle) -> usize
where
    S: Stream<Item = PerceptionEvent> + Unpin,
{
    let mut queued = 0;
    while let Some(event) = events.next().await {
        if handle.perceive(event) {
            queued += 1;
        } else if handle.is_closed() {
            tracing::info!("📷 Session closed, perception forwarding stopped");
            break;
        }
    }
    tracing::debug!("perception stream finished after {queued} events");
    queued
}
