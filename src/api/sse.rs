//! Server-Sent Events for rendering sinks

use crate::session::{HistoryEvent, HistorySnapshot, HistoryStore, TurnPhase};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{self, Stream};
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::{BroadcastStream, WatchStream};
use tokio_stream::StreamExt;

/// Events sent to SSE clients
#[derive(Debug, Clone)]
pub enum StreamEvent {
    Init { snapshot: HistorySnapshot },
    History(HistoryEvent),
    Phase(TurnPhase),
}

/// Initial snapshot, then history changes and turn phases as they happen.
///
/// A subscriber that falls behind the event channel gets a fresh `init`
/// snapshot instead of the events it missed.
pub fn sse_stream(
    history: Arc<HistoryStore>,
    phase_rx: watch::Receiver<TurnPhase>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (snapshot, history_rx) = history.snapshot_and_subscribe();
    // Highest revision the client has already been shown
    let mut seen = snapshot.revision;
    let init = stream::once(async move { StreamEvent::Init { snapshot } });

    let changes = BroadcastStream::new(history_rx).filter_map(move |result| match result {
        Ok(event) if event.revision() <= seen => None,
        Ok(event) => {
            seen = event.revision();
            Some(StreamEvent::History(event))
        }
        Err(BroadcastStreamRecvError::Lagged(missed)) => {
            tracing::warn!(missed, "SSE subscriber lagged, resending snapshot");
            let snapshot = history.snapshot();
            seen = snapshot.revision;
            Some(StreamEvent::Init { snapshot })
        }
    });
    let phases = WatchStream::new(phase_rx).map(StreamEvent::Phase);

    let combined = init
        .chain(changes.merge(phases))
        .map(|event| Ok::<_, Infallible>(stream_event_to_axum(event)));

    Sse::new(combined).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn stream_event_to_axum(event: StreamEvent) -> Event {
    let (event_type, data) = match event {
        StreamEvent::Init { snapshot } => (
            "init",
            json!({
                "type": "init",
                "entries": snapshot.entries,
                "revision": snapshot.revision
            }),
        ),
        StreamEvent::History(HistoryEvent::Appended { entry, revision }) => (
            "appended",
            json!({
                "type": "appended",
                "entry": entry,
                "revision": revision
            }),
        ),
        StreamEvent::History(HistoryEvent::Reset { revision }) => (
            "reset",
            json!({
                "type": "reset",
                "revision": revision
            }),
        ),
        StreamEvent::Phase(phase) => (
            "phase",
            json!({
                "type": "phase",
                "phase": phase,
                "busy": phase.is_busy()
            }),
        ),
    };

    Event::default().event(event_type).data(data.to_string())
}
