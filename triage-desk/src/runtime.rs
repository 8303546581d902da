use crate::state::AppState;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use triage_core::streams::ChangeEvent;
use triage_core::PatientRecord;

const RESUBSCRIBE_DELAY: Duration = Duration::from_secs(1);

pub trait EventSink: Send + Sync + 'static {
    fn emit_json(&self, event: &str, payload: serde_json::Value);
}

pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit_json(&self, event: &str, payload: serde_json::Value) {
        debug!(event, %payload, "dashboard notification");
    }
}

pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit_json(&self, _event: &str, _payload: serde_json::Value) {}
}

pub fn start(state: &AppState) -> JoinHandle<()> {
    start_with_sink(state, TracingSink)
}

pub fn start_with_sink(state: &AppState, sink: impl EventSink) -> JoinHandle<()> {
    tokio::spawn(run_feed(state.clone(), sink))
}

/// Seeds the queue from the store and applies change events until the
/// feed closes, then does both again. A failed fetch leaves the queue in
/// its failed state and ends the pump; it is not retried.
pub async fn run_feed(state: AppState, sink: impl EventSink) {
    loop {
        // Subscribe first so nothing written during the fetch is missed.
        let mut subscription = state.store.subscribe();

        match state.store.fetch_all().await {
            Ok(records) => seed(&state, &sink, records),
            Err(err) => {
                error!(error = %err, "failed to fetch patients");
                state.write_queue().fail(err.to_string());
                sink.emit_json("queue-error", serde_json::json!({ "message": err.to_string() }));
                return;
            }
        }

        while let Some(event) = subscription.recv().await {
            apply_change(&state, &sink, event);
        }

        warn!("patient change feed closed; resubscribing");
        tokio::time::sleep(RESUBSCRIBE_DELAY).await;
    }
}

fn seed(state: &AppState, sink: &impl EventSink, records: Vec<PatientRecord>) {
    let count = records.len();
    let census = {
        let mut queue = state.write_queue();
        queue.seed(records);
        queue.census()
    };
    info!(count, "patient queue seeded");
    sink.emit_json("patients-updated", serde_json::json!(census));
}

fn apply_change(state: &AppState, sink: &impl EventSink, event: ChangeEvent) {
    let name = match &event {
        ChangeEvent::Insert(_) => "patient-admitted",
        ChangeEvent::Update(_) => "patient-updated",
        ChangeEvent::Delete(_) => "patient-discharged",
    };
    let summary = serde_json::json!({
        "id": event.record().id,
        "triage_level": event.record().triage_level,
    });
    debug!(kind = event.kind(), id = %event.record().id, "change received");

    let (changed, census) = {
        let mut queue = state.write_queue();
        let changed = queue.apply(event);
        (changed, queue.census())
    };
    if !changed {
        return;
    }

    sink.emit_json(name, summary);
    sink.emit_json("patients-updated", serde_json::json!(census));
}
