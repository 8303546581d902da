use crate::patients::PatientRecord;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// A row-level change on the patients table. Deletes carry the old row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "record", rename_all = "UPPERCASE")]
pub enum ChangeEvent {
    Insert(PatientRecord),
    Update(PatientRecord),
    Delete(PatientRecord),
}

impl ChangeEvent {
    pub fn record(&self) -> &PatientRecord {
        match self {
            ChangeEvent::Insert(r) | ChangeEvent::Update(r) | ChangeEvent::Delete(r) => r,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ChangeEvent::Insert(_) => "insert",
            ChangeEvent::Update(_) => "update",
            ChangeEvent::Delete(_) => "delete",
        }
    }
}

/// Receiving end of a change feed. Ends (`recv` yields `None`) when the feed
/// is closed; subscribe again to resume.
#[derive(Debug)]
pub struct Subscription {
    rx: UnboundedReceiver<ChangeEvent>,
}

impl Subscription {
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<ChangeEvent> {
        self.rx.try_recv().ok()
    }
}

#[derive(Clone, Default)]
pub struct ChangeFeed {
    subscribers: Arc<Mutex<Vec<UnboundedSender<ChangeEvent>>>>,
}

impl ChangeFeed {
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().push(tx);
        Subscription { rx }
    }

    /// Fans the event out to every live subscriber and returns how many
    /// received it. Dropped subscriptions are pruned here.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        let mut subscribers = self.lock();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        subscribers.len()
    }

    /// Ends every current subscription, as a dropped connection would.
    pub fn close_all(&self) {
        self.lock().clear();
    }

    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self.lock();
        subscribers.retain(|tx| !tx.is_closed());
        subscribers.len()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<UnboundedSender<ChangeEvent>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
