use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use triage_core::queue::PatientQueue;
use triage_core::simulation::Simulator;
use triage_core::PatientStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PatientStore>,
    pub queue: Arc<RwLock<PatientQueue>>,
    pub simulator: Simulator,
}

impl AppState {
    pub fn new(store: Arc<dyn PatientStore>, simulation_period: Duration) -> Self {
        Self {
            simulator: Simulator::with_period(Arc::clone(&store), simulation_period),
            store,
            queue: Arc::new(RwLock::new(PatientQueue::new())),
        }
    }

    pub fn read_queue(&self) -> RwLockReadGuard<'_, PatientQueue> {
        self.queue.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Only the change-feed pump in [`crate::runtime`] writes.
    pub fn write_queue(&self) -> RwLockWriteGuard<'_, PatientQueue> {
        self.queue.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
