use crate::error::StoreError;
use crate::patients::{NewPatient, PatientRecord};
use crate::streams::Subscription;
use async_trait::async_trait;

/// The data store the dashboard reads from and the simulator writes to.
#[async_trait]
pub trait PatientStore: Send + Sync + 'static {
    /// Every patient, most recent arrival first. Only a seed for the queue;
    /// display order is decided by [`crate::ordering::order`].
    async fn fetch_all(&self) -> Result<Vec<PatientRecord>, StoreError>;

    /// Persists a new patient. The store assigns `id` and `arrival_time`.
    async fn insert(&self, patient: NewPatient) -> Result<PatientRecord, StoreError>;

    /// Live insert/update/delete events for the patients table.
    fn subscribe(&self) -> Subscription;
}
