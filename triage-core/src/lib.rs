//! Triage queue core: patient records, urgency ordering, rule-based
//! classification, synthetic patient generation, the store seam with its
//! SQLite implementation, the live queue, and simulation mode.

pub mod error;
pub mod generator;
pub mod ordering;
pub mod patients;
pub mod queue;
pub mod rules;
pub mod simulation;
pub mod sqlite;
pub mod store;
pub mod streams;

pub use error::StoreError;
pub use patients::{NewPatient, PatientRecord, TriageLevel, VitalValue, Vitals};
pub use store::PatientStore;
