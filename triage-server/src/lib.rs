//! Store-side HTTP intake: manual admission and discharge of patients.

pub mod intake;
