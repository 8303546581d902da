use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const PATIENT_SCHEMA_V1: &str = "patient.v1";

/// Triage levels a caller may assign at intake. An empty level means
/// "classify from vitals and symptoms".
pub const KNOWN_TRIAGE_LEVELS: [&str; 3] = ["Critical", "Urgent", "Stable"];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanonicalPatientV1 {
    pub schema: String,
    #[serde(default)]
    pub triage_level: String,
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub vitals: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub explanation: Option<String>,
    pub source: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unsupported schema '{0}'")]
    UnsupportedSchema(String),
    #[error("symptom #{0} is blank")]
    BlankSymptom(usize),
    #[error("invalid triage level '{0}'")]
    InvalidTriageLevel(String),
    #[error("vital '{0}' must be a number or text")]
    InvalidVital(String),
    #[error("vital name is blank")]
    BlankVitalName,
}

pub fn validate_patient_v1(patient: &CanonicalPatientV1) -> Result<(), RegistryError> {
    if patient.schema != PATIENT_SCHEMA_V1 {
        return Err(RegistryError::UnsupportedSchema(patient.schema.clone()));
    }
    if let Some(idx) = patient.symptoms.iter().position(|s| s.trim().is_empty()) {
        return Err(RegistryError::BlankSymptom(idx));
    }

    let level = patient.triage_level.trim();
    if !level.is_empty() && !KNOWN_TRIAGE_LEVELS.contains(&level) {
        return Err(RegistryError::InvalidTriageLevel(level.to_string()));
    }

    if let Some(vitals) = &patient.vitals {
        for (name, value) in vitals {
            if name.trim().is_empty() {
                return Err(RegistryError::BlankVitalName);
            }
            match value {
                serde_json::Value::Number(_) => {}
                serde_json::Value::String(s) if !s.trim().is_empty() => {}
                _ => return Err(RegistryError::InvalidVital(name.clone())),
            }
        }
    }
    Ok(())
}
