use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VitalDto {
    pub key: String,
    pub label: String,
    pub value: String,
    pub icon: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatientCardDto {
    pub id: String,
    pub short_id: String,
    pub triage_level: String,
    pub tone: String,
    pub arrival_time: String,
    pub arrival_clock: String,
    pub symptoms: Vec<String>,
    pub extra_symptoms: Option<String>,
    pub vitals: Vec<VitalDto>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatientDetailsDto {
    pub id: String,
    pub short_id: String,
    pub triage_level: String,
    pub tone: String,
    pub arrival_time: String,
    pub arrival_display: String,
    pub symptoms: Vec<String>,
    pub vitals: Vec<VitalDto>,
    pub explanation: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CensusDto {
    pub total: usize,
    pub critical: usize,
    pub urgent: usize,
    pub stable: usize,
    pub unrecognized: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum QueueStatusDto {
    Loading,
    Ready,
    Failed(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationStatusDto {
    pub state: String,
    pub period_ms: u64,
    pub ticks: u64,
    pub inserted: u64,
    pub failed: u64,
}

impl SimulationStatusDto {
    pub fn is_running(&self) -> bool {
        self.state == "Running"
    }
}
