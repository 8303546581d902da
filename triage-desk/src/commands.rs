use crate::state::AppState;
use serde::{Deserialize, Serialize};
use triage_core::queue::{Census, QueueStatus};
use triage_core::simulation::SimulationStatus;
use triage_core::{PatientRecord, TriageLevel, Vitals};

const CARD_SYMPTOMS: usize = 3;
const CARD_VITALS: usize = 4;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VitalDto {
    pub key: String,
    pub label: String,
    pub value: String,
    pub icon: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
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

#[derive(Clone, Debug, Serialize, Deserialize)]
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

/// Cards in triage order. Fails with the fetch error when the queue could
/// not be loaded.
pub fn list_patients(state: &AppState) -> Result<Vec<PatientCardDto>, String> {
    let queue = state.read_queue();
    if let QueueStatus::Failed(message) = queue.status() {
        return Err(message.clone());
    }
    Ok(queue.ordered().iter().map(to_card).collect())
}

pub fn get_patient(state: &AppState, id: &str) -> Option<PatientDetailsDto> {
    state.read_queue().get(id).map(to_details)
}

pub fn get_census(state: &AppState) -> Census {
    state.read_queue().census()
}

pub fn get_status(state: &AppState) -> QueueStatus {
    state.read_queue().status().clone()
}

pub fn start_simulation(state: &AppState) -> SimulationStatus {
    state.simulator.start();
    state.simulator.status()
}

pub fn stop_simulation(state: &AppState) -> SimulationStatus {
    state.simulator.stop();
    state.simulator.status()
}

pub fn simulation_status(state: &AppState) -> SimulationStatus {
    state.simulator.status()
}

fn to_card(record: &PatientRecord) -> PatientCardDto {
    let extra = record.symptoms.len().saturating_sub(CARD_SYMPTOMS);
    PatientCardDto {
        id: record.id.clone(),
        short_id: short_id(&record.id),
        triage_level: record.triage_level.as_str().to_string(),
        tone: tone(&record.triage_level).to_string(),
        arrival_time: record.arrival_time.to_rfc3339(),
        arrival_clock: record.arrival_time.format("%H:%M").to_string(),
        symptoms: record.symptoms.iter().take(CARD_SYMPTOMS).cloned().collect(),
        extra_symptoms: (extra > 0).then(|| format!("+{extra} more")),
        vitals: vitals_dto(record.vitals.as_ref(), CARD_VITALS),
    }
}

fn to_details(record: &PatientRecord) -> PatientDetailsDto {
    PatientDetailsDto {
        id: record.id.clone(),
        short_id: short_id(&record.id),
        triage_level: record.triage_level.as_str().to_string(),
        tone: tone(&record.triage_level).to_string(),
        arrival_time: record.arrival_time.to_rfc3339(),
        arrival_display: record
            .arrival_time
            .format("%a, %b %-d, %Y, %H:%M")
            .to_string(),
        symptoms: record.symptoms.clone(),
        vitals: vitals_dto(record.vitals.as_ref(), usize::MAX),
        explanation: record.explanation.clone(),
    }
}

fn vitals_dto(vitals: Option<&Vitals>, limit: usize) -> Vec<VitalDto> {
    let Some(vitals) = vitals else {
        return Vec::new();
    };
    vitals
        .iter()
        .take(limit)
        .map(|(key, value)| VitalDto {
            key: key.to_string(),
            label: vital_label(key),
            value: value.to_string(),
            icon: vital_icon(key).to_string(),
        })
        .collect()
}

/// Last eight characters, uppercased.
pub fn short_id(id: &str) -> String {
    let chars: Vec<char> = id.chars().collect();
    let start = chars.len().saturating_sub(8);
    chars[start..].iter().collect::<String>().to_uppercase()
}

/// `heart_rate` → `Heart Rate`.
pub fn vital_label(key: &str) -> String {
    key.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn vital_icon(key: &str) -> &'static str {
    match key.to_lowercase().as_str() {
        "heart_rate" | "pulse" => "heart",
        "temperature" | "temp" => "thermometer",
        "blood_pressure" | "bp" => "droplets",
        "respiratory_rate" | "respiration" => "wind",
        _ => "activity",
    }
}

pub fn tone(level: &TriageLevel) -> &'static str {
    match level {
        TriageLevel::Critical => "critical",
        TriageLevel::Urgent => "urgent",
        TriageLevel::Stable => "stable",
        TriageLevel::Unrecognized(_) => "neutral",
    }
}
