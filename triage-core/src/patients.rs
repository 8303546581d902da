use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Categorical urgency label. Anything other than the three known levels is
/// kept verbatim and sorts last.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum TriageLevel {
    Critical,
    Urgent,
    Stable,
    Unrecognized(String),
}

impl TriageLevel {
    pub fn priority(&self) -> u8 {
        match self {
            TriageLevel::Critical => 3,
            TriageLevel::Urgent => 2,
            TriageLevel::Stable => 1,
            TriageLevel::Unrecognized(_) => 0,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TriageLevel::Critical => "Critical",
            TriageLevel::Urgent => "Urgent",
            TriageLevel::Stable => "Stable",
            TriageLevel::Unrecognized(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, TriageLevel::Unrecognized(_))
    }
}

impl Default for TriageLevel {
    fn default() -> Self {
        TriageLevel::Unrecognized(String::new())
    }
}

impl From<&str> for TriageLevel {
    fn from(value: &str) -> Self {
        match value {
            "Critical" => TriageLevel::Critical,
            "Urgent" => TriageLevel::Urgent,
            "Stable" => TriageLevel::Stable,
            other => TriageLevel::Unrecognized(other.to_string()),
        }
    }
}

impl From<String> for TriageLevel {
    fn from(value: String) -> Self {
        match TriageLevel::from(value.as_str()) {
            TriageLevel::Unrecognized(_) => TriageLevel::Unrecognized(value),
            known => known,
        }
    }
}

impl From<Option<String>> for TriageLevel {
    fn from(value: Option<String>) -> Self {
        value.map(TriageLevel::from).unwrap_or_default()
    }
}

impl From<TriageLevel> for String {
    fn from(level: TriageLevel) -> Self {
        match level {
            TriageLevel::Unrecognized(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for TriageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VitalValue {
    Number(f64),
    Text(String),
}

impl VitalValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            VitalValue::Number(n) => Some(*n),
            VitalValue::Text(t) => t.trim().parse().ok(),
        }
    }
}

impl From<f64> for VitalValue {
    fn from(value: f64) -> Self {
        VitalValue::Number(value)
    }
}

impl From<u32> for VitalValue {
    fn from(value: u32) -> Self {
        VitalValue::Number(f64::from(value))
    }
}

impl From<&str> for VitalValue {
    fn from(value: &str) -> Self {
        VitalValue::Text(value.to_string())
    }
}

impl From<String> for VitalValue {
    fn from(value: String) -> Self {
        VitalValue::Text(value)
    }
}

impl fmt::Display for VitalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VitalValue::Number(n) => write!(f, "{n}"),
            VitalValue::Text(t) => f.write_str(t),
        }
    }
}

/// Vital-sign name to value. Keys iterate in name order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vitals(BTreeMap<String, VitalValue>);

impl Vitals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<VitalValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<VitalValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&VitalValue> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &VitalValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn spo2(&self) -> Option<f64> {
        self.get("spo2").and_then(VitalValue::as_f64)
    }

    /// Systolic pressure from `blood_pressure` ("S/D" or a bare number),
    /// falling back to `systolic_bp`.
    pub fn systolic_bp(&self) -> Option<f64> {
        let from_bp = self.get("blood_pressure").and_then(|bp| match bp {
            VitalValue::Number(n) => Some(*n),
            VitalValue::Text(t) => t.split('/').next().and_then(|s| s.trim().parse().ok()),
        });
        from_bp.or_else(|| self.get("systolic_bp").and_then(VitalValue::as_f64))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub id: String,
    pub arrival_time: DateTime<Utc>,
    #[serde(default)]
    pub triage_level: TriageLevel,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub vitals: Option<Vitals>,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// A patient as submitted to the store, before it has an id and arrival time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NewPatient {
    #[serde(default)]
    pub triage_level: TriageLevel,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub vitals: Option<Vitals>,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl NewPatient {
    pub fn into_record(self, id: String, arrival_time: DateTime<Utc>) -> PatientRecord {
        PatientRecord {
            id,
            arrival_time,
            triage_level: self.triage_level,
            symptoms: self.symptoms,
            vitals: self.vitals,
            explanation: self.explanation,
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Vec<String>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triage_level_keeps_unrecognized_values() {
        let level: TriageLevel = serde_json::from_str("\"Resus\"").expect("level");
        assert_eq!(level, TriageLevel::Unrecognized("Resus".into()));
        assert_eq!(level.priority(), 0);
        assert_eq!(serde_json::to_string(&level).expect("json"), "\"Resus\"");

        let null: TriageLevel = serde_json::from_str("null").expect("null level");
        assert_eq!(null, TriageLevel::default());
    }

    #[test]
    fn record_tolerates_missing_and_null_fields() {
        let record: PatientRecord = serde_json::from_value(serde_json::json!({
            "id": "p-1",
            "arrival_time": "2024-05-01T10:00:00Z",
            "symptoms": null
        }))
        .expect("record");

        assert_eq!(record.triage_level.priority(), 0);
        assert!(record.symptoms.is_empty());
        assert!(record.vitals.is_none());
    }

    #[test]
    fn systolic_is_read_from_blood_pressure_text() {
        let vitals = Vitals::new().with("blood_pressure", "185/95").with("spo2", 97u32);
        assert_eq!(vitals.systolic_bp(), Some(185.0));
        assert_eq!(vitals.spo2(), Some(97.0));

        let fallback = Vitals::new().with("systolic_bp", "150");
        assert_eq!(fallback.systolic_bp(), Some(150.0));
        assert_eq!(Vitals::new().systolic_bp(), None);
    }

    #[test]
    fn vital_values_render_without_trailing_zeroes() {
        assert_eq!(VitalValue::from(98u32).to_string(), "98");
        assert_eq!(VitalValue::from(98.6).to_string(), "98.6");
        assert_eq!(VitalValue::from("120/80").to_string(), "120/80");
    }
}
