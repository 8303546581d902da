//! Synthetic patients for simulating incoming traffic.

use crate::patients::{NewPatient, Vitals};
use crate::rules;
use rand::Rng;

pub const SYMPTOM_VOCABULARY: [&str; 8] = [
    "chest pain",
    "shortness of breath",
    "headache",
    "nausea",
    "dizziness",
    "fever",
    "abdominal pain",
    "fatigue",
];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VitalSigns {
    pub heart_rate: u32,
    pub systolic_bp: u32,
    pub diastolic_bp: u32,
    pub spo2: u32,
    /// Degrees Fahrenheit, one decimal place.
    pub temperature: f64,
    pub respiratory_rate: u32,
}

impl VitalSigns {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            heart_rate: rng.gen_range(60..120),
            systolic_bp: rng.gen_range(100..180),
            diastolic_bp: rng.gen_range(60..100),
            spo2: rng.gen_range(80..100),
            temperature: f64::from(rng.gen_range(965..=1005)) / 10.0,
            respiratory_rate: rng.gen_range(12..32),
        }
    }

    pub fn to_vitals(&self) -> Vitals {
        Vitals::new()
            .with("heart_rate", self.heart_rate)
            .with(
                "blood_pressure",
                format!("{}/{}", self.systolic_bp, self.diastolic_bp),
            )
            .with("spo2", self.spo2)
            .with("temperature", self.temperature)
            .with("respiratory_rate", self.respiratory_rate)
    }
}

/// One to three draws from the vocabulary; repeats collapse, first
/// occurrence wins.
pub fn random_symptoms<R: Rng + ?Sized>(rng: &mut R) -> Vec<String> {
    let draws = rng.gen_range(1..=3);
    let mut out: Vec<String> = Vec::with_capacity(draws);
    for _ in 0..draws {
        let pick = SYMPTOM_VOCABULARY[rng.gen_range(0..SYMPTOM_VOCABULARY.len())];
        if !out.iter().any(|s| s == pick) {
            out.push(pick.to_string());
        }
    }
    out
}

pub fn generate() -> NewPatient {
    generate_with(&mut rand::thread_rng())
}

pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> NewPatient {
    let vitals = VitalSigns::random(rng).to_vitals();
    let symptoms = random_symptoms(rng);
    let classification = rules::classify(Some(&vitals), &symptoms);

    NewPatient {
        triage_level: classification.triage_level,
        symptoms,
        vitals: Some(vitals),
        explanation: Some(classification.explanation),
    }
}
