use crate::patients::{TriageLevel, Vitals};
use serde::{Deserialize, Serialize};

pub const CRITICAL_EXPLANATION: &str = "Critically low spO2 or high blood pressure.";
pub const URGENT_EXPLANATION: &str = "Patient is reporting chest pain.";
pub const STABLE_EXPLANATION: &str = "Vital signs and symptoms are stable.";

pub const SPO2_CRITICAL_BELOW: f64 = 90.0;
pub const SYSTOLIC_CRITICAL_ABOVE: f64 = 180.0;
const CHEST_PAIN: &str = "chest pain";

/// Which rule of the decision list fired. Rules are tried in declaration
/// order and the first match wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriageRule {
    HypoxiaOrHypertension,
    ChestPain,
    Baseline,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub triage_level: TriageLevel,
    pub explanation: String,
}

pub fn detect_rule(vitals: Option<&Vitals>, symptoms: &[String]) -> TriageRule {
    let spo2_low = vitals
        .and_then(Vitals::spo2)
        .is_some_and(|v| v < SPO2_CRITICAL_BELOW);
    let systolic_high = vitals
        .and_then(Vitals::systolic_bp)
        .is_some_and(|v| v > SYSTOLIC_CRITICAL_ABOVE);

    if spo2_low || systolic_high {
        TriageRule::HypoxiaOrHypertension
    } else if symptoms
        .iter()
        .any(|s| s.trim().eq_ignore_ascii_case(CHEST_PAIN))
    {
        TriageRule::ChestPain
    } else {
        TriageRule::Baseline
    }
}

pub fn classify(vitals: Option<&Vitals>, symptoms: &[String]) -> Classification {
    let (triage_level, explanation) = match detect_rule(vitals, symptoms) {
        TriageRule::HypoxiaOrHypertension => (TriageLevel::Critical, CRITICAL_EXPLANATION),
        TriageRule::ChestPain => (TriageLevel::Urgent, URGENT_EXPLANATION),
        TriageRule::Baseline => (TriageLevel::Stable, STABLE_EXPLANATION),
    };
    Classification {
        triage_level,
        explanation: explanation.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vitals(spo2: u32, systolic: u32) -> Vitals {
        Vitals::new()
            .with("spo2", spo2)
            .with("blood_pressure", format!("{systolic}/80"))
    }

    fn symptoms(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn low_spo2_preempts_chest_pain() {
        let out = classify(Some(&vitals(85, 120)), &symptoms(&["chest pain"]));
        assert_eq!(out.triage_level, TriageLevel::Critical);
        assert_eq!(out.explanation, CRITICAL_EXPLANATION);
    }

    #[test]
    fn high_systolic_is_critical() {
        let out = classify(Some(&vitals(98, 181)), &symptoms(&["headache"]));
        assert_eq!(out.triage_level, TriageLevel::Critical);
    }

    #[test]
    fn thresholds_are_strict() {
        let out = classify(Some(&vitals(90, 180)), &symptoms(&["headache"]));
        assert_eq!(out.triage_level, TriageLevel::Stable);
    }

    #[test]
    fn chest_pain_is_urgent() {
        let out = classify(Some(&vitals(95, 120)), &symptoms(&["chest pain"]));
        assert_eq!(out.triage_level, TriageLevel::Urgent);
        assert_eq!(out.explanation, URGENT_EXPLANATION);

        let shouted = classify(Some(&vitals(95, 120)), &symptoms(&[" Chest Pain "]));
        assert_eq!(shouted.triage_level, TriageLevel::Urgent);
    }

    #[test]
    fn otherwise_stable() {
        let out = classify(Some(&vitals(97, 110)), &symptoms(&["headache"]));
        assert_eq!(out.triage_level, TriageLevel::Stable);
        assert_eq!(out.explanation, STABLE_EXPLANATION);
    }

    #[test]
    fn missing_vitals_fall_through_to_symptoms() {
        assert_eq!(detect_rule(None, &symptoms(&["chest pain"])), TriageRule::ChestPain);
        assert_eq!(detect_rule(None, &[]), TriageRule::Baseline);
    }
}
