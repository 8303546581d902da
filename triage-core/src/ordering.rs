use crate::patients::PatientRecord;
use std::cmp::Ordering;

/// Higher triage priority first, then earliest arrival.
pub fn compare_urgency(a: &PatientRecord, b: &PatientRecord) -> Ordering {
    b.triage_level
        .priority()
        .cmp(&a.triage_level.priority())
        .then_with(|| a.arrival_time.cmp(&b.arrival_time))
}

/// Display order for the queue. The input is left untouched; ties on both
/// keys keep their input order.
pub fn order(records: &[PatientRecord]) -> Vec<PatientRecord> {
    let mut out = records.to_vec();
    out.sort_by(compare_urgency);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patients::TriageLevel;
    use chrono::{TimeZone, Utc};

    fn record(id: &str, level: &str, minute: u32) -> PatientRecord {
        PatientRecord {
            id: id.into(),
            arrival_time: Utc.with_ymd_and_hms(2024, 5, 1, 10, minute, 0).unwrap(),
            triage_level: TriageLevel::from(level),
            symptoms: Vec::new(),
            vitals: None,
            explanation: None,
        }
    }

    fn ids(records: &[PatientRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn critical_precedes_regardless_of_arrival() {
        let input = vec![
            record("stable-early", "Stable", 0),
            record("urgent-early", "Urgent", 1),
            record("critical-late", "Critical", 59),
        ];
        let out = order(&input);
        assert_eq!(ids(&out), vec!["critical-late", "urgent-early", "stable-early"]);
    }

    #[test]
    fn same_level_sorted_by_arrival() {
        let input = vec![
            record("b", "Urgent", 30),
            record("c", "Urgent", 45),
            record("a", "Urgent", 5),
        ];
        assert_eq!(ids(&order(&input)), vec!["a", "b", "c"]);
    }

    #[test]
    fn unknown_levels_sort_last_without_failing() {
        let input = vec![
            record("odd", "Resus", 0),
            record("blank", "", 1),
            record("stable", "Stable", 2),
        ];
        assert_eq!(ids(&order(&input)), vec!["stable", "odd", "blank"]);
    }

    #[test]
    fn exact_ties_keep_input_order() {
        let input = vec![
            record("first", "Stable", 10),
            record("second", "Stable", 10),
            record("third", "Stable", 10),
        ];
        assert_eq!(ids(&order(&input)), vec!["first", "second", "third"]);
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(order(&[]).is_empty());
    }

    #[test]
    fn input_is_not_reordered() {
        let input = vec![record("s", "Stable", 0), record("c", "Critical", 1)];
        let _ = order(&input);
        assert_eq!(ids(&input), vec!["s", "c"]);
    }
}
