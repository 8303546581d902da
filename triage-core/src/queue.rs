use crate::ordering;
use crate::patients::{PatientRecord, TriageLevel};
use crate::streams::ChangeEvent;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum QueueStatus {
    Loading,
    Ready,
    Failed(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Census {
    pub total: usize,
    pub critical: usize,
    pub urgent: usize,
    pub stable: usize,
    pub unrecognized: usize,
}

impl Census {
    pub fn tally<'a>(records: impl IntoIterator<Item = &'a PatientRecord>) -> Self {
        let mut census = Census::default();
        for record in records {
            census.total += 1;
            match record.triage_level {
                TriageLevel::Critical => census.critical += 1,
                TriageLevel::Urgent => census.urgent += 1,
                TriageLevel::Stable => census.stable += 1,
                TriageLevel::Unrecognized(_) => census.unrecognized += 1,
            }
        }
        census
    }
}

/// The locally held view of the patients table. Only seeding and change
/// events mutate it.
#[derive(Clone, Debug)]
pub struct PatientQueue {
    records: Vec<PatientRecord>,
    status: QueueStatus,
}

impl Default for PatientQueue {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            status: QueueStatus::Loading,
        }
    }
}

impl PatientQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the collection with the result of the initial query. Later
    /// duplicates of an id are dropped.
    pub fn seed(&mut self, records: Vec<PatientRecord>) {
        self.records.clear();
        for record in records {
            if self.position(&record.id).is_none() {
                self.records.push(record);
            }
        }
        self.status = QueueStatus::Ready;
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = QueueStatus::Failed(message.into());
    }

    /// Applies one change event. Returns whether the collection changed.
    pub fn apply(&mut self, event: ChangeEvent) -> bool {
        match event {
            ChangeEvent::Insert(record) => {
                match self.position(&record.id) {
                    Some(idx) => self.records[idx] = record,
                    None => self.records.push(record),
                }
                true
            }
            ChangeEvent::Update(record) => match self.position(&record.id) {
                Some(idx) => {
                    self.records[idx] = record;
                    true
                }
                None => false,
            },
            ChangeEvent::Delete(record) => match self.position(&record.id) {
                Some(idx) => {
                    self.records.remove(idx);
                    true
                }
                None => false,
            },
        }
    }

    pub fn ordered(&self) -> Vec<PatientRecord> {
        ordering::order(&self.records)
    }

    pub fn census(&self) -> Census {
        Census::tally(&self.records)
    }

    pub fn get(&self, id: &str) -> Option<&PatientRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn status(&self) -> &QueueStatus {
        &self.status
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(id: &str, level: TriageLevel, minute: u32) -> PatientRecord {
        PatientRecord {
            id: id.into(),
            arrival_time: Utc.with_ymd_and_hms(2024, 5, 1, 9, minute, 0).unwrap(),
            triage_level: level,
            symptoms: vec!["fatigue".into()],
            vitals: None,
            explanation: None,
        }
    }

    #[test]
    fn starts_loading_and_seed_marks_ready() {
        let mut queue = PatientQueue::new();
        assert_eq!(queue.status(), &QueueStatus::Loading);

        queue.seed(vec![
            record("a", TriageLevel::Stable, 1),
            record("a", TriageLevel::Urgent, 2),
        ]);
        assert_eq!(queue.status(), &QueueStatus::Ready);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.get("a").map(|r| r.triage_level.clone()), Some(TriageLevel::Stable));
    }

    #[test]
    fn fetch_failure_is_surfaced() {
        let mut queue = PatientQueue::new();
        queue.fail("connection refused");
        assert_eq!(queue.status(), &QueueStatus::Failed("connection refused".into()));
        assert!(queue.is_empty());
    }

    #[test]
    fn insert_appends_and_duplicate_insert_replaces() {
        let mut queue = PatientQueue::new();
        queue.seed(vec![record("a", TriageLevel::Stable, 1)]);

        assert!(queue.apply(ChangeEvent::Insert(record("b", TriageLevel::Urgent, 2))));
        assert!(queue.apply(ChangeEvent::Insert(record("a", TriageLevel::Critical, 1))));

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.get("a").map(|r| r.triage_level.clone()), Some(TriageLevel::Critical));
    }

    #[test]
    fn update_replaces_in_place_and_ignores_unknown_ids() {
        let mut queue = PatientQueue::new();
        queue.seed(vec![record("a", TriageLevel::Stable, 1)]);

        assert!(queue.apply(ChangeEvent::Update(record("a", TriageLevel::Urgent, 1))));
        assert!(!queue.apply(ChangeEvent::Update(record("zzz", TriageLevel::Urgent, 1))));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.census().urgent, 1);
    }

    #[test]
    fn delete_removes_by_id() {
        let mut queue = PatientQueue::new();
        queue.seed(vec![
            record("a", TriageLevel::Stable, 1),
            record("b", TriageLevel::Stable, 2),
        ]);
        assert!(queue.apply(ChangeEvent::Delete(record("a", TriageLevel::Stable, 1))));
        assert!(!queue.apply(ChangeEvent::Delete(record("a", TriageLevel::Stable, 1))));
        assert_eq!(queue.ordered().iter().map(|r| r.id.as_str()).collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn ordered_view_and_census() {
        let mut queue = PatientQueue::new();
        queue.seed(vec![
            record("late-critical", TriageLevel::Critical, 40),
            record("stable", TriageLevel::Stable, 0),
            record("odd", TriageLevel::Unrecognized("Resus".into()), 0),
            record("early-critical", TriageLevel::Critical, 10),
        ]);

        let order: Vec<_> = queue.ordered().into_iter().map(|r| r.id).collect();
        assert_eq!(order, vec!["early-critical", "late-critical", "stable", "odd"]);
        assert_eq!(
            queue.census(),
            Census {
                total: 4,
                critical: 2,
                urgent: 0,
                stable: 1,
                unrecognized: 1,
            }
        );
    }
}
