use crate::error::StoreError;
use crate::patients::{NewPatient, PatientRecord, TriageLevel, Vitals};
use crate::store::PatientStore;
use crate::streams::{ChangeEvent, ChangeFeed, Subscription};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const SELECT_PATIENTS: &str =
    "SELECT id, arrival_time, triage_level, symptoms, vitals, explanation FROM patients";

/// SQLite-backed patient table with an in-process change feed. Every write
/// made through this handle (or its clones) is published to subscribers.
#[derive(Clone)]
pub struct SqlitePatientStore {
    db_path: Arc<PathBuf>,
    feed: ChangeFeed,
}

impl SqlitePatientStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_path = path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(&db_path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            CREATE TABLE IF NOT EXISTS patients (
                id TEXT PRIMARY KEY,
                arrival_time TEXT NOT NULL,
                triage_level TEXT NOT NULL,
                symptoms TEXT NOT NULL,
                vitals TEXT,
                explanation TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_patients_arrival ON patients(arrival_time);
            ",
        )?;

        info!(path = %db_path.display(), "patient store ready");
        Ok(Self {
            db_path: Arc::new(db_path),
            feed: ChangeFeed::default(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    pub async fn get(&self, id: &str) -> Result<Option<PatientRecord>, StoreError> {
        let id = id.to_string();
        self.with_connection(move |conn| select_one(conn, &id)).await
    }

    /// Rewrites the mutable fields of an existing patient. `id` and
    /// `arrival_time` are never changed.
    pub async fn update(&self, record: PatientRecord) -> Result<PatientRecord, StoreError> {
        let updated = self
            .with_connection(move |conn| {
                let symptoms = serde_json::to_string(&record.symptoms)?;
                let vitals = record.vitals.as_ref().map(serde_json::to_string).transpose()?;
                let changed = conn.execute(
                    "UPDATE patients
                     SET triage_level = ?1, symptoms = ?2, vitals = ?3, explanation = ?4
                     WHERE id = ?5",
                    params![
                        record.triage_level.as_str(),
                        symptoms,
                        vitals,
                        record.explanation,
                        record.id,
                    ],
                )?;
                if changed == 0 {
                    return Err(StoreError::NotFound(record.id));
                }
                select_one(conn, &record.id)?.ok_or(StoreError::NotFound(record.id))
            })
            .await?;

        debug!(id = %updated.id, level = %updated.triage_level, "patient updated");
        self.feed.publish(ChangeEvent::Update(updated.clone()));
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<PatientRecord, StoreError> {
        let id = id.to_string();
        let removed = self
            .with_connection(move |conn| {
                let Some(existing) = select_one(conn, &id)? else {
                    return Err(StoreError::NotFound(id));
                };
                conn.execute("DELETE FROM patients WHERE id = ?1", params![id])?;
                Ok(existing)
            })
            .await?;

        debug!(id = %removed.id, "patient deleted");
        self.feed.publish(ChangeEvent::Delete(removed.clone()));
        Ok(removed)
    }

    async fn with_connection<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let db_path = Arc::clone(&self.db_path);
        tokio::task::spawn_blocking(move || {
            let conn = Connection::open(&*db_path)?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

#[async_trait]
impl PatientStore for SqlitePatientStore {
    async fn fetch_all(&self) -> Result<Vec<PatientRecord>, StoreError> {
        self.with_connection(|conn| {
            let mut stmt =
                conn.prepare(&format!("{SELECT_PATIENTS} ORDER BY arrival_time DESC, id ASC"))?;
            let rows = stmt.query_map([], map_row)?;

            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })
        .await
    }

    async fn insert(&self, patient: NewPatient) -> Result<PatientRecord, StoreError> {
        let record = patient.into_record(
            uuid::Uuid::new_v4().to_string(),
            Utc::now().trunc_subsecs(6),
        );

        let row = record.clone();
        self.with_connection(move |conn| {
            let symptoms = serde_json::to_string(&row.symptoms)?;
            let vitals = row.vitals.as_ref().map(serde_json::to_string).transpose()?;
            conn.execute(
                "INSERT INTO patients (id, arrival_time, triage_level, symptoms, vitals, explanation)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    row.id,
                    format_timestamp(&row.arrival_time),
                    row.triage_level.as_str(),
                    symptoms,
                    vitals,
                    row.explanation,
                ],
            )?;
            Ok(())
        })
        .await?;

        debug!(id = %record.id, level = %record.triage_level, "patient inserted");
        self.feed.publish(ChangeEvent::Insert(record.clone()));
        Ok(record)
    }

    fn subscribe(&self) -> Subscription {
        self.feed.subscribe()
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn select_one(conn: &Connection, id: &str) -> Result<Option<PatientRecord>, StoreError> {
    conn.query_row(&format!("{SELECT_PATIENTS} WHERE id = ?1"), params![id], map_row)
        .optional()
        .map_err(StoreError::from)
}

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PatientRecord> {
    let arrival_str: String = row.get(1)?;
    let level_str: String = row.get(2)?;
    let symptoms_str: String = row.get(3)?;
    let vitals_str: Option<String> = row.get(4)?;

    let arrival_time = DateTime::parse_from_rfc3339(&arrival_str)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(err))
        })?;

    let symptoms: Vec<String> = serde_json::from_str(&symptoms_str).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(err))
    })?;

    let vitals = vitals_str
        .map(|s| {
            serde_json::from_str::<Vitals>(&s).map_err(|err| {
                rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(err))
            })
        })
        .transpose()?;

    Ok(PatientRecord {
        id: row.get(0)?,
        arrival_time,
        triage_level: TriageLevel::from(level_str),
        symptoms,
        vitals,
        explanation: row.get(5)?,
    })
}
