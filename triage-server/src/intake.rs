use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use patient_registry::{validate_patient_v1, CanonicalPatientV1, PATIENT_SCHEMA_V1};
use tracing::{error, info, warn};
use triage_core::rules;
use triage_core::sqlite::SqlitePatientStore;
use triage_core::{NewPatient, PatientRecord, PatientStore, StoreError, TriageLevel, VitalValue, Vitals};

pub trait IntakeAdapter: Send + Sync + 'static {
    fn parse(&self, payload: &serde_json::Value) -> Result<CanonicalPatientV1, String>;
}

/// Flat JSON admissions. Accepts snake_case or camelCase keys, and symptoms
/// either as an array or as one comma-separated string.
pub struct GenericAdapter;

impl IntakeAdapter for GenericAdapter {
    fn parse(&self, payload: &serde_json::Value) -> Result<CanonicalPatientV1, String> {
        if !payload.is_object() {
            return Err("admission payload must be a JSON object".into());
        }

        let symptoms = match payload.get("symptoms") {
            None | Some(serde_json::Value::Null) => Vec::new(),
            Some(serde_json::Value::String(joined)) => joined
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
                .collect(),
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .map(|v| {
                    v.as_str()
                        .map(|s| s.trim().to_string())
                        .ok_or_else(|| "symptoms must be strings".to_string())
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => return Err("symptoms must be a list or a comma-separated string".into()),
        };

        let vitals = match payload.get("vitals") {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::Object(map)) => Some(map.clone()),
            Some(_) => return Err("vitals must be an object".into()),
        };

        Ok(CanonicalPatientV1 {
            schema: payload
                .get("schema")
                .and_then(serde_json::Value::as_str)
                .unwrap_or(PATIENT_SCHEMA_V1)
                .to_string(),
            triage_level: payload
                .get("triage_level")
                .or_else(|| payload.get("triageLevel"))
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .trim()
                .to_string(),
            symptoms,
            vitals,
            explanation: payload
                .get("explanation")
                .and_then(serde_json::Value::as_str)
                .map(ToString::to_string),
            source: payload
                .get("source")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("manual")
                .to_string(),
        })
    }
}

pub fn intake_router(store: SqlitePatientStore) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/intake/patients", post(admit))
        .route("/intake/patients/:id", delete(discharge))
        .with_state(store)
}

pub fn parse_admission(payload: &serde_json::Value) -> Result<NewPatient, String> {
    parse_with_adapter(payload, GenericAdapter)
}

fn parse_with_adapter(
    payload: &serde_json::Value,
    adapter: impl IntakeAdapter,
) -> Result<NewPatient, String> {
    let canonical = adapter.parse(payload)?;
    validate_patient_v1(&canonical).map_err(|e| e.to_string())?;
    Ok(to_new_patient(canonical))
}

/// Admissions without a triage level are classified from their vitals and
/// symptoms; the caller's explanation, if any, is kept.
fn to_new_patient(canonical: CanonicalPatientV1) -> NewPatient {
    let vitals = canonical.vitals.map(|map| {
        let mut vitals = Vitals::new();
        for (name, value) in map {
            match value {
                serde_json::Value::Number(n) => {
                    if let Some(n) = n.as_f64() {
                        vitals.insert(name, VitalValue::Number(n));
                    }
                }
                serde_json::Value::String(s) => vitals.insert(name, VitalValue::Text(s)),
                _ => {}
            }
        }
        vitals
    });

    let (triage_level, explanation) = if canonical.triage_level.is_empty() {
        let classification = rules::classify(vitals.as_ref(), &canonical.symptoms);
        (
            classification.triage_level,
            canonical.explanation.or(Some(classification.explanation)),
        )
    } else {
        (TriageLevel::from(canonical.triage_level), canonical.explanation)
    };

    NewPatient {
        triage_level,
        symptoms: canonical.symptoms,
        vitals,
        explanation,
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn admit(
    State(store): State<SqlitePatientStore>,
    Json(payload): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<PatientRecord>), (StatusCode, String)> {
    let patient = parse_admission(&payload).map_err(|reason| {
        warn!(%reason, "rejected admission");
        (StatusCode::BAD_REQUEST, reason)
    })?;

    match store.insert(patient).await {
        Ok(record) => {
            info!(id = %record.id, level = %record.triage_level, "patient admitted");
            Ok((StatusCode::CREATED, Json(record)))
        }
        Err(err) => {
            error!(error = %err, "failed to store admission");
            Err((StatusCode::SERVICE_UNAVAILABLE, err.to_string()))
        }
    }
}

async fn discharge(
    State(store): State<SqlitePatientStore>,
    Path(id): Path<String>,
) -> StatusCode {
    match store.delete(&id).await {
        Ok(_) => {
            info!(%id, "patient discharged");
            StatusCode::NO_CONTENT
        }
        Err(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
        Err(err) => {
            error!(error = %err, %id, "failed to discharge patient");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;
    use triage_core::rules::{CRITICAL_EXPLANATION, URGENT_EXPLANATION};

    fn open_store() -> (tempfile::TempDir, SqlitePatientStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SqlitePatientStore::open(dir.path().join("intake.db")).expect("open");
        (dir, store)
    }

    #[test]
    fn unleveled_admission_is_classified() {
        let patient = parse_admission(&serde_json::json!({
            "symptoms": "chest pain, nausea",
            "vitals": {"spo2": 96, "blood_pressure": "130/85"}
        }))
        .expect("parse");

        assert_eq!(patient.symptoms, vec!["chest pain", "nausea"]);
        assert_eq!(patient.triage_level, TriageLevel::Urgent);
        assert_eq!(patient.explanation.as_deref(), Some(URGENT_EXPLANATION));
    }

    #[test]
    fn camel_case_level_is_taken_as_given() {
        let patient = parse_admission(&serde_json::json!({
            "triageLevel": "Stable",
            "symptoms": ["chest pain"],
            "explanation": "seen by triage nurse"
        }))
        .expect("parse");

        assert_eq!(patient.triage_level, TriageLevel::Stable);
        assert_eq!(patient.explanation.as_deref(), Some("seen by triage nurse"));
    }

    #[test]
    fn rejects_invalid_payloads() {
        assert!(parse_admission(&serde_json::json!(["not", "an", "object"])).is_err());
        assert!(parse_admission(&serde_json::json!({"symptoms": [1, 2]})).is_err());
        assert!(parse_admission(&serde_json::json!({"triage_level": "Resus"})).is_err());
        assert!(parse_admission(&serde_json::json!({"schema": "alert.v1"})).is_err());
        assert!(parse_admission(&serde_json::json!({"vitals": {"bp": [120, 80]}})).is_err());
    }

    #[tokio::test]
    async fn admit_route_stores_and_publishes() {
        let (_dir, store) = open_store();
        let mut feed = store.subscribe();
        let app = intake_router(store.clone());

        let response = app
            .oneshot(
                Request::post("/intake/patients")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::json!({"vitals": {"spo2": 84}, "symptoms": ["dizziness"]})
                            .to_string(),
                    ))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::CREATED);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let record: PatientRecord = serde_json::from_slice(&bytes).expect("record json");
        assert_eq!(record.triage_level, TriageLevel::Critical);
        assert_eq!(record.explanation.as_deref(), Some(CRITICAL_EXPLANATION));

        let event = feed.recv().await.expect("insert event");
        assert_eq!(event.record().id, record.id);
    }

    #[tokio::test]
    async fn admit_route_rejects_bad_level() {
        let (_dir, store) = open_store();
        let response = intake_router(store)
            .oneshot(
                Request::post("/intake/patients")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"triage_level":"Whenever"}"#))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn discharge_route_removes_patient() {
        let (_dir, store) = open_store();
        let record = store
            .insert(NewPatient {
                triage_level: TriageLevel::Stable,
                ..NewPatient::default()
            })
            .await
            .expect("insert");
        let app = intake_router(store.clone());

        let uri = format!("/intake/patients/{}", record.id);
        let first = app
            .clone()
            .oneshot(Request::delete(uri.as_str()).body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(first.status(), StatusCode::NO_CONTENT);

        let second = app
            .oneshot(Request::delete(uri.as_str()).body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(second.status(), StatusCode::NOT_FOUND);
    }
}
