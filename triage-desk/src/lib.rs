pub mod api;
pub mod commands;
pub mod config;
pub mod runtime;
pub mod state;

use crate::config::DeskConfig;
use crate::state::AppState;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing::info;
use triage_core::queue::QueueStatus;
use triage_core::rules;
use triage_core::sqlite::SqlitePatientStore;
use triage_core::{NewPatient, PatientStore, StoreError, Vitals};

const READY_TIMEOUT: Duration = Duration::from_secs(5);

pub fn build_state(config: &DeskConfig) -> Result<(AppState, SqlitePatientStore), StoreError> {
    let store = SqlitePatientStore::open(&config.db_path)?;
    let state = AppState::new(Arc::new(store.clone()), config.simulation_period);
    Ok((state, store))
}

/// Dashboard API and intake routes on one listener, until ctrl-c.
pub async fn serve(config: DeskConfig) -> anyhow::Result<()> {
    let (state, store) = build_state(&config)?;
    let pump = runtime::start(&state);

    if config.autostart_simulation {
        state.simulator.start();
    }

    let app = api::dashboard_router(state.clone())
        .merge(triage_server::intake::intake_router(store))
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %config.bind_addr, db = %config.db_path.display(), "triage desk listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.simulator.stop();
    pump.abort();
    info!("triage desk stopped");
    Ok(())
}

pub async fn run_demo(config: DeskConfig) -> anyhow::Result<()> {
    let (state, store) = build_state(&config)?;
    if store.fetch_all().await?.is_empty() {
        seed_demo_data(&store).await?;
    }

    let pump = runtime::start(&state);
    wait_for_queue(&state).await?;

    let cards = commands::list_patients(&state).map_err(anyhow::Error::msg)?;
    println!("patients:\n{}", serde_json::to_string_pretty(&cards)?);
    println!(
        "census:\n{}",
        serde_json::to_string_pretty(&commands::get_census(&state))?
    );

    pump.abort();
    Ok(())
}

async fn wait_for_queue(state: &AppState) -> anyhow::Result<()> {
    let deadline = tokio::time::Instant::now() + READY_TIMEOUT;
    loop {
        match commands::get_status(state) {
            QueueStatus::Ready => return Ok(()),
            QueueStatus::Failed(message) => anyhow::bail!("patient queue failed: {message}"),
            QueueStatus::Loading if tokio::time::Instant::now() >= deadline => {
                anyhow::bail!("patient queue still loading after {READY_TIMEOUT:?}")
            }
            QueueStatus::Loading => tokio::time::sleep(Duration::from_millis(20)).await,
        }
    }
}

pub async fn seed_demo_data(store: &SqlitePatientStore) -> Result<(), StoreError> {
    let arrivals = [
        (
            Vitals::new()
                .with("heart_rate", 88u32)
                .with("blood_pressure", "124/80")
                .with("spo2", 98u32)
                .with("temperature", 98.4),
            vec!["headache".to_string(), "nausea".to_string()],
        ),
        (
            Vitals::new()
                .with("heart_rate", 112u32)
                .with("blood_pressure", "150/95")
                .with("spo2", 95u32)
                .with("respiratory_rate", 22u32),
            vec!["chest pain".to_string(), "shortness of breath".to_string()],
        ),
        (
            Vitals::new()
                .with("heart_rate", 118u32)
                .with("blood_pressure", "186/110")
                .with("spo2", 87u32)
                .with("temperature", 101.1),
            vec!["dizziness".to_string(), "fatigue".to_string(), "fever".to_string()],
        ),
    ];

    for (vitals, symptoms) in arrivals {
        let classification = rules::classify(Some(&vitals), &symptoms);
        store
            .insert(NewPatient {
                triage_level: classification.triage_level,
                symptoms,
                vitals: Some(vitals),
                explanation: Some(classification.explanation),
            })
            .await?;
    }
    info!("demo patients seeded");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_core::TriageLevel;

    fn config(dir: &tempfile::TempDir) -> DeskConfig {
        DeskConfig {
            db_path: dir.path().join("desk.db"),
            ..DeskConfig::default()
        }
    }

    #[tokio::test]
    async fn demo_seed_covers_every_level() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (_state, store) = build_state(&config(&dir)).expect("state");
        seed_demo_data(&store).await.expect("seed");

        let mut levels: Vec<_> = store
            .fetch_all()
            .await
            .expect("fetch")
            .into_iter()
            .map(|r| r.triage_level)
            .collect();
        levels.sort_by_key(TriageLevel::priority);
        assert_eq!(
            levels,
            vec![TriageLevel::Stable, TriageLevel::Urgent, TriageLevel::Critical]
        );
    }

    #[tokio::test]
    async fn runtime_loads_seeded_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (state, store) = build_state(&config(&dir)).expect("state");
        seed_demo_data(&store).await.expect("seed");

        let pump = runtime::start(&state);
        wait_for_queue(&state).await.expect("ready");

        let cards = commands::list_patients(&state).expect("cards");
        assert_eq!(cards.len(), 3);
        assert_eq!(cards[0].triage_level, "Critical");
        pump.abort();
    }
}
