use crate::commands::{self, PatientCardDto, PatientDetailsDto};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use triage_core::queue::{Census, QueueStatus};
use triage_core::simulation::SimulationStatus;

pub fn dashboard_router(state: AppState) -> Router {
    Router::new()
        .route("/api/patients", get(list_patients))
        .route("/api/patients/:id", get(get_patient))
        .route("/api/census", get(census))
        .route("/api/status", get(status))
        .route("/api/simulation", get(simulation))
        .route("/api/simulation/start", post(start_simulation))
        .route("/api/simulation/stop", post(stop_simulation))
        .with_state(state)
}

async fn list_patients(
    State(state): State<AppState>,
) -> Result<Json<Vec<PatientCardDto>>, (StatusCode, String)> {
    commands::list_patients(&state)
        .map(Json)
        .map_err(|message| (StatusCode::SERVICE_UNAVAILABLE, message))
}

async fn get_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PatientDetailsDto>, StatusCode> {
    commands::get_patient(&state, &id)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn census(State(state): State<AppState>) -> Json<Census> {
    Json(commands::get_census(&state))
}

async fn status(State(state): State<AppState>) -> Json<QueueStatus> {
    Json(commands::get_status(&state))
}

async fn simulation(State(state): State<AppState>) -> Json<SimulationStatus> {
    Json(commands::simulation_status(&state))
}

async fn start_simulation(State(state): State<AppState>) -> Json<SimulationStatus> {
    Json(commands::start_simulation(&state))
}

async fn stop_simulation(State(state): State<AppState>) -> Json<SimulationStatus> {
    Json(commands::stop_simulation(&state))
}
