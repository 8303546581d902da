use crate::dto::{
    CensusDto, PatientCardDto, PatientDetailsDto, QueueStatusDto, SimulationStatusDto,
};
use js_sys::Reflect;
use serde::de::DeserializeOwned;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, Response};

const DEFAULT_API_BASE: &str = "http://localhost:8080";

/// `window.__TRIAGE_API__` when the host page sets it, otherwise the
/// desk's default bind address.
fn api_base() -> String {
    web_sys::window()
        .and_then(|window| Reflect::get(&window, &JsValue::from_str("__TRIAGE_API__")).ok())
        .and_then(|value| value.as_string())
        .map(|base| base.trim_end_matches('/').to_string())
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
}

async fn call<R>(method: &str, path: &str) -> Result<R, String>
where
    R: DeserializeOwned,
{
    let window = web_sys::window().ok_or_else(|| "window not available".to_string())?;

    let init = RequestInit::new();
    init.set_method(method);
    let url = format!("{}{path}", api_base());
    let request = Request::new_with_str_and_init(&url, &init)
        .map_err(|e| format!("bad request {url}: {e:?}"))?;

    let response: Response = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|e| format!("fetch failed: {e:?}"))?
        .dyn_into()
        .map_err(|_| "fetch did not return a Response".to_string())?;

    if !response.ok() {
        let text = match response.text() {
            Ok(promise) => JsFuture::from(promise)
                .await
                .ok()
                .and_then(|v| v.as_string())
                .unwrap_or_default(),
            Err(_) => String::new(),
        };
        return Err(if text.is_empty() {
            format!("{method} {path} failed with status {}", response.status())
        } else {
            text
        });
    }

    let body = JsFuture::from(response.json().map_err(|e| format!("{e:?}"))?)
        .await
        .map_err(|e| format!("invalid JSON from {path}: {e:?}"))?;
    serde_wasm_bindgen::from_value(body).map_err(|e| e.to_string())
}

pub async fn fetch_patients() -> Result<Vec<PatientCardDto>, String> {
    call("GET", "/api/patients").await
}

pub async fn fetch_patient(id: &str) -> Result<PatientDetailsDto, String> {
    call("GET", &format!("/api/patients/{id}")).await
}

pub async fn fetch_census() -> Result<CensusDto, String> {
    call("GET", "/api/census").await
}

pub async fn fetch_status() -> Result<QueueStatusDto, String> {
    call("GET", "/api/status").await
}

pub async fn fetch_simulation() -> Result<SimulationStatusDto, String> {
    call("GET", "/api/simulation").await
}

pub async fn set_simulation(running: bool) -> Result<SimulationStatusDto, String> {
    let path = if running {
        "/api/simulation/start"
    } else {
        "/api/simulation/stop"
    };
    call("POST", path).await
}
