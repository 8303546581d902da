use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;
use triage_core::simulation::{DEFAULT_PERIOD, MAX_PERIOD};

pub const DEFAULT_DB_PATH: &str = "patients.db";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeskConfig {
    pub db_path: PathBuf,
    pub bind_addr: String,
    pub simulation_period: Duration,
    pub autostart_simulation: bool,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            bind_addr: DEFAULT_BIND_ADDR.into(),
            simulation_period: DEFAULT_PERIOD,
            autostart_simulation: false,
        }
    }
}

impl DeskConfig {
    /// Reads `TRIAGE_DB_PATH`, `TRIAGE_BIND_ADDR`,
    /// `TRIAGE_SIMULATION_PERIOD_SECS` and `TRIAGE_SIMULATION_AUTOSTART`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let simulation_period = match lookup("TRIAGE_SIMULATION_PERIOD_SECS") {
            None => defaults.simulation_period,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 && secs <= MAX_PERIOD.as_secs() => Duration::from_secs(secs),
                _ => {
                    warn!(value = %raw, "ignoring invalid TRIAGE_SIMULATION_PERIOD_SECS");
                    defaults.simulation_period
                }
            },
        };

        Self {
            db_path: lookup("TRIAGE_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            bind_addr: lookup("TRIAGE_BIND_ADDR").unwrap_or(defaults.bind_addr),
            simulation_period,
            autostart_simulation: lookup("TRIAGE_SIMULATION_AUTOSTART")
                .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.autostart_simulation),
        }
    }
}
