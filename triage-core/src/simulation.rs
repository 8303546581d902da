//! Simulation mode: a cancellable repeating generate-and-insert task.
//!
//! The simulator is a two-state machine. `start` moves `Idle → Running` and
//! spawns the ticker; `stop` moves `Running → Idle` and aborts it. Each tick
//! re-checks under the state lock that its run is still current before it
//! issues an insert, so once `stop` returns no further insert is issued.
//! Inserts already in flight are left to finish.

use crate::generator;
use crate::store::PatientStore;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

pub const DEFAULT_PERIOD: Duration = Duration::from_secs(5);
pub const MIN_PERIOD: Duration = Duration::from_millis(100);
pub const MAX_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationState {
    Idle,
    Running,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationStatus {
    pub state: SimulationState,
    pub period_ms: u64,
    pub ticks: u64,
    pub inserted: u64,
    pub failed: u64,
}

enum Slot {
    Idle,
    Running { run: u64, handle: JoinHandle<()> },
}

struct Inner {
    store: Arc<dyn PatientStore>,
    period: Duration,
    slot: Mutex<Slot>,
    runs: AtomicU64,
    ticks: AtomicU64,
    inserted: AtomicU64,
    failed: AtomicU64,
}

impl Inner {
    fn lock_slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Clone)]
pub struct Simulator {
    inner: Arc<Inner>,
}

impl Simulator {
    pub fn new(store: Arc<dyn PatientStore>) -> Self {
        Self::with_period(store, DEFAULT_PERIOD)
    }

    /// Periods outside `MIN_PERIOD..=MAX_PERIOD` are clamped into it.
    pub fn with_period(store: Arc<dyn PatientStore>, period: Duration) -> Self {
        let period = clamp_period(period);
        Self {
            inner: Arc::new(Inner {
                store,
                period,
                slot: Mutex::new(Slot::Idle),
                runs: AtomicU64::new(0),
                ticks: AtomicU64::new(0),
                inserted: AtomicU64::new(0),
                failed: AtomicU64::new(0),
            }),
        }
    }

    /// `Idle → Running`. Returns `false` (and changes nothing) when already
    /// running. Must be called from within a Tokio runtime.
    pub fn start(&self) -> bool {
        let mut slot = self.inner.lock_slot();
        if matches!(*slot, Slot::Running { .. }) {
            debug!("simulation already running");
            return false;
        }

        let run = self.inner.runs.fetch_add(1, Ordering::Relaxed) + 1;
        let handle = tokio::spawn(run_ticks(Arc::downgrade(&self.inner), run, self.inner.period));
        *slot = Slot::Running { run, handle };
        info!(run, period_ms = self.period_ms(), "simulation started");
        true
    }

    /// `Running → Idle`. Returns `false` when already idle.
    pub fn stop(&self) -> bool {
        let mut slot = self.inner.lock_slot();
        match std::mem::replace(&mut *slot, Slot::Idle) {
            Slot::Running { run, handle } => {
                handle.abort();
                info!(run, "simulation stopped");
                true
            }
            Slot::Idle => false,
        }
    }

    pub fn state(&self) -> SimulationState {
        match *self.inner.lock_slot() {
            Slot::Idle => SimulationState::Idle,
            Slot::Running { .. } => SimulationState::Running,
        }
    }

    pub fn status(&self) -> SimulationStatus {
        SimulationStatus {
            state: self.state(),
            period_ms: self.period_ms(),
            ticks: self.inner.ticks.load(Ordering::Relaxed),
            inserted: self.inner.inserted.load(Ordering::Relaxed),
            failed: self.inner.failed.load(Ordering::Relaxed),
        }
    }

    fn period_ms(&self) -> u64 {
        u64::try_from(self.inner.period.as_millis()).unwrap_or(u64::MAX)
    }
}

fn clamp_period(period: Duration) -> Duration {
    let clamped = period.clamp(MIN_PERIOD, MAX_PERIOD);
    if clamped != period {
        warn!(
            requested_ms = %period.as_millis(),
            period_ms = %clamped.as_millis(),
            "simulation period out of range; clamped"
        );
    }
    clamped
}

async fn run_ticks(inner: Weak<Inner>, run: u64, period: Duration) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let Some(live) = inner.upgrade() else {
            break;
        };
        if !issue_tick(&live, run) {
            break;
        }
    }
}

fn issue_tick(inner: &Arc<Inner>, run: u64) -> bool {
    let slot = inner.lock_slot();
    match &*slot {
        Slot::Running { run: current, .. } if *current == run => {}
        _ => return false,
    }

    let patient = generator::generate();
    let tick = inner.ticks.fetch_add(1, Ordering::Relaxed) + 1;
    debug!(run, tick, level = %patient.triage_level, "simulated patient generated");

    let store = Arc::clone(&inner.store);
    let counters = Arc::clone(inner);
    tokio::spawn(async move {
        match store.insert(patient).await {
            Ok(record) => {
                counters.inserted.fetch_add(1, Ordering::Relaxed);
                debug!(id = %record.id, "simulated patient stored");
            }
            Err(err) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                warn!(error = %err, tick, "simulated patient insert failed");
            }
        }
    });
    true
}
