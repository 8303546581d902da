use crate::bridge;
use crate::dto::{
    CensusDto, PatientCardDto, PatientDetailsDto, QueueStatusDto, SimulationStatusDto, VitalDto,
};
use leptos::*;
use std::time::Duration;
use wasm_bindgen_futures::spawn_local;

const REFRESH_EVERY: Duration = Duration::from_secs(2);

fn icon_glyph(icon: &str) -> &'static str {
    match icon {
        "heart" => "♥",
        "thermometer" => "🌡",
        "droplets" => "💧",
        "wind" => "≋",
        _ => "∿",
    }
}

/// Polling writes the same data back every refresh; skipping equal values
/// keeps views that depend on the signal from being rebuilt.
fn set_if_changed<T: PartialEq + 'static>(signal: RwSignal<T>, next: T) -> bool {
    if signal.with_untracked(|current| *current == next) {
        return false;
    }
    signal.set(next);
    true
}

fn refresh_unavailable(detail: &str) -> String {
    format!("auto-refresh unavailable, reload to see new patients: {detail}")
}

#[component]
pub fn App() -> impl IntoView {
    let patients = create_rw_signal(Vec::<PatientCardDto>::new());
    let census = create_rw_signal(CensusDto::default());
    let status = create_rw_signal(QueueStatusDto::Loading);
    let simulation = create_rw_signal(None::<SimulationStatusDto>);
    let selected = create_rw_signal(None::<PatientDetailsDto>);
    let error = create_rw_signal(None::<String>);

    let set_status = move |next: QueueStatusDto| {
        set_if_changed(status, next);
    };

    let load_queue = move || {
        spawn_local(async move {
            match bridge::fetch_status().await {
                Ok(QueueStatusDto::Ready) => {}
                Ok(other) => {
                    set_status(other);
                    return;
                }
                Err(e) => {
                    set_status(QueueStatusDto::Failed(e));
                    return;
                }
            }

            match (bridge::fetch_patients().await, bridge::fetch_census().await) {
                (Ok(list), Ok(counts)) => {
                    set_if_changed(patients, list);
                    set_if_changed(census, counts);
                    set_status(QueueStatusDto::Ready);
                }
                (Err(e), _) | (_, Err(e)) => set_status(QueueStatusDto::Failed(e)),
            }
        });
    };

    let load_simulation = move || {
        spawn_local(async move {
            match bridge::fetch_simulation().await {
                Ok(s) => simulation.set(Some(s)),
                Err(e) => error.set(Some(format!("simulation: {e}"))),
            }
        });
    };

    let toggle_simulation = move || {
        let running = simulation
            .get_untracked()
            .map(|s| s.is_running())
            .unwrap_or(false);
        spawn_local(async move {
            match bridge::set_simulation(!running).await {
                Ok(s) => {
                    simulation.set(Some(s));
                    error.set(None);
                }
                Err(e) => error.set(Some(format!("simulation: {e}"))),
            }
        });
    };

    let open_details = move |id: String| {
        spawn_local(async move {
            match bridge::fetch_patient(&id).await {
                Ok(details) => selected.set(Some(details)),
                Err(e) => error.set(Some(format!("patient {id}: {e}"))),
            }
        });
    };

    load_queue();
    load_simulation();
    // The page lives as long as the app, so the handle is never cleared.
    if let Err(e) = set_interval_with_handle(
        move || {
            load_queue();
            load_simulation();
        },
        REFRESH_EVERY,
    ) {
        let message = refresh_unavailable(&format!("{e:?}"));
        logging::error!("{message}");
        error.set(Some(message));
    }

    view! {
      <div class="dashboard">
        <header class="header">
          <div>
            <h1>"Emergency Room Triage"</h1>
            <p class="meta">"Live patient queue"</p>
          </div>
          <div class="stats">
            <span>{move || format!("{} patients", census.get().total)}</span>
            <span class="badge critical">{move || format!("{} Critical", census.get().critical)}</span>
            <span class="badge urgent">{move || format!("{} Urgent", census.get().urgent)}</span>
            <span class="badge stable">{move || format!("{} Stable", census.get().stable)}</span>
            <button on:click=move |_| toggle_simulation()>
              {move || {
                  if simulation.get().map(|s| s.is_running()).unwrap_or(false) {
                      "Stop Simulation"
                  } else {
                      "Start Simulation"
                  }
              }}
            </button>
          </div>
        </header>

        <Show
          when=move || error.get().is_some()
          fallback=|| ()
        >
          <pre class="error">{move || error.get().unwrap_or_default()}</pre>
        </Show>

        <main>
          {move || match status.get() {
              QueueStatusDto::Loading => view! {
                <div class="centered"><p class="meta">"Loading patients..."</p></div>
              }.into_view(),
              QueueStatusDto::Failed(message) => view! {
                <div class="centered">
                  <p class="error">"Error loading patients"</p>
                  <p class="meta">{message}</p>
                </div>
              }.into_view(),
              QueueStatusDto::Ready => view! {
                <Show
                  when=move || !patients.with(Vec::is_empty)
                  fallback=|| view! {
                    <div class="centered">
                      <h2>"No patients in queue"</h2>
                      <p class="meta">"New patients will appear here automatically"</p>
                    </div>
                  }
                >
                  <div class="grid">
                    <For
                      each=move || patients.get()
                      key=|p| (p.id.clone(), p.triage_level.clone())
                      children=move |p| {
                        let id = p.id.clone();
                        view! { <PatientCard card=p on_open=move || open_details(id.clone())/> }
                      }
                    />
                  </div>
                </Show>
              }.into_view(),
          }}
        </main>

        <Show
          when=move || selected.get().is_some()
          fallback=|| ()
        >
          <PatientDetails patient=selected/>
        </Show>
      </div>
    }
}

#[component]
fn PatientCard<F>(card: PatientCardDto, on_open: F) -> impl IntoView
where
    F: Fn() + 'static,
{
    view! {
      <div class=format!("card {}", card.tone) on:click=move |_| on_open()>
        <div class="card-head">
          <span class=format!("badge {}", card.tone)>{card.triage_level.clone()}</span>
          <span class="meta">{card.arrival_clock.clone()}</span>
        </div>
        <div class="meta">"Patient ID:"</div>
        <p class="mono">{card.short_id.clone()}</p>
        <div class="chips">
          {card.symptoms.iter().map(|s| view! { <span class="chip">{s.clone()}</span> }).collect_view()}
          {card.extra_symptoms.clone().map(|more| view! { <span class="chip">{more}</span> })}
        </div>
        <div class="vitals">
          {card.vitals.iter().map(|v| view! {
            <div class="vital">
              <span>{format!("{}:", v.label)}</span>
              <span class="mono">{v.value.clone()}</span>
            </div>
          }).collect_view()}
        </div>
      </div>
    }
}

#[component]
fn PatientDetails(patient: RwSignal<Option<PatientDetailsDto>>) -> impl IntoView {
    let vital_row = |v: VitalDto| {
        view! {
          <div class="vital">
            <span>{icon_glyph(&v.icon)} " " {v.label}</span>
            <span class="mono">{v.value}</span>
          </div>
        }
    };

    view! {
      <div class="modal-backdrop" on:click=move |_| patient.set(None)>
        <div class="modal" on:click=|ev| ev.stop_propagation()>
          {move || patient.get().map(|p| view! {
            <h2>
              <span class=format!("badge {}", p.tone)>{p.triage_level.clone()}</span>
              " Patient Details"
            </h2>
            <div class="meta">{p.arrival_display.clone()}</div>
            <div class="meta">"Patient ID:"</div>
            <p class="mono">{p.short_id.clone()}</p>

            <h3>"Symptoms"</h3>
            <div class="chips">
              {p.symptoms.iter().map(|s| view! { <span class="chip">{s.clone()}</span> }).collect_view()}
            </div>

            <h3>"Vital Signs"</h3>
            <div class="vitals">
              {p.vitals.clone().into_iter().map(vital_row).collect_view()}
            </div>

            {p.explanation.clone().map(|text| view! {
              <h3>"Triage Explanation"</h3>
              <p>{text}</p>
            })}
            <button on:click=move |_| patient.set(None)>"Close"</button>
          })}
        </div>
      </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_values_are_not_written_back() {
        let runtime = create_runtime();
        let status = create_rw_signal(QueueStatusDto::Loading);

        assert!(set_if_changed(status, QueueStatusDto::Ready));
        assert!(!set_if_changed(status, QueueStatusDto::Ready));
        assert!(set_if_changed(status, QueueStatusDto::Failed("offline".into())));
        assert_eq!(status.get_untracked(), QueueStatusDto::Failed("offline".into()));

        let census = create_rw_signal(CensusDto::default());
        assert!(!set_if_changed(census, CensusDto::default()));
        runtime.dispose();
    }

    #[test]
    fn refresh_failure_tells_the_user_to_reload() {
        let message = refresh_unavailable("JsValue(TypeError)");
        assert!(message.starts_with("auto-refresh unavailable"));
        assert!(message.contains("TypeError"));
    }
}
