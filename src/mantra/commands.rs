use log::info;
use serde::Serialize;
use tauri::{AppHandle, State};

use crate::{
    mantra::{MantraSnapshot, COMPLETION_LABEL, MANTRA_LABEL},
    view, AppState,
};

pub const MANTRA_EVENT: &str = "mantra-changed";
pub const MANTRA_COMPLETED_EVENT: &str = "mantra-completed";

#[derive(Serialize, Clone)]
#[serde(rename_all = "camelCase")]
struct MantraCompletedEvent {
    count: u64,
    label: &'static str,
    resume_label: &'static str,
}

#[tauri::command]
pub fn get_mantra_state(state: State<AppState>) -> Result<MantraSnapshot, String> {
    let tally = state.mantra.lock().map_err(|e| e.to_string())?;
    Ok(tally.snapshot())
}

#[tauri::command]
pub fn increment_mantra(
    state: State<AppState>,
    app_handle: AppHandle,
) -> Result<MantraSnapshot, String> {
    let (outcome, snapshot) = {
        let mut tally = state.mantra.lock().map_err(|e| e.to_string())?;
        let outcome = tally.increment();
        (outcome, tally.snapshot())
    };

    view::emit(&app_handle, MANTRA_EVENT, &snapshot);
    if outcome.completed {
        info!("Mala of {} completed", outcome.count);
        view::emit(
            &app_handle,
            MANTRA_COMPLETED_EVENT,
            &MantraCompletedEvent {
                count: outcome.count,
                label: COMPLETION_LABEL,
                resume_label: MANTRA_LABEL,
            },
        );
    }

    Ok(snapshot)
}

#[tauri::command]
pub fn reset_mantra(state: State<AppState>, app_handle: AppHandle) -> Result<MantraSnapshot, String> {
    let snapshot = {
        let mut tally = state.mantra.lock().map_err(|e| e.to_string())?;
        tally.reset();
        tally.snapshot()
    };

    view::emit(&app_handle, MANTRA_EVENT, &snapshot);
    Ok(snapshot)
}
