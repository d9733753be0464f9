use tauri::{AppHandle, State};

use crate::{
    audio::{ToneKind, ToneStatus},
    view, AppState,
};

fn publish(app_handle: &AppHandle, status: ToneStatus) -> ToneStatus {
    view::emit(app_handle, "tone-state-changed", &status);
    status
}

#[tauri::command]
pub fn play_tone(
    kind: ToneKind,
    state: State<AppState>,
    app_handle: AppHandle,
) -> Result<ToneStatus, String> {
    match state.audio.play(kind) {
        Ok(status) => Ok(publish(&app_handle, status)),
        Err(err) => {
            // The previous voice is gone either way; let the view catch up.
            if let Ok(status) = state.audio.status() {
                publish(&app_handle, status);
            }
            Err(err.to_string())
        }
    }
}

#[tauri::command]
pub fn stop_tone(state: State<AppState>, app_handle: AppHandle) -> Result<ToneStatus, String> {
    let status = state.audio.stop().map_err(|e| e.to_string())?;
    Ok(publish(&app_handle, status))
}

#[tauri::command]
pub fn set_tone_volume(
    volume: f32,
    state: State<AppState>,
    app_handle: AppHandle,
) -> Result<ToneStatus, String> {
    let status = state.audio.set_volume(volume).map_err(|e| e.to_string())?;
    Ok(publish(&app_handle, status))
}

#[tauri::command]
pub fn get_tone_state(state: State<AppState>) -> Result<ToneStatus, String> {
    state.audio.status().map_err(|e| e.to_string())
}
