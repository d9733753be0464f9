use tauri::State;

use crate::{
    breathing::{BreathingController, BreathingPattern, BreathingSnapshot},
    AppState,
};

fn controller_from_state(state: &State<'_, AppState>) -> BreathingController {
    state.breathing.clone()
}

#[tauri::command]
pub async fn get_breathing_state(state: State<'_, AppState>) -> Result<BreathingSnapshot, String> {
    Ok(controller_from_state(&state).get_snapshot().await)
}

#[tauri::command]
pub async fn start_breathing(state: State<'_, AppState>) -> Result<BreathingSnapshot, String> {
    Ok(controller_from_state(&state).start().await)
}

#[tauri::command]
pub async fn stop_breathing(state: State<'_, AppState>) -> Result<BreathingSnapshot, String> {
    Ok(controller_from_state(&state).stop().await)
}

#[tauri::command]
pub async fn set_breathing_pattern(
    state: State<'_, AppState>,
    pattern: BreathingPattern,
) -> Result<BreathingSnapshot, String> {
    state
        .settings
        .update_breathing_pattern(pattern)
        .map_err(|e| e.to_string())?;
    Ok(controller_from_state(&state).set_pattern(pattern).await)
}
