use tauri::State;

use crate::{
    timer::{TimerController, TimerSnapshot},
    AppState,
};

fn controller_from_state(state: &State<'_, AppState>) -> TimerController {
    state.timer.clone()
}

#[tauri::command]
pub async fn get_timer_state(state: State<'_, AppState>) -> Result<TimerSnapshot, String> {
    let controller = controller_from_state(&state);
    Ok(controller.get_snapshot().await)
}

#[tauri::command]
pub async fn select_timer_duration(
    state: State<'_, AppState>,
    minutes: u32,
) -> Result<TimerSnapshot, String> {
    let controller = controller_from_state(&state);
    controller
        .select_duration(minutes)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn start_timer(state: State<'_, AppState>) -> Result<TimerSnapshot, String> {
    let controller = controller_from_state(&state);
    Ok(controller.start_timer().await)
}

#[tauri::command]
pub async fn stop_timer(state: State<'_, AppState>) -> Result<TimerSnapshot, String> {
    let controller = controller_from_state(&state);
    Ok(controller.stop_timer().await)
}
