use tauri::State;

use crate::{connectivity::GateTransition, AppState};

#[tauri::command]
pub async fn get_connectivity(state: State<'_, AppState>) -> Result<Option<GateTransition>, String> {
    Ok(state.connectivity.current().await)
}

#[tauri::command]
pub async fn report_connectivity(
    state: State<'_, AppState>,
    online: bool,
) -> Result<Option<GateTransition>, String> {
    let monitor = state.connectivity.clone();
    monitor.report(online).await;
    Ok(monitor.current().await)
}
