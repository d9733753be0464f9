use tauri::State;

use crate::{
    content::{self, SanctuaryContent},
    quotes::Quote,
    AppState,
};

#[tauri::command]
pub fn new_quote(state: State<AppState>) -> Result<Quote, String> {
    Ok(state.quotes.random_quote())
}

/// Greeting plus quote, as shown each time the sanctuary opens.
#[tauri::command]
pub fn get_sanctuary_content(state: State<AppState>) -> Result<SanctuaryContent, String> {
    Ok(content::compose(
        &mut rand::thread_rng(),
        state.quotes.random_quote(),
    ))
}
