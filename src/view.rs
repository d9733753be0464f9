//! Binding between widget state and the webview.
//!
//! Controllers never touch the window directly; they push serialized
//! snapshots through a [`ViewEmitter`]. The app wires the Tauri `AppHandle`
//! in, tests wire a recorder in.

use log::warn;
use serde::Serialize;
use serde_json::Value;
use tauri::{AppHandle, Emitter};

pub trait ViewEmitter: Send + Sync + 'static {
    fn emit_value(&self, event: &str, payload: Value);
}

impl ViewEmitter for AppHandle {
    fn emit_value(&self, event: &str, payload: Value) {
        if let Err(err) = Emitter::emit(self, event, payload) {
            warn!("failed to emit {event}: {err}");
        }
    }
}

/// Serialize `payload` and hand it to the emitter.
pub fn emit<T: Serialize>(emitter: &dyn ViewEmitter, event: &str, payload: &T) {
    match serde_json::to_value(payload) {
        Ok(value) => emitter.emit_value(event, value),
        Err(err) => warn!("failed to serialize {event} payload: {err}"),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use serde_json::Value;

    use super::ViewEmitter;

    #[derive(Default)]
    pub struct RecordingEmitter {
        events: Mutex<Vec<(String, Value)>>,
    }

    impl RecordingEmitter {
        pub fn events(&self) -> Vec<(String, Value)> {
            self.events.lock().unwrap().clone()
        }

        pub fn named(&self, event: &str) -> Vec<Value> {
            self.events()
                .into_iter()
                .filter(|(name, _)| name == event)
                .map(|(_, payload)| payload)
                .collect()
        }

        pub fn clear(&self) {
            self.events.lock().unwrap().clear();
        }
    }

    impl ViewEmitter for RecordingEmitter {
        fn emit_value(&self, event: &str, payload: Value) {
            self.events
                .lock()
                .unwrap()
                .push((event.to_string(), payload));
        }
    }
}
