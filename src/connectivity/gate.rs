use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum GateView {
    /// Asks the user to disconnect.
    Prompt,
    Sanctuary,
}

impl GateView {
    pub fn for_connectivity(online: bool) -> Self {
        if online {
            GateView::Prompt
        } else {
            GateView::Sanctuary
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GateTransition {
    pub online: bool,
    pub view: GateView,
    /// Entry animations and section visibility are re-run on entering the
    /// sanctuary.
    pub replay_entry_animations: bool,
}

/// Exactly one view is shown at a time. Unknown until the first observation.
#[derive(Debug, Clone, Default)]
pub struct ConnectivityGate {
    online: Option<bool>,
}

impl ConnectivityGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn online(&self) -> Option<bool> {
        self.online
    }

    /// Yields a transition on the first observation and on every change.
    pub fn observe(&mut self, online: bool) -> Option<GateTransition> {
        if self.online == Some(online) {
            return None;
        }
        self.online = Some(online);
        Some(transition(online))
    }

    pub fn current(&self) -> Option<GateTransition> {
        self.online.map(|online| GateTransition {
            replay_entry_animations: false,
            ..transition(online)
        })
    }
}

fn transition(online: bool) -> GateTransition {
    let view = GateView::for_connectivity(online);
    GateTransition {
        online,
        view,
        replay_entry_animations: view == GateView::Sanctuary,
    }
}
