//! Observable store state

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Application data plus the hidden busy marker.
///
/// Serialization and equality only look at `data`; `busy` is engine
/// metadata and must never reach the oracle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreState {
    pub data: Value,
    #[serde(skip)]
    pub busy: bool,
}

impl StoreState {
    pub fn idle(data: Value) -> Self {
        Self { data, busy: false }
    }
}

impl PartialEq for StoreState {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

/// Whether a transition is waiting on the oracle
pub fn is_busy(state: &StoreState) -> bool {
    state.busy
}
