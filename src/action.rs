//! Dispatched action payloads

use serde_json::Value;

/// What a single `dispatch` carries: one action or an ordered batch
#[derive(Debug, Clone, PartialEq)]
pub enum ActionBatch {
    Single(Value),
    Sequence(Vec<Value>),
}

/// A batch reduced to what the prompt needs
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedAction {
    /// The action, or the JSON array of actions
    pub payload: Value,
    /// More than one action; the prompt says "some actions"
    pub plural: bool,
}

impl ActionBatch {
    /// Collapse the batch for prompting.
    ///
    /// An empty sequence is a no-op and yields `None`; a one-element
    /// sequence is unwrapped to its only action.
    pub fn normalize(&self) -> Option<NormalizedAction> {
        match self {
            Self::Single(action) => Some(NormalizedAction {
                payload: action.clone(),
                plural: false,
            }),
            Self::Sequence(actions) => match actions.as_slice() {
                [] => None,
                [action] => Some(NormalizedAction {
                    payload: action.clone(),
                    plural: false,
                }),
                _ => Some(NormalizedAction {
                    payload: Value::Array(actions.clone()),
                    plural: true,
                }),
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Sequence(actions) if actions.is_empty())
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Sequence(actions) => actions.len(),
        }
    }
}

/// A JSON array dispatched as one value is a batch, anything else one action
impl From<Value> for ActionBatch {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(actions) => Self::Sequence(actions),
            action => Self::Single(action),
        }
    }
}

impl From<Vec<Value>> for ActionBatch {
    fn from(actions: Vec<Value>) -> Self {
        Self::Sequence(actions)
    }
}

/// Wrap whatever the oracle suggested into an ordered list of actions
pub fn into_action_list(value: Value) -> Vec<Value> {
    match value {
        Value::Array(actions) => actions,
        action => vec![action],
    }
}
