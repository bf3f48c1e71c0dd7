//! Property-based tests for action normalization and prompt construction
//!
//! - Empty batches never reach the prompt
//! - Batch order survives into the embedded JSON
//! - Framing depends only on the first-turn flag
//! - The prompt never mentions a busy marker

use super::{build_transition_prompt, Manifest};
use crate::action::ActionBatch;
use crate::store::StoreState;
use proptest::prelude::*;
use serde_json::{json, Value};

fn arb_action() -> impl Strategy<Value = Value> {
    ("[a-z_]{1,12}", proptest::option::of(-1000i64..1000)).prop_map(|(kind, payload)| {
        match payload {
            Some(n) => json!({ "type": kind, "payload": n }),
            None => json!({ "type": kind }),
        }
    })
}

fn arb_state() -> impl Strategy<Value = Value> {
    proptest::collection::btree_map("[a-z]{1,8}", -100i64..100, 0..5)
        .prop_map(|m| serde_json::to_value(m).unwrap())
}

proptest! {
    #[test]
    fn normalize_is_none_only_for_empty(actions in proptest::collection::vec(arb_action(), 0..6)) {
        let batch = ActionBatch::from(actions.clone());
        prop_assert_eq!(batch.normalize().is_none(), actions.is_empty());
    }

    #[test]
    fn batch_order_is_preserved(actions in proptest::collection::vec(arb_action(), 2..6)) {
        let normalized = ActionBatch::from(actions.clone()).normalize().unwrap();
        prop_assert!(normalized.plural);
        prop_assert_eq!(normalized.payload, Value::Array(actions));
    }

    #[test]
    fn prompt_embeds_action_json(
        state in arb_state(),
        action in arb_action(),
        has_started in any::<bool>(),
    ) {
        let normalized = ActionBatch::from(vec![action.clone()]).normalize().unwrap();
        let prompt =
            build_transition_prompt(&state, &normalized, &Manifest::default(), has_started);
        prop_assert!(prompt.contains(&action.to_string()));
        prop_assert!(prompt.contains("Reply with only the answer in JSON form"));
    }

    #[test]
    fn framing_follows_first_turn_flag(
        state in arb_state(),
        action in arb_action(),
        has_started in any::<bool>(),
    ) {
        let normalized = ActionBatch::from(action).normalize().unwrap();
        let prompt =
            build_transition_prompt(&state, &normalized, &Manifest::default(), has_started);
        prop_assert_eq!(prompt.contains("initial state of my store"), !has_started);
        prop_assert_eq!(prompt.contains("your previous response"), has_started);
    }

    #[test]
    fn busy_marker_never_reaches_prompt(state in arb_state(), action in arb_action()) {
        let busy = StoreState { data: state.clone(), busy: true };
        let rendered = serde_json::to_value(&busy).unwrap();
        prop_assert_eq!(&rendered, &state);
        let normalized = ActionBatch::from(action).normalize().unwrap();
        let prompt = build_transition_prompt(&rendered, &normalized, &Manifest::default(), false);
        let expected = format!("in JSON form: {state}\n\n");
        prop_assert!(prompt.contains(&expected));
    }
}
