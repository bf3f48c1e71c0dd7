//! Prompt construction
//!
//! The first transition introduces the app and its initial state; every later
//! one refers back to "your previous response" so the oracle keeps the state
//! in the conversation rather than in the prompt.

use super::Manifest;
use crate::action::NormalizedAction;
use serde_json::Value;
use std::fmt::Write;

const APP_INTRO: &str = "I'm an app built around a single Redux-style data store.";

const JSON_ONLY: &str = "Provide your answer in JSON form. Reply with only the answer in JSON \
    form and include no other commentary.";

pub const SYNTHESIZE_REDUCER_PROMPT: &str = "Give me code that implements my reducer function. \
    It should be able to handle all of the actions I told you I received, producing the states \
    you told me would result from applying them.";

/// Prompt asking for the state that follows `action`.
///
/// `state` is only rendered on the first turn; after that the oracle is
/// pointed at its own previous answer.
pub fn build_transition_prompt(
    state: &Value,
    action: &NormalizedAction,
    manifest: &Manifest,
    has_started: bool,
) -> String {
    let mut prompt = String::new();

    if !has_started {
        prompt.push_str(APP_INTRO);
        prompt.push_str("\n\n");
        if let Some(description) = &manifest.description {
            let _ = write!(prompt, "A description of the app is: {description}\n\n");
        }
        let _ = write!(
            prompt,
            "Here's the initial state of my store, in JSON form: {state}\n\n"
        );
    }

    let (received, subject) = if action.plural {
        ("some actions", "these actions")
    } else {
        ("an action", "this action")
    };
    let _ = write!(
        prompt,
        "My reducers received {received}, here encoded in JSON form: {}\n\n",
        action.payload
    );

    if has_started {
        prompt.push_str("Given the state of the store in your previous response, what");
    } else {
        prompt.push_str("What");
    }
    let _ = write!(
        prompt,
        " should the new state of my store be after {subject}? {JSON_ONLY}"
    );

    prompt
}

/// Prompt asking which actions would accomplish `description`
pub fn build_synthesize_actions_prompt(description: &str) -> String {
    format!(
        "The user has requested that I do the following: {description}\n\n\
         Given the state of the store in your previous response and the types of actions I have \
         received so far, what action(s) should I dispatch to my store in order to complete this \
         request? Provide your answer in the form of a JSON array of actions. Reply with only the \
         answer in JSON array form and include no other commentary."
    )
}
