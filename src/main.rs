//! Oracle Store console
//!
//! Line-oriented front end over an oracle-backed store. Each line is either
//! an action (JSON) to dispatch or a `:command`.

use oracle_store::{is_busy, ActionBatch, BackendConfig, OracleBackend, Settlement};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const HELP: &str = r#"Commands:
  {"type":"increment"}     dispatch an action (a JSON array dispatches a batch)
  :actions <goal>          ask which actions reach <goal>, then dispatch them
  :reducer                 ask for reducer code matching everything so far
  :query <text>            free-form question in the same conversation
  :state                   print the current state
  :help                    show this text
  :quit                    wait for pending work and exit

Environment:
  ORACLE_INITIAL_STATE     initial state as JSON, e.g. {"count":0} or
                           {"todos":[{"text":"Use Redux","completed":false,"id":0}],
                            "visibilityFilter":"show_all"}
  ORACLE_DESCRIPTION       description of the app, e.g. "todo list"
  ORACLE_API_BASE          relay base URL (default http://127.0.0.1:3000)
  ORACLE_LOG_FORMAT=json   structured logs on stderr"#;

#[derive(Debug, PartialEq)]
enum Command {
    Dispatch(Value),
    Actions(String),
    Reducer,
    Query(String),
    State,
    Help,
    Quit,
    Nothing,
    Invalid(String),
}

impl Command {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Nothing;
        }
        let Some(command) = line.strip_prefix(':') else {
            return match serde_json::from_str(line) {
                Ok(action) => Self::Dispatch(action),
                Err(e) => Self::Invalid(format!("not a JSON action: {e}")),
            };
        };

        let (name, rest) = command
            .split_once(char::is_whitespace)
            .map_or((command, ""), |(name, rest)| (name, rest.trim()));
        match (name, rest) {
            ("actions", "") | ("query", "") => Self::Invalid(format!(":{name} needs some text")),
            ("actions", goal) => Self::Actions(goal.to_string()),
            ("query", text) => Self::Query(text.to_string()),
            ("reducer", _) => Self::Reducer,
            ("state", _) => Self::State,
            ("help", _) => Self::Help,
            ("quit" | "exit", _) => Self::Quit,
            _ => Self::Invalid(format!("unknown command :{name}")),
        }
    }
}

fn init_tracing() {
    let json = std::env::var("ORACLE_LOG_FORMAT").is_ok_and(|f| f == "json");
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "oracle_store=info".into()),
        )
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr)
        }))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}

fn print_state(backend: &OracleBackend) {
    let state = backend.store().get_state();
    let rendered = serde_json::to_string_pretty(&state).unwrap_or_else(|_| state.data.to_string());
    if is_busy(&state) {
        println!("{rendered} (busy)");
    } else {
        println!("{rendered}");
    }
}

async fn dispatch_and_report(backend: &OracleBackend, action: impl Into<ActionBatch>) {
    match backend.store().dispatch(action).await {
        Ok(Settlement::Committed) => print_state(backend),
        Ok(Settlement::Unchanged) => println!("(state unchanged)"),
        // Already reported by the error handler
        Ok(Settlement::Failed) => println!("(transition failed; state unchanged)"),
        Err(e) => eprintln!("error: {e}"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = BackendConfig::from_env()?;
    let initial = match std::env::var("ORACLE_INITIAL_STATE") {
        Ok(raw) => serde_json::from_str(&raw)?,
        Err(_) => json!({}),
    };

    let backend = OracleBackend::connect(initial, config)?;
    println!("{HELP}\n");
    print_state(&backend);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Command::Dispatch(action) => dispatch_and_report(&backend, action).await,
            Command::Actions(goal) => match backend.synthesize_actions(goal).await {
                Ok(actions) => {
                    let batch = ActionBatch::from(actions);
                    if batch.is_empty() {
                        println!("(no actions suggested)");
                    } else {
                        println!("dispatching {} action(s)", batch.len());
                        dispatch_and_report(&backend, batch).await;
                    }
                }
                Err(e) => eprintln!("error: {e}"),
            },
            Command::Reducer => match backend.synthesize_reducer().await {
                Ok(code) => println!("{code}"),
                Err(e) => eprintln!("error: {e}"),
            },
            Command::Query(text) => match backend.query(text).await {
                Ok(answer) => println!("{answer}"),
                Err(e) => eprintln!("error: {e}"),
            },
            Command::State => print_state(&backend),
            Command::Help => println!("{HELP}"),
            Command::Quit => break,
            Command::Nothing => {}
            Command::Invalid(reason) => eprintln!("{reason}"),
        }
    }

    backend.drain().await;
    Ok(())
}
