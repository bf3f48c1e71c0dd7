//! Oracle Store - a state container whose reducer is a remote language model
//!
//! Every dispatched action is rendered into a prompt, sent through a relay to
//! a text-completion oracle, and the JSON it answers with becomes the next
//! state. The crate guarantees delivery, ordering and parseability of those
//! round trips; it does not judge the answers.
//!
//! ```no_run
//! use oracle_store::{is_busy, BackendConfig, OracleBackend};
//! use serde_json::json;
//!
//! # async fn demo() -> Result<(), oracle_store::ConfigError> {
//! let backend = OracleBackend::connect(json!({ "count": 0 }), BackendConfig::default())?;
//! let store = backend.store();
//! store.dispatch(json!({ "type": "increment" }));
//! assert!(is_busy(&store.get_state()));
//! backend.drain().await;
//! # Ok(())
//! # }
//! ```

pub mod action;
pub mod backend;
pub mod config;
pub mod engine;
pub mod error;
pub mod oracle;
pub mod queue;
pub mod store;
pub mod thread;

pub use action::ActionBatch;
pub use backend::OracleBackend;
pub use config::{BackendConfig, ConfigError, ErrorHandler};
pub use engine::{Manifest, Reducer, Reduction, TransitionEngine};
pub use error::BackendError;
pub use oracle::{
    LoggingOracle, OracleClient, OracleError, OracleErrorKind, OracleReply, OracleRequest,
    RelayClient, StructuredReply,
};
pub use queue::{QueueError, SerialQueue, Ticket};
pub use store::{is_busy, Settlement, Store, StoreState, Subscription};
pub use thread::ConversationThread;
