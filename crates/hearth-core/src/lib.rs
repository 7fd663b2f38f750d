//! Shared types for the hearth smart-home dialogue core
//!
//! - Function catalogue and schema registry ([`catalog`])
//! - Structured function calls ([`call`])
//! - Conversation history and its wire serialization ([`turn`])
//! - Error taxonomy ([`error`])

pub mod call;
pub mod catalog;
pub mod error;
pub mod turn;

pub use call::FunctionCall;
pub use catalog::{tool_catalog, FunctionSchema, HomeFunction, SchemaRegistry};
pub use error::{Error, Result};
pub use turn::{history_to_wire, ConversationTurn};
