//! # Core Module
//!
//! Configuration, error taxonomy and reply utilities shared by every feature.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod config;
pub mod error;
pub mod response;

pub use config::{Config, ModelProvider};
pub use error::{BotError, REFUSAL_MESSAGE};
pub use response::{chunk_for_message, chunk_text, MESSAGE_LIMIT};
