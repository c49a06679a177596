//! BARON core error types

use std::path::PathBuf;

use thiserror::Error;

use crate::message::MessageType;
use crate::types::ActorId;

/// Message access error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessageError {
    /// Content index past the stored content length
    #[error("Content index {index} out of range (length {len})")]
    ContentIndexOutOfRange { index: usize, len: usize },

    /// Token required but absent
    #[error("{0} carries no token")]
    MissingToken(MessageType),
}

/// Result type for message operations
pub type MessageResult<T> = Result<T, MessageError>;

/// Mailbox bus error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MailboxError {
    /// Write to a slot still holding an undelivered message
    #[error("Mailbox slot for {0} is occupied")]
    SlotOccupied(ActorId),

    /// Read from an empty slot
    #[error("Mailbox slot for {0} is empty")]
    EmptySlot(ActorId),
}

/// Result type for mailbox operations
pub type MailboxResult<T> = Result<T, MailboxError>;

/// Configuration error
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed YAML
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Well-formed but unusable values
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;
