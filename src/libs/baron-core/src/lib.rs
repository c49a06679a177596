//! BARON Core Library
//!
//! Shared building blocks for the BARON handover simulator: actor identities,
//! the typed protocol message, the single-slot mailbox bus, configuration
//! loading and logging setup.

pub mod config;     // Simulation configuration and security keys
pub mod error;      // Error types
pub mod log;        // Logging initialization
pub mod mailbox;    // One pending message per actor
pub mod message;    // Protocol messages
pub mod types;      // Identities, link categories, session outcomes


pub use config::{Area, KeyConfig, SecurityKeys, SimConfig, Site};
pub use error::{
    ConfigError, ConfigResult, MailboxError, MailboxResult, MessageError, MessageResult,
};
pub use mailbox::Mailbox;
pub use message::{Content, Message, MessageBody, MessageType, RecoveryOrigin, MAX_CONTENT};
pub use types::{ActorId, AmfId, Coverage, Link, NodeId, SessionOutcome, Step, UeId};
