//! Handover error types
//!
//! Token mismatches are not errors: they end up as rejection messages or
//! session outcomes. Everything here is a defect that aborts the session.

use baron_core::{ActorId, AmfId, MailboxError, MessageError, MessageType, NodeId};
use thiserror::Error;

/// Handover simulation error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandoverError {
    /// Message type not expected in the actor's current state
    #[error("{actor} received unexpected {message} in state {state}")]
    UnexpectedMessage {
        actor: ActorId,
        message: MessageType,
        state: &'static str,
    },

    /// Access node without a controlling AMF
    #[error("{0} has no controlling AMF")]
    NoController(NodeId),

    /// AMF asked to deliver to a node it does not own
    #[error("{amf} does not own {node}")]
    UnknownRoute { amf: AmfId, node: NodeId },

    /// No access node left to recover through
    #[error("No access node available for reconnection recovery")]
    NoRecoveryTarget,

    /// Mailbox addressed to an actor that does not exist
    #[error("Unknown actor {0}")]
    UnknownActor(ActorId),

    /// No pending message while the session is still open
    #[error("Session stalled after {steps} steps")]
    Stalled { steps: usize },

    /// More than one mailbox occupied after a step
    #[error("{occupied} mailboxes occupied after a step")]
    MultiplePending { occupied: usize },

    /// Session did not finish within the step budget
    #[error("Session exceeded {max_steps} steps")]
    RoundLimitExceeded { max_steps: usize },

    /// Malformed message
    #[error("Message error: {0}")]
    Message(#[from] MessageError),

    /// Mailbox contract violation
    #[error("Mailbox error: {0}")]
    Mailbox(#[from] MailboxError),
}

/// Result type for handover operations
pub type HandoverResult<T> = Result<T, HandoverError>;
