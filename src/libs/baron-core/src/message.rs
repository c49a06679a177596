//! Protocol messages
//!
//! A [`Message`] pairs a typed [`MessageBody`] with an optional [`Token`].
//! Messages are immutable once built: actors consume one and produce a new one.
//!
//! The flat integer view returned by [`Message::content`] follows the layouts
//! below (ids are the numeric values of the identity newtypes):
//!
//! | Type | Content |
//! |---|---|
//! | MeasurementReport | `[ue, target]` |
//! | HandoverRequired | `[source, ue, target]` |
//! | HandoverRequest | `[ue]` to a node, `[ue, target]` to the peer AMF |
//! | ReconnectionRecovery | `[ue, amf]`, `[ue]`, `[node, 1, ue, amf]` or `[amf, 0, ue, amf]` |
//! | all others | `[]` |

use std::fmt;

use baron_crypt::Token;

use crate::error::{MessageError, MessageResult};
use crate::types::{AmfId, NodeId, UeId};

/// Capacity of the integer content view
pub const MAX_CONTENT: usize = 10;

/// Message type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    MeasurementReport,
    HandoverRequired,
    HandoverRequest,
    HandoverAck,
    HandoverCommand,
    RachProcedure,
    RachOk,
    ReconnectionRecovery,
    ReconnectionRecoveryOk,
    ReconnectionRecoveryRejected,
}

impl MessageType {
    pub fn name(self) -> &'static str {
        match self {
            MessageType::MeasurementReport => "MeasurementReport",
            MessageType::HandoverRequired => "HandoverRequired",
            MessageType::HandoverRequest => "HandoverRequest",
            MessageType::HandoverAck => "HandoverAck",
            MessageType::HandoverCommand => "HandoverCommand",
            MessageType::RachProcedure => "RachProcedure",
            MessageType::RachOk => "RachOk",
            MessageType::ReconnectionRecovery => "ReconnectionRecovery",
            MessageType::ReconnectionRecoveryOk => "ReconnectionRecoveryOk",
            MessageType::ReconnectionRecoveryRejected => "ReconnectionRecoveryRejected",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Who issued a `ReconnectionRecovery` and where it is headed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryOrigin {
    /// Terminal, core path: verified by the terminal's serving AMF
    TerminalCore { serving_amf: AmfId },
    /// Terminal, fast path: verified by the serving node itself
    TerminalFast,
    /// Relayed by an access node toward its controller
    Node { node: NodeId, serving_amf: AmfId },
    /// Forwarded by the peer AMF
    Amf { from: AmfId, serving_amf: AmfId },
}

impl RecoveryOrigin {
    /// AMF that has to verify the token, if the core path is used
    pub fn serving_amf(&self) -> Option<AmfId> {
        match *self {
            RecoveryOrigin::TerminalCore { serving_amf }
            | RecoveryOrigin::Node { serving_amf, .. }
            | RecoveryOrigin::Amf { serving_amf, .. } => Some(serving_amf),
            RecoveryOrigin::TerminalFast => None,
        }
    }
}

/// Typed message payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageBody {
    MeasurementReport {
        ue: UeId,
        target: NodeId,
    },
    HandoverRequired {
        source: NodeId,
        ue: UeId,
        target: NodeId,
    },
    /// `target` is set only when forwarded to the peer AMF
    HandoverRequest {
        ue: UeId,
        target: Option<NodeId>,
    },
    HandoverAck,
    HandoverCommand,
    RachProcedure,
    RachOk,
    ReconnectionRecovery {
        ue: UeId,
        origin: RecoveryOrigin,
    },
    ReconnectionRecoveryOk,
    ReconnectionRecoveryRejected,
}

impl MessageBody {
    pub fn msg_type(&self) -> MessageType {
        match self {
            MessageBody::MeasurementReport { .. } => MessageType::MeasurementReport,
            MessageBody::HandoverRequired { .. } => MessageType::HandoverRequired,
            MessageBody::HandoverRequest { .. } => MessageType::HandoverRequest,
            MessageBody::HandoverAck => MessageType::HandoverAck,
            MessageBody::HandoverCommand => MessageType::HandoverCommand,
            MessageBody::RachProcedure => MessageType::RachProcedure,
            MessageBody::RachOk => MessageType::RachOk,
            MessageBody::ReconnectionRecovery { .. } => MessageType::ReconnectionRecovery,
            MessageBody::ReconnectionRecoveryOk => MessageType::ReconnectionRecoveryOk,
            MessageBody::ReconnectionRecoveryRejected => MessageType::ReconnectionRecoveryRejected,
        }
    }

    /// Flat integer view of the payload
    pub fn content(&self) -> Content {
        let mut content = Content::default();
        match *self {
            MessageBody::MeasurementReport { ue, target } => {
                content.push(ue.0);
                content.push(target.0);
            }
            MessageBody::HandoverRequired { source, ue, target } => {
                content.push(source.0);
                content.push(ue.0);
                content.push(target.0);
            }
            MessageBody::HandoverRequest { ue, target } => {
                content.push(ue.0);
                if let Some(target) = target {
                    content.push(target.0);
                }
            }
            MessageBody::ReconnectionRecovery { ue, origin } => match origin {
                RecoveryOrigin::TerminalCore { serving_amf } => {
                    content.push(ue.0);
                    content.push(serving_amf.0);
                }
                RecoveryOrigin::TerminalFast => content.push(ue.0),
                RecoveryOrigin::Node { node, serving_amf } => {
                    content.push(node.0);
                    content.push(1);
                    content.push(ue.0);
                    content.push(serving_amf.0);
                }
                RecoveryOrigin::Amf { from, serving_amf } => {
                    content.push(from.0);
                    content.push(0);
                    content.push(ue.0);
                    content.push(serving_amf.0);
                }
            },
            MessageBody::HandoverAck
            | MessageBody::HandoverCommand
            | MessageBody::RachProcedure
            | MessageBody::RachOk
            | MessageBody::ReconnectionRecoveryOk
            | MessageBody::ReconnectionRecoveryRejected => {}
        }
        content
    }
}

/// Fixed-capacity integer content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Content {
    values: [i64; MAX_CONTENT],
    len: usize,
}

impl Content {
    fn push(&mut self, value: u32) {
        // Layouts never exceed four entries
        if self.len < MAX_CONTENT {
            self.values[self.len] = i64::from(value);
            self.len += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.values[..self.len]
    }

    pub fn get(&self, index: usize) -> MessageResult<i64> {
        self.as_slice()
            .get(index)
            .copied()
            .ok_or(MessageError::ContentIndexOutOfRange { index, len: self.len })
    }
}

/// Protocol message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message {
    body: MessageBody,
    token: Option<Token>,
}

impl Message {
    /// Message without a token
    pub fn new(body: MessageBody) -> Self {
        Self { body, token: None }
    }

    /// Message carrying `token`
    pub fn with_token(body: MessageBody, token: Token) -> Self {
        Self { body, token: Some(token) }
    }

    /// Message carrying `token` only when present
    pub fn with_optional_token(body: MessageBody, token: Option<Token>) -> Self {
        Self { body, token }
    }

    pub fn msg_type(&self) -> MessageType {
        self.body.msg_type()
    }

    pub fn body(&self) -> &MessageBody {
        &self.body
    }

    pub fn content(&self) -> Content {
        self.body.content()
    }

    pub fn content_len(&self) -> usize {
        self.content().len()
    }

    /// `index`-th content element
    pub fn content_at(&self, index: usize) -> MessageResult<i64> {
        self.content().get(index)
    }

    /// Copy of the carried token
    pub fn token(&self) -> Option<Token> {
        self.token
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Copy of the carried token, failing if there is none
    pub fn require_token(&self) -> MessageResult<Token> {
        self.token.ok_or(MessageError::MissingToken(self.msg_type()))
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:?}", self.msg_type(), self.content().as_slice())?;
        if self.has_token() {
            write!(f, " +token")?;
        }
        Ok(())
    }
}
