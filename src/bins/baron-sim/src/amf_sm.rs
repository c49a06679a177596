//! AMF State Machine
//!
//! Routes handover signaling between access nodes, across the AMF pair when
//! the target belongs to the peer, mints reconnection tokens and verifies
//! reconnection recovery requests on the core path.

use baron_core::{
    ActorId, AmfId, Coverage, Mailbox, Message, MessageBody, NodeId, RecoveryOrigin, SecurityKeys,
    Step, UeId,
};
use baron_crypt::{Key128, Ratchet, Token};
use rand::RngCore;

use crate::context::Position;
use crate::error::{HandoverError, HandoverResult};
use crate::event::{self, Actor};

/// Origin of the request this AMF is waiting to answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingRequest {
    /// An owned access node
    Node(NodeId),
    /// The peer AMF
    Peer,
}

/// AMF context
#[derive(Debug, Clone)]
pub struct AmfContext {
    id: AmfId,
    position: Position,
    coverage: Coverage,
    secured: bool,
    core_key: Key128,

    pending: Option<PendingRequest>,
    /// Set once a reconnection token was minted
    reconnection: Option<Ratchet>,
}

impl AmfContext {
    /// `num_nodes` counts every node slot and fixes the coverage partition
    pub fn new(
        id: AmfId,
        position: Position,
        num_nodes: u32,
        secured: bool,
        keys: &SecurityKeys,
    ) -> Self {
        Self {
            id,
            position,
            coverage: Coverage::new(num_nodes),
            secured,
            core_key: keys.core,
            pending: None,
            reconnection: None,
        }
    }

    pub fn amf_id(&self) -> AmfId {
        self.id
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn owns(&self, node: NodeId) -> bool {
        self.coverage.owns(self.id, node)
    }

    pub fn pending(&self) -> Option<PendingRequest> {
        self.pending
    }

    /// Current reconnection counter, if one was minted
    pub fn reconnection_counter(&self) -> Option<u32> {
        self.reconnection.map(|r| r.counter())
    }

    fn me(&self) -> ActorId {
        ActorId::Amf(self.id)
    }

    fn peer(&self) -> ActorId {
        ActorId::Amf(self.id.peer())
    }

    fn state_name(&self) -> &'static str {
        match self.pending {
            None => "Idle",
            Some(PendingRequest::Node(_)) => "PendingNode",
            Some(PendingRequest::Peer) => "PendingPeer",
        }
    }

    fn handle_handover_required(
        &mut self,
        mailbox: &mut Mailbox,
        msg: &Message,
        source: NodeId,
        ue: UeId,
        target: NodeId,
    ) -> HandoverResult<Step> {
        self.pending = Some(PendingRequest::Node(source));

        let token = if self.secured {
            let counter = msg.require_token()?.open(&self.core_key);
            Some(Token::seal(counter.wrapping_add(1), &self.core_key))
        } else {
            None
        };

        if self.owns(target) {
            let body = MessageBody::HandoverRequest { ue, target: None };
            event::send(
                mailbox,
                self.me(),
                ActorId::Node(target),
                Message::with_optional_token(body, token),
            )
        } else {
            log::debug!("{}: {} belongs to {}", self.id, target, self.id.peer());
            let body = MessageBody::HandoverRequest {
                ue,
                target: Some(target),
            };
            event::send(
                mailbox,
                self.me(),
                self.peer(),
                Message::with_optional_token(body, token),
            )
        }
    }

    fn handle_peer_handover_request(
        &mut self,
        mailbox: &mut Mailbox,
        msg: &Message,
        ue: UeId,
        target: NodeId,
    ) -> HandoverResult<Step> {
        if !self.owns(target) {
            return Err(HandoverError::UnknownRoute {
                amf: self.id,
                node: target,
            });
        }
        self.pending = Some(PendingRequest::Peer);
        let body = MessageBody::HandoverRequest { ue, target: None };
        event::send(
            mailbox,
            self.me(),
            ActorId::Node(target),
            Message::with_optional_token(body, msg.token()),
        )
    }

    fn handle_handover_ack(
        &mut self,
        mailbox: &mut Mailbox,
        msg: &Message,
        rng: &mut dyn RngCore,
    ) -> HandoverResult<Step> {
        match self.pending.take() {
            Some(PendingRequest::Peer) => event::send(mailbox, self.me(), self.peer(), *msg),
            Some(PendingRequest::Node(source)) => {
                let token = if self.secured {
                    let ratchet = Ratchet::new(rng.next_u32());
                    self.reconnection = Some(ratchet);
                    Some(Token::seal(ratchet.counter(), &self.core_key))
                } else {
                    None
                };
                event::send(
                    mailbox,
                    self.me(),
                    ActorId::Node(source),
                    Message::with_optional_token(MessageBody::HandoverCommand, token),
                )
            }
            None => Err(event::unexpected(self.me(), msg, self.state_name())),
        }
    }

    /// Check a core-path reconnection token and build the answer
    fn verify_recovery(&mut self, msg: &Message, ue: UeId) -> HandoverResult<Message> {
        if !self.secured {
            return Ok(Message::new(MessageBody::ReconnectionRecoveryOk));
        }

        let presented = msg.require_token()?.open(&self.core_key);
        let answer = self
            .reconnection
            .as_mut()
            .and_then(|ratchet| ratchet.verify(presented));

        Ok(match answer {
            Some(counter) => {
                log::debug!("{}: reconnection of {} accepted", self.id, ue);
                Message::with_token(
                    MessageBody::ReconnectionRecoveryOk,
                    Token::seal(counter, &self.core_key),
                )
            }
            None => {
                log::warn!("{}: reconnection token from {} rejected", self.id, ue);
                Message::new(MessageBody::ReconnectionRecoveryRejected)
            }
        })
    }

    fn handle_recovery(
        &mut self,
        mailbox: &mut Mailbox,
        msg: &Message,
        ue: UeId,
        origin: RecoveryOrigin,
    ) -> HandoverResult<Step> {
        match origin {
            RecoveryOrigin::Amf { from, .. } => {
                let reply = self.verify_recovery(msg, ue)?;
                event::send(mailbox, self.me(), ActorId::Amf(from), reply)
            }
            RecoveryOrigin::Node { node, serving_amf } if serving_amf == self.id => {
                let reply = self.verify_recovery(msg, ue)?;
                event::send(mailbox, self.me(), ActorId::Node(node), reply)
            }
            RecoveryOrigin::Node { node, serving_amf } => {
                self.pending = Some(PendingRequest::Node(node));
                let body = MessageBody::ReconnectionRecovery {
                    ue,
                    origin: RecoveryOrigin::Amf {
                        from: self.id,
                        serving_amf,
                    },
                };
                event::send(
                    mailbox,
                    self.me(),
                    self.peer(),
                    Message::with_optional_token(body, msg.token()),
                )
            }
            RecoveryOrigin::TerminalCore { .. } | RecoveryOrigin::TerminalFast => {
                Err(event::unexpected(self.me(), msg, self.state_name()))
            }
        }
    }

    fn handle_recovery_answer(&mut self, mailbox: &mut Mailbox, msg: &Message) -> HandoverResult<Step> {
        match self.pending {
            Some(PendingRequest::Node(node)) => {
                self.pending = None;
                event::send(mailbox, self.me(), ActorId::Node(node), *msg)
            }
            _ => Err(event::unexpected(self.me(), msg, self.state_name())),
        }
    }
}

impl Actor for AmfContext {
    fn id(&self) -> ActorId {
        self.me()
    }

    fn handle(
        &mut self,
        mailbox: &mut Mailbox,
        msg: Message,
        rng: &mut dyn RngCore,
    ) -> HandoverResult<Step> {
        log::debug!("{} [{}]: {}", self.id, self.state_name(), msg);

        match *msg.body() {
            MessageBody::HandoverRequired { source, ue, target } => {
                self.handle_handover_required(mailbox, &msg, source, ue, target)
            }
            MessageBody::HandoverRequest {
                ue,
                target: Some(target),
            } => self.handle_peer_handover_request(mailbox, &msg, ue, target),
            MessageBody::HandoverAck => self.handle_handover_ack(mailbox, &msg, rng),
            MessageBody::ReconnectionRecovery { ue, origin } => {
                self.handle_recovery(mailbox, &msg, ue, origin)
            }
            MessageBody::ReconnectionRecoveryOk | MessageBody::ReconnectionRecoveryRejected => {
                self.handle_recovery_answer(mailbox, &msg)
            }
            _ => Err(event::unexpected(self.me(), &msg, self.state_name())),
        }
    }
}
