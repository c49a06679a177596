//! Access Node (gNB) State Machine
//!
//! A legitimate node relays handover signaling between the terminal and its
//! controlling AMF, keeps the tokens it is handed, and answers fast
//! reconnection requests for terminals it still holds an active context for.
//!
//! The rogue variant has no keys and no controller. It only ever answers
//! random access, with a fabricated token.

use baron_core::{
    ActorId, AmfId, Mailbox, Message, MessageBody, NodeId, RecoveryOrigin, SecurityKeys, Step,
    UeId,
};
use baron_crypt::{Key128, Token};
use rand::RngCore;

use crate::context::Position;
use crate::error::{HandoverError, HandoverResult};
use crate::event::{self, Actor};

/// Access node context
#[derive(Debug, Clone)]
pub struct GnbContext {
    /// Mailbox address
    id: NodeId,
    /// Advertised cell id, differs from `id` only for the rogue
    cell: NodeId,
    position: Position,
    secured: bool,
    rogue: bool,

    controller: Option<AmfId>,
    access_key: Option<Key128>,

    /// Terminal this node currently serves
    active_context: Option<UeId>,
    /// Authentication token stored from `HandoverRequest`
    auth_token: Option<Token>,
    /// Reconnection token relayed in `HandoverCommand`
    reconnection_token: Option<Token>,
}

impl GnbContext {
    /// Legitimate node controlled by `amf`
    pub fn legitimate(
        id: NodeId,
        position: Position,
        secured: bool,
        amf: AmfId,
        keys: &SecurityKeys,
    ) -> Self {
        Self {
            id,
            cell: id,
            position,
            secured,
            rogue: false,
            controller: Some(amf),
            access_key: Some(keys.access),
            active_context: None,
            auth_token: None,
            reconnection_token: None,
        }
    }

    /// Rogue node at `addr` advertising `cell`
    pub fn rogue(addr: NodeId, cell: NodeId, position: Position, secured: bool) -> Self {
        Self {
            id: addr,
            cell,
            position,
            secured,
            rogue: true,
            controller: None,
            access_key: None,
            active_context: None,
            auth_token: None,
            reconnection_token: None,
        }
    }

    pub fn node_id(&self) -> NodeId {
        self.id
    }

    pub fn cell(&self) -> NodeId {
        self.cell
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn is_rogue(&self) -> bool {
        self.rogue
    }

    pub fn controller(&self) -> Option<AmfId> {
        self.controller
    }

    pub fn active_context(&self) -> Option<UeId> {
        self.active_context
    }

    pub fn set_active_context(&mut self, ue: Option<UeId>) {
        self.active_context = ue;
    }

    pub fn auth_token(&self) -> Option<Token> {
        self.auth_token
    }

    pub fn reconnection_token(&self) -> Option<Token> {
        self.reconnection_token
    }

    fn state_name(&self) -> &'static str {
        if self.rogue {
            "Rogue"
        } else {
            "Operational"
        }
    }

    fn me(&self) -> ActorId {
        ActorId::Node(self.id)
    }

    fn amf(&self) -> HandoverResult<ActorId> {
        self.controller
            .map(ActorId::Amf)
            .ok_or(HandoverError::NoController(self.id))
    }

    /// Fast reconnection check against the relayed reconnection token
    ///
    /// Returns the masked answer on success.
    fn verify_fast(&self, presented: Token) -> Option<Token> {
        let key = self.access_key?;
        let stored = self.reconnection_token?;
        if !Token::from_tail(stored.tail()).ct_eq(&presented.mask(&key)) {
            return None;
        }
        Some(Token::from_counter(stored.counter().wrapping_add(1)).mask(&key))
    }

    fn handle_recovery(
        &mut self,
        mailbox: &mut Mailbox,
        msg: &Message,
        ue: UeId,
        origin: RecoveryOrigin,
    ) -> HandoverResult<Step> {
        let serving_amf = match origin {
            RecoveryOrigin::TerminalFast => None,
            RecoveryOrigin::TerminalCore { serving_amf } => Some(serving_amf),
            RecoveryOrigin::Node { .. } | RecoveryOrigin::Amf { .. } => {
                return Err(event::unexpected(self.me(), msg, self.state_name()));
            }
        };

        if self.active_context == Some(ue) {
            let answer = if self.secured {
                self.verify_fast(msg.require_token()?).map(Some)
            } else {
                Some(None)
            };
            let reply = match answer {
                Some(token) => {
                    log::debug!("{}: fast reconnection of {} accepted", self.id, ue);
                    Message::with_optional_token(MessageBody::ReconnectionRecoveryOk, token)
                }
                None => {
                    log::warn!("{}: fast reconnection token from {} rejected", self.id, ue);
                    Message::new(MessageBody::ReconnectionRecoveryRejected)
                }
            };
            return event::send(mailbox, self.me(), ActorId::Terminal, reply);
        }

        // No context here: the serving AMF has to verify
        let Some(serving_amf) = serving_amf else {
            log::warn!("{}: fast reconnection from {} without active context", self.id, ue);
            return event::send(
                mailbox,
                self.me(),
                ActorId::Terminal,
                Message::new(MessageBody::ReconnectionRecoveryRejected),
            );
        };
        let body = MessageBody::ReconnectionRecovery {
            ue,
            origin: RecoveryOrigin::Node {
                node: self.id,
                serving_amf,
            },
        };
        let amf = self.amf()?;
        event::send(
            mailbox,
            self.me(),
            amf,
            Message::with_optional_token(body, msg.token()),
        )
    }

    fn handle_rogue(
        &mut self,
        mailbox: &mut Mailbox,
        msg: Message,
        rng: &mut dyn RngCore,
    ) -> HandoverResult<Step> {
        match msg.body() {
            MessageBody::RachProcedure => {
                let token = self.secured.then(|| Token::random(rng));
                log::debug!("{}: answering random access as cell {}", self.id, self.cell);
                event::send(
                    mailbox,
                    self.me(),
                    ActorId::Terminal,
                    Message::with_optional_token(MessageBody::RachOk, token),
                )
            }
            _ => Err(event::unexpected(self.me(), &msg, self.state_name())),
        }
    }
}

impl Actor for GnbContext {
    fn id(&self) -> ActorId {
        self.me()
    }

    fn handle(
        &mut self,
        mailbox: &mut Mailbox,
        msg: Message,
        rng: &mut dyn RngCore,
    ) -> HandoverResult<Step> {
        log::debug!("{}: {}", self.id, msg);

        if self.rogue {
            return self.handle_rogue(mailbox, msg, rng);
        }

        let body = *msg.body();
        match body {
            MessageBody::MeasurementReport { ue, target } => {
                let body = MessageBody::HandoverRequired {
                    source: self.id,
                    ue,
                    target,
                };
                let amf = self.amf()?;
                event::send(
                    mailbox,
                    self.me(),
                    amf,
                    Message::with_optional_token(body, msg.token()),
                )
            }
            MessageBody::HandoverRequest { ue, .. } => {
                log::debug!("{}: admitting {} as target", self.id, ue);
                self.auth_token = msg.token();
                let amf = self.amf()?;
                event::send(mailbox, self.me(), amf, Message::new(MessageBody::HandoverAck))
            }
            MessageBody::HandoverCommand => {
                self.reconnection_token = msg.token();
                event::send(mailbox, self.me(), ActorId::Terminal, msg)
            }
            MessageBody::RachProcedure => event::send(
                mailbox,
                self.me(),
                ActorId::Terminal,
                Message::with_optional_token(MessageBody::RachOk, self.auth_token),
            ),
            MessageBody::ReconnectionRecovery { ue, origin } => {
                self.handle_recovery(mailbox, &msg, ue, origin)
            }
            MessageBody::ReconnectionRecoveryOk | MessageBody::ReconnectionRecoveryRejected => {
                event::send(mailbox, self.me(), ActorId::Terminal, msg)
            }
            _ => Err(event::unexpected(self.me(), &msg, self.state_name())),
        }
    }
}
