//! Terminal (UE) State Machine
//!
//! Drives one handover attempt and, when the target node fails token
//! verification, the reconnection recovery that follows.
//!
//! ```text
//! Idle -> AwaitingHandoverCommand -> AwaitingHandoverOutcome -> Completed(Success)
//!                                                   |
//!                                                   +-> RecoveryPending(Fast | Core)
//!                                                         -> Completed(RecoverySuccess
//!                                                                     | RecoveryRejected
//!                                                                     | RecoveryAborted)
//! ```

use baron_core::{
    ActorId, AmfId, Mailbox, Message, MessageBody, NodeId, RecoveryOrigin, SecurityKeys,
    SessionOutcome, Step, UeId,
};
use baron_crypt::{Ratchet, Token};
use rand::RngCore;

use crate::context::{Beacon, Position};
use crate::error::{HandoverError, HandoverResult};
use crate::event::{self, Actor};

/// Reconnection recovery flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryPath {
    /// Straight back to the serving node, token masked with the access key
    Fast,
    /// Through a new target node and the AMFs, token sealed with the core key
    Core,
}

/// UE FSM states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UeState {
    /// Nothing sent yet
    #[default]
    Idle,
    /// Measurement report sent
    AwaitingHandoverCommand,
    /// Random access sent to the target
    AwaitingHandoverOutcome,
    /// Target rejected, recovery request sent
    RecoveryPending(RecoveryPath),
    /// Final
    Completed(SessionOutcome),
}

impl UeState {
    pub fn name(&self) -> &'static str {
        match self {
            UeState::Idle => "Idle",
            UeState::AwaitingHandoverCommand => "AwaitingHandoverCommand",
            UeState::AwaitingHandoverOutcome => "AwaitingHandoverOutcome",
            UeState::RecoveryPending(RecoveryPath::Fast) => "RecoveryPending(Fast)",
            UeState::RecoveryPending(RecoveryPath::Core) => "RecoveryPending(Core)",
            UeState::Completed(_) => "Completed",
        }
    }
}

/// UE context
#[derive(Debug, Clone)]
pub struct UeContext {
    id: UeId,
    position: Position,
    secured: bool,
    keys: SecurityKeys,

    /// Node holding the active context before the handover
    serving: NodeId,
    serving_amf: AmfId,
    /// Current target, re-selected on attack
    target: Option<Beacon>,
    /// Last measurement
    beacons: Vec<Beacon>,

    auth: Ratchet,
    reconnection: Ratchet,
    /// Encrypted tail of the reconnection token as received
    reconnection_tail: [u8; 4],

    state: UeState,
}

impl UeContext {
    pub fn new(
        id: UeId,
        position: Position,
        secured: bool,
        keys: SecurityKeys,
        serving: NodeId,
        serving_amf: AmfId,
    ) -> Self {
        Self {
            id,
            position,
            secured,
            keys,
            serving,
            serving_amf,
            target: None,
            beacons: Vec::new(),
            auth: Ratchet::default(),
            reconnection: Ratchet::default(),
            reconnection_tail: [0; 4],
            state: UeState::Idle,
        }
    }

    pub fn ue_id(&self) -> UeId {
        self.id
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn state(&self) -> UeState {
        self.state
    }

    pub fn serving(&self) -> NodeId {
        self.serving
    }

    pub fn serving_amf(&self) -> AmfId {
        self.serving_amf
    }

    pub fn target(&self) -> Option<Beacon> {
        self.target
    }

    pub fn outcome(&self) -> Option<SessionOutcome> {
        match self.state {
            UeState::Completed(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// Current authentication counter
    pub fn auth_counter(&self) -> u32 {
        self.auth.counter()
    }

    /// Current reconnection counter
    pub fn reconnection_counter(&self) -> u32 {
        self.reconnection.counter()
    }

    /// Store a beacon measurement
    pub fn measure(&mut self, beacons: Vec<Beacon>) {
        self.beacons = beacons;
    }

    /// Strongest measured beacon whose cell is not `exclude`
    ///
    /// Ties keep the earlier beacon.
    pub fn select_target(&self, exclude: Option<NodeId>) -> Option<Beacon> {
        self.beacons
            .iter()
            .filter(|b| Some(b.cell) != exclude)
            .fold(None, |best: Option<Beacon>, b| match best {
                Some(best) if best.power >= b.power => Some(best),
                _ => Some(*b),
            })
    }

    /// Pick the strongest cell and send the measurement report
    ///
    /// Returns `None` without sending anything when the serving node is
    /// already the best cell.
    pub fn start_handover(
        &mut self,
        mailbox: &mut Mailbox,
        rng: &mut dyn RngCore,
    ) -> HandoverResult<Option<Step>> {
        if self.state != UeState::Idle {
            return Err(HandoverError::UnexpectedMessage {
                actor: ActorId::Terminal,
                message: baron_core::MessageType::MeasurementReport,
                state: self.state.name(),
            });
        }

        let best = self.select_target(None).ok_or(HandoverError::NoRecoveryTarget)?;
        if best.cell == self.serving {
            log::debug!("{}: serving {} is already the best cell", self.id, self.serving);
            return Ok(None);
        }
        self.target = Some(best);

        let body = MessageBody::MeasurementReport {
            ue: self.id,
            target: best.cell,
        };
        let msg = if self.secured {
            self.auth = Ratchet::new(rng.next_u32());
            Message::with_token(body, Token::seal(self.auth.counter(), &self.keys.core))
        } else {
            Message::new(body)
        };

        log::debug!("{}: handover toward {} (addr {})", self.id, best.cell, best.addr);
        self.state = UeState::AwaitingHandoverCommand;
        event::send(mailbox, ActorId::Terminal, ActorId::Node(self.serving), msg).map(Some)
    }

    fn finish(&mut self, outcome: SessionOutcome) -> Step {
        log::info!("{}: session finished: {}", self.id, outcome);
        self.state = UeState::Completed(outcome);
        Step::finished(outcome)
    }

    fn handle_handover_command(&mut self, mailbox: &mut Mailbox, msg: &Message) -> HandoverResult<Step> {
        if self.secured {
            let token = msg.require_token()?;
            self.reconnection = Ratchet::new(token.open(&self.keys.core));
            self.reconnection_tail = token.tail();
        }

        let target = self.target.ok_or(HandoverError::NoRecoveryTarget)?;
        self.state = UeState::AwaitingHandoverOutcome;
        event::send(
            mailbox,
            ActorId::Terminal,
            ActorId::Node(target.addr),
            Message::new(MessageBody::RachProcedure),
        )
    }

    fn handle_rach_ok(&mut self, mailbox: &mut Mailbox, msg: &Message) -> HandoverResult<Step> {
        if !self.secured {
            return Ok(self.finish(SessionOutcome::Success));
        }

        let presented = msg.require_token()?.open(&self.keys.core);
        if self.auth.confirm(presented) {
            return Ok(self.finish(SessionOutcome::Success));
        }

        let rejected = self.target.map(|t| t.cell);
        log::warn!(
            "{}: authentication token from {:?} failed verification, starting recovery",
            self.id,
            rejected
        );
        self.start_recovery(mailbox, rejected)
    }

    fn start_recovery(
        &mut self,
        mailbox: &mut Mailbox,
        rejected: Option<NodeId>,
    ) -> HandoverResult<Step> {
        let target = self
            .select_target(rejected)
            .ok_or(HandoverError::NoRecoveryTarget)?;
        self.target = Some(target);

        if target.cell == self.serving {
            let token = Token::from_tail(self.reconnection_tail).mask(&self.keys.access);
            let body = MessageBody::ReconnectionRecovery {
                ue: self.id,
                origin: RecoveryOrigin::TerminalFast,
            };
            self.state = UeState::RecoveryPending(RecoveryPath::Fast);
            event::send(
                mailbox,
                ActorId::Terminal,
                ActorId::Node(self.serving),
                Message::with_token(body, token),
            )
        } else {
            let presented = self.reconnection.advance();
            let body = MessageBody::ReconnectionRecovery {
                ue: self.id,
                origin: RecoveryOrigin::TerminalCore {
                    serving_amf: self.serving_amf,
                },
            };
            self.state = UeState::RecoveryPending(RecoveryPath::Core);
            event::send(
                mailbox,
                ActorId::Terminal,
                ActorId::Node(target.addr),
                Message::with_token(body, Token::seal(presented, &self.keys.core)),
            )
        }
    }

    fn handle_recovery_ok(&mut self, path: RecoveryPath, msg: &Message) -> HandoverResult<Step> {
        let token = msg.require_token()?;
        let accepted = match path {
            RecoveryPath::Fast => {
                let mut ratchet = Ratchet::new(Token::from_tail(self.reconnection_tail).counter());
                ratchet.confirm(token.mask(&self.keys.access).counter())
            }
            RecoveryPath::Core => self.reconnection.confirm(token.open(&self.keys.core)),
        };

        if accepted {
            Ok(self.finish(SessionOutcome::RecoverySuccess))
        } else {
            log::warn!("{}: reconnection token failed verification", self.id);
            Ok(self.finish(SessionOutcome::RecoveryAborted))
        }
    }
}

impl Actor for UeContext {
    fn id(&self) -> ActorId {
        ActorId::Terminal
    }

    fn handle(
        &mut self,
        mailbox: &mut Mailbox,
        msg: Message,
        _rng: &mut dyn RngCore,
    ) -> HandoverResult<Step> {
        log::debug!("{} [{}]: {}", self.id, self.state.name(), msg);

        match (self.state, msg.body()) {
            (UeState::AwaitingHandoverCommand, MessageBody::HandoverCommand) => {
                self.handle_handover_command(mailbox, &msg)
            }
            (UeState::AwaitingHandoverOutcome, MessageBody::RachOk) => {
                self.handle_rach_ok(mailbox, &msg)
            }
            (UeState::RecoveryPending(path), MessageBody::ReconnectionRecoveryOk) => {
                self.handle_recovery_ok(path, &msg)
            }
            (UeState::RecoveryPending(_), MessageBody::ReconnectionRecoveryRejected) => {
                Ok(self.finish(SessionOutcome::RecoveryRejected))
            }
            _ => Err(event::unexpected(ActorId::Terminal, &msg, self.state.name())),
        }
    }
}
