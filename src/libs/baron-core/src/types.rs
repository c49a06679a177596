//! Actor identities and step results
//!
//! Every actor in the simulation is addressed by an [`ActorId`]. The ordering
//! of `ActorId` is the dispatch order used by the round driver: the terminal
//! first, then the AMFs, then the access nodes.

use std::fmt;
use std::ops::RangeInclusive;

/// Access node (gNB) identity, 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

/// Mobility-management function identity (1 or 2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AmfId(pub u32);

/// Terminal identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UeId(pub u32);

impl AmfId {
    pub const FIRST: AmfId = AmfId(1);
    pub const SECOND: AmfId = AmfId(2);

    /// The other AMF of the redundant pair
    pub fn peer(self) -> AmfId {
        if self == Self::FIRST {
            Self::SECOND
        } else {
            Self::FIRST
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gNB-{}", self.0)
    }
}

impl fmt::Display for AmfId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AMF-{}", self.0)
    }
}

impl fmt::Display for UeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UE-{}", self.0)
    }
}

/// Mailbox address of an actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActorId {
    /// The mobile terminal (single slot)
    Terminal,
    /// A mobility-management function
    Amf(AmfId),
    /// An access node, legitimate or rogue
    Node(NodeId),
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActorId::Terminal => write!(f, "UE"),
            ActorId::Amf(id) => id.fmt(f),
            ActorId::Node(id) => id.fmt(f),
        }
    }
}

/// Transmission category of one hop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Link {
    /// Terminal <-> access node, over the air
    Radio,
    /// Access node <-> AMF
    Backhaul,
    /// AMF <-> AMF
    Core,
    /// Access node <-> access node
    Xn,
}

impl Link {
    /// Category of a hop between two actors, `None` for pairs that never talk
    pub fn between(from: ActorId, to: ActorId) -> Option<Link> {
        use ActorId::*;
        match (from, to) {
            (Terminal, Node(_)) | (Node(_), Terminal) => Some(Link::Radio),
            (Node(_), Amf(_)) | (Amf(_), Node(_)) => Some(Link::Backhaul),
            (Amf(_), Amf(_)) => Some(Link::Core),
            (Node(_), Node(_)) => Some(Link::Xn),
            _ => None,
        }
    }

    pub fn is_wireless(self) -> bool {
        matches!(self, Link::Radio)
    }
}

/// Terminal outcome of one handover session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionOutcome {
    /// Handover completed, token (if any) verified
    Success,
    /// Attack detected and the session was recovered
    RecoverySuccess,
    /// Attack detected and the recovery request was refused
    RecoveryRejected,
    /// Attack detected and the recovery answer failed verification
    RecoveryAborted,
}

impl SessionOutcome {
    pub const ALL: [SessionOutcome; 4] = [
        SessionOutcome::Success,
        SessionOutcome::RecoverySuccess,
        SessionOutcome::RecoveryRejected,
        SessionOutcome::RecoveryAborted,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SessionOutcome::Success => "Success",
            SessionOutcome::RecoverySuccess => "RecoverySuccess",
            SessionOutcome::RecoveryRejected => "RecoveryRejected",
            SessionOutcome::RecoveryAborted => "RecoveryAborted",
        }
    }

    /// True for every outcome reached through the recovery path
    pub fn is_recovery(self) -> bool {
        !matches!(self, SessionOutcome::Success)
    }
}

impl fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Side effects of one handling step, reported back to the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Step {
    /// Category of the hop taken by the emitted message, if one was emitted
    pub link: Option<Link>,
    /// Set when the terminal reached a final state
    pub outcome: Option<SessionOutcome>,
}

impl Step {
    /// Nothing emitted
    pub fn none() -> Self {
        Self::default()
    }

    pub fn sent(link: Option<Link>) -> Self {
        Self { link, outcome: None }
    }

    pub fn finished(outcome: SessionOutcome) -> Self {
        Self { link: None, outcome: Some(outcome) }
    }
}

/// Static split of access nodes between the two AMFs
///
/// With `n = num_nodes / 2`, AMF 1 owns nodes `1..=n` and AMF 2 owns
/// `n + 1..=2n`. `num_nodes` counts every node slot, the rogue included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coverage {
    per_amf: u32,
}

impl Coverage {
    pub fn new(num_nodes: u32) -> Self {
        Self { per_amf: num_nodes / 2 }
    }

    pub fn per_amf(&self) -> u32 {
        self.per_amf
    }

    pub fn nodes_of(&self, amf: AmfId) -> RangeInclusive<u32> {
        let start = (amf.0.saturating_sub(1)) * self.per_amf + 1;
        start..=start + self.per_amf - 1
    }

    /// Controlling AMF of `node`, `None` if the node is outside the partition
    pub fn controller(&self, node: NodeId) -> Option<AmfId> {
        [AmfId::FIRST, AmfId::SECOND]
            .into_iter()
            .find(|amf| self.owns(*amf, node))
    }

    pub fn owns(&self, amf: AmfId, node: NodeId) -> bool {
        self.per_amf > 0 && self.nodes_of(amf).contains(&node.0)
    }
}
