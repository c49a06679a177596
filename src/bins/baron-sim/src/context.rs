//! Deployment context
//!
//! Static site positions, per-session placement of the terminal and the rogue
//! node, beacon measurement and propagation delay. None of this affects
//! protocol decisions; it feeds target selection and timing only.

use baron_core::{ActorId, AmfId, Coverage, Link, NodeId, SimConfig, Site};
use rand::{Rng, RngCore};

use crate::error::{HandoverError, HandoverResult};

/// Propagation speed over the air, m/s
pub const LIGHT_SPEED_FREE: f64 = 3e8;

/// Propagation speed over wired links, m/s
pub const LIGHT_SPEED_WIRE: f64 = 2e8;

/// Planar position in meters
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance
    pub fn distance(&self, other: &Position) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl From<Site> for Position {
    fn from(site: Site) -> Self {
        Self::new(site.x, site.y)
    }
}

/// One beacon as measured by the terminal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Beacon {
    /// Received power, `tx_power / d^2`
    pub power: f64,
    /// Advertised cell id
    pub cell: NodeId,
    /// Radio address the terminal reaches this transmitter on
    pub addr: NodeId,
}

/// One-way propagation delay in seconds
pub fn propagation_delay(distance: f64, link: Link) -> f64 {
    let speed = if link.is_wireless() {
        LIGHT_SPEED_FREE
    } else {
        LIGHT_SPEED_WIRE
    };
    distance / speed
}

/// Uniform in `[max(center - radius, 0), center + radius)`
fn near(center: f64, radius: f64, rng: &mut dyn RngCore) -> f64 {
    let lo = (center - radius).max(0.0);
    let hi = center + radius;
    if lo < hi {
        rng.random_range(lo..hi)
    } else {
        center
    }
}

/// Rogue node placement for one session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RogueSite {
    /// Mailbox address
    pub addr: NodeId,
    /// Spoofed cell id of a legitimate node
    pub cell: NodeId,
    pub position: Position,
}

/// Per-session placement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionLayout {
    pub ue: Position,
    /// Second-closest legitimate node, holds the terminal's active context
    pub serving: NodeId,
    pub serving_amf: AmfId,
    pub rogue: Option<RogueSite>,
}

/// Static deployment: AMF and legitimate node sites
#[derive(Debug, Clone)]
pub struct Topology {
    amfs: Vec<Position>,
    nodes: Vec<Position>,
    coverage: Coverage,
    area: (f64, f64),
    tx_power: f64,
    rogue_radius: f64,
    attacker_present: bool,
}

impl Topology {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            amfs: config.amfs.iter().copied().map(Position::from).collect(),
            nodes: config.nodes.iter().copied().map(Position::from).collect(),
            coverage: config.coverage(),
            area: (config.area.width, config.area.height),
            tx_power: config.tx_power,
            rogue_radius: config.rogue_radius,
            attacker_present: config.attacker_present,
        }
    }

    pub fn coverage(&self) -> Coverage {
        self.coverage
    }

    /// Number of legitimate nodes
    pub fn num_nodes(&self) -> u32 {
        self.nodes.len() as u32
    }

    /// Number of node mailbox slots, the rogue included
    pub fn node_slots(&self) -> u32 {
        self.num_nodes() + u32::from(self.attacker_present)
    }

    /// Legitimate node ids in order
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (1..=self.num_nodes()).map(NodeId)
    }

    /// Mailbox address of the rogue node
    pub fn rogue_addr(&self) -> NodeId {
        NodeId(self.num_nodes() + 1)
    }

    pub fn attacker_present(&self) -> bool {
        self.attacker_present
    }

    pub fn node_position(&self, id: NodeId) -> Option<Position> {
        let index = (id.0 as usize).checked_sub(1)?;
        self.nodes.get(index).copied()
    }

    pub fn amf_position(&self, id: AmfId) -> Option<Position> {
        let index = (id.0 as usize).checked_sub(1)?;
        self.amfs.get(index).copied()
    }

    pub fn controller(&self, node: NodeId) -> HandoverResult<AmfId> {
        self.coverage
            .controller(node)
            .ok_or(HandoverError::NoController(node))
    }

    /// Second-closest legitimate node to `ue`
    ///
    /// Ties keep the lower node id first.
    pub fn second_closest(&self, ue: Position) -> HandoverResult<NodeId> {
        let mut ranked: Vec<(f64, NodeId)> = self
            .node_ids()
            .zip(self.nodes.iter())
            .map(|(id, pos)| (ue.distance(pos), id))
            .collect();
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        ranked
            .get(1)
            .map(|(_, id)| *id)
            .ok_or(HandoverError::NoRecoveryTarget)
    }

    /// Deterministic layout for a given terminal position
    pub fn layout_at(&self, ue: Position, rogue: Option<RogueSite>) -> HandoverResult<SessionLayout> {
        let serving = self.second_closest(ue)?;
        Ok(SessionLayout {
            ue,
            serving,
            serving_amf: self.controller(serving)?,
            rogue,
        })
    }

    /// Random layout: terminal uniform in the area, rogue near the terminal
    pub fn random_layout(&self, rng: &mut dyn RngCore) -> HandoverResult<SessionLayout> {
        let ue = Position::new(
            rng.random_range(0.0..self.area.0),
            rng.random_range(0.0..self.area.1),
        );
        let mut layout = self.layout_at(ue, None)?;
        if self.attacker_present {
            layout.rogue = Some(self.place_rogue(ue, layout.serving, rng));
        }
        Ok(layout)
    }

    /// Rogue spoofing a legitimate cell other than `serving`, within
    /// `rogue_radius` of the terminal on each axis (clamped at 0)
    pub fn place_rogue(&self, ue: Position, serving: NodeId, rng: &mut dyn RngCore) -> RogueSite {
        let candidates: Vec<NodeId> = self.node_ids().filter(|id| *id != serving).collect();
        let cell = candidates[rng.random_range(0..candidates.len())];

        let x = near(ue.x, self.rogue_radius, rng);
        let y = near(ue.y, self.rogue_radius, rng);

        RogueSite {
            addr: self.rogue_addr(),
            cell,
            position: Position::new(x, y),
        }
    }

    /// Beacons received at the terminal: legitimate nodes in id order, then
    /// the rogue
    pub fn beacons(&self, layout: &SessionLayout) -> Vec<Beacon> {
        let mut beacons: Vec<Beacon> = self
            .node_ids()
            .zip(self.nodes.iter())
            .map(|(id, pos)| Beacon {
                power: self.received_power(layout.ue, *pos),
                cell: id,
                addr: id,
            })
            .collect();
        if let Some(rogue) = layout.rogue {
            beacons.push(Beacon {
                power: self.received_power(layout.ue, rogue.position),
                cell: rogue.cell,
                addr: rogue.addr,
            });
        }
        beacons
    }

    fn received_power(&self, ue: Position, node: Position) -> f64 {
        self.tx_power / ue.distance(&node).powi(2)
    }

    /// Position of any actor in this layout
    pub fn position(&self, layout: &SessionLayout, id: ActorId) -> Option<Position> {
        match id {
            ActorId::Terminal => Some(layout.ue),
            ActorId::Amf(amf) => self.amf_position(amf),
            ActorId::Node(node) => match layout.rogue {
                Some(rogue) if rogue.addr == node => Some(rogue.position),
                _ => self.node_position(node),
            },
        }
    }

    /// Propagation delay of a hop between two actors
    pub fn delay(&self, layout: &SessionLayout, from: ActorId, to: ActorId) -> Option<f64> {
        let link = Link::between(from, to)?;
        let a = self.position(layout, from)?;
        let b = self.position(layout, to)?;
        Some(propagation_delay(a.distance(&b), link))
    }
}
