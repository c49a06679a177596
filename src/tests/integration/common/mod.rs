//! Common test utilities
//!
//! Fixed placements over the default deployment, and a small harness that
//! wires the actors by hand so the terminal and the network can be given
//! different keys.

use baron_core::{
    ActorId, AmfId, Mailbox, MessageType, NodeId, SecurityKeys, SessionOutcome, SimConfig, UeId,
};
use baron_sim::{
    Actor, AmfContext, GnbContext, HandoverError, HandoverResult, Position, RogueSite,
    SessionLayout, Topology, UeContext,
};
use rand::RngCore;

/// Terminal next to node 1, served by node 2; both under AMF 1
pub const NEAR_NODE_1: Position = Position::new(210.0, 990.0);

/// Terminal next to node 3 (AMF 1), served by node 8 (AMF 2)
pub const NEAR_NODE_3: Position = Position::new(880.0, 480.0);

/// Default deployment with a small bucket size
pub fn test_config(secured: bool, attacker_present: bool) -> SimConfig {
    SimConfig {
        secured,
        attacker_present,
        rounds: 20,
        max_sessions: 20_000,
        ..SimConfig::default()
    }
}

/// Rogue spoofing `cell`, placed 5 m from the terminal
pub fn rogue_near(topology: &Topology, cell: u32, ue: Position) -> RogueSite {
    RogueSite {
        addr: topology.rogue_addr(),
        cell: NodeId(cell),
        position: Position::new(ue.x + 5.0, ue.y),
    }
}

/// Layout at `ue`, optionally with a rogue spoofing `spoofed`
pub fn layout(topology: &Topology, ue: Position, spoofed: Option<u32>) -> SessionLayout {
    let rogue = spoofed.map(|cell| rogue_near(topology, cell, ue));
    topology
        .layout_at(ue, rogue)
        .expect("default deployment has a serving node")
}

/// Keys that share nothing with the defaults
pub fn foreign_keys() -> SecurityKeys {
    SecurityKeys::new(*b"0123456789abcdef", *b"fedcba9876543210")
}

/// Hand-wired session with separate terminal and network keys
pub struct Harness {
    topology: Topology,
    layout: SessionLayout,
    max_steps: usize,
    pub ue: UeContext,
    pub amfs: Vec<AmfContext>,
    pub nodes: Vec<GnbContext>,
    pub mailbox: Mailbox,
    /// Receiver and type of every delivered message
    pub trace: Vec<(ActorId, MessageType)>,
    /// Highest number of occupied slots seen after any step
    pub max_occupied: usize,
}

impl Harness {
    pub fn new(
        config: &SimConfig,
        layout: SessionLayout,
        network: SecurityKeys,
        terminal: SecurityKeys,
    ) -> Self {
        let topology = Topology::new(config);
        let slots = topology.node_slots();

        let amfs = [AmfId::FIRST, AmfId::SECOND]
            .into_iter()
            .map(|id| {
                let position = topology.amf_position(id).expect("two AMF sites");
                AmfContext::new(id, position, slots, config.secured, &network)
            })
            .collect();

        let mut nodes: Vec<GnbContext> = topology
            .node_ids()
            .map(|id| {
                let position = topology.node_position(id).expect("node site");
                let amf = topology.controller(id).expect("covered node");
                let mut node = GnbContext::legitimate(id, position, config.secured, amf, &network);
                if id == layout.serving {
                    node.set_active_context(Some(UeId(config.ue_id)));
                }
                node
            })
            .collect();
        if let Some(rogue) = layout.rogue {
            nodes.push(GnbContext::rogue(rogue.addr, rogue.cell, rogue.position, config.secured));
        }

        let ue = UeContext::new(
            UeId(config.ue_id),
            layout.ue,
            config.secured,
            terminal,
            layout.serving,
            layout.serving_amf,
        );

        Self {
            topology,
            layout,
            max_steps: config.max_steps,
            ue,
            amfs,
            nodes,
            mailbox: Mailbox::new(),
            trace: Vec::new(),
            max_occupied: 0,
        }
    }

    /// Drive the session to an outcome, `None` if no handover was needed
    pub fn run(&mut self, rng: &mut dyn RngCore) -> HandoverResult<Option<SessionOutcome>> {
        self.ue.measure(self.topology.beacons(&self.layout));
        if self.ue.start_handover(&mut self.mailbox, rng)?.is_none() {
            return Ok(None);
        }
        self.max_occupied = self.mailbox.occupied_count();

        for steps in 0..self.max_steps {
            let id = self
                .mailbox
                .next_occupied()
                .ok_or(HandoverError::Stalled { steps })?;
            let msg = self.mailbox.take(id)?;
            self.trace.push((id, msg.msg_type()));

            let step = match id {
                ActorId::Terminal => self.ue.handle(&mut self.mailbox, msg, rng)?,
                ActorId::Amf(amf) => self
                    .amfs
                    .iter_mut()
                    .find(|a| a.amf_id() == amf)
                    .ok_or(HandoverError::UnknownActor(id))?
                    .handle(&mut self.mailbox, msg, rng)?,
                ActorId::Node(node) => self
                    .nodes
                    .iter_mut()
                    .find(|n| n.node_id() == node)
                    .ok_or(HandoverError::UnknownActor(id))?
                    .handle(&mut self.mailbox, msg, rng)?,
            };
            self.max_occupied = self.max_occupied.max(self.mailbox.occupied_count());

            if let Some(outcome) = step.outcome {
                return Ok(Some(outcome));
            }
        }
        Err(HandoverError::RoundLimitExceeded {
            max_steps: self.max_steps,
        })
    }

    pub fn node(&self, id: u32) -> &GnbContext {
        self.nodes
            .iter()
            .find(|n| n.node_id() == NodeId(id))
            .expect("node exists")
    }

    pub fn amf(&self, id: u32) -> &AmfContext {
        self.amfs
            .iter()
            .find(|a| a.amf_id() == AmfId(id))
            .expect("AMF exists")
    }

    /// Number of deliveries between the two AMFs
    pub fn core_hops(&self) -> usize {
        core_hops(&self.trace)
    }
}

/// Number of AMF-to-AMF deliveries in a trace
pub fn core_hops(trace: &[(ActorId, MessageType)]) -> usize {
    trace
        .windows(2)
        .filter(|pair| matches!((pair[0].0, pair[1].0), (ActorId::Amf(_), ActorId::Amf(_))))
        .count()
}
