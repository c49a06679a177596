//! Round Driver
//!
//! A [`Session`] builds one fresh set of actors for a placement, lets the
//! terminal start the handover and then services the single occupied mailbox
//! until the terminal reports an outcome. Each step is timed and the hop it
//! produced is priced with the propagation model.
//!
//! A [`Simulation`] runs sessions until every scenario bucket is full.

use std::time::Instant;

use baron_core::{
    ActorId, AmfId, ConfigResult, Mailbox, Message, MessageType, NodeId, SecurityKeys,
    SessionOutcome, SimConfig, Step, UeId,
};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::amf_sm::AmfContext;
use crate::context::{SessionLayout, Topology};
use crate::error::{HandoverError, HandoverResult};
use crate::event::Actor;
use crate::gnb_sm::GnbContext;
use crate::stats::{OutcomeTally, Summary};
use crate::ue_sm::UeContext;

/// Scenario bucket a finished session's timing is recorded in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Bucket {
    /// Final target controlled by the serving AMF
    SameAmf,
    /// Final target controlled by the peer AMF
    CrossAmf,
    /// Attack recovered through the serving node
    ServingReconnect,
}

impl Bucket {
    pub const ALL: [Bucket; 3] = [Bucket::SameAmf, Bucket::CrossAmf, Bucket::ServingReconnect];

    pub fn name(self) -> &'static str {
        match self {
            Bucket::SameAmf => "same-amf",
            Bucket::CrossAmf => "cross-amf",
            Bucket::ServingReconnect => "serving-reconnect",
        }
    }

    /// 1-based scenario number used in result file names
    pub fn number(self) -> usize {
        match self {
            Bucket::SameAmf => 1,
            Bucket::CrossAmf => 2,
            Bucket::ServingReconnect => 3,
        }
    }

    fn index(self) -> usize {
        self.number() - 1
    }

    /// Buckets in use for a run, the last one only when recovery can happen
    pub fn active(recovery: bool) -> &'static [Bucket] {
        if recovery {
            &Bucket::ALL
        } else {
            &Bucket::ALL[..2]
        }
    }
}

/// Result of one finished session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionReport {
    pub outcome: SessionOutcome,
    /// Handling time plus propagation, seconds
    pub elapsed: f64,
    /// Handled messages
    pub steps: usize,
    pub serving: NodeId,
    pub serving_amf: AmfId,
    /// Cell the terminal ended up targeting, re-selected on attack
    pub final_target: NodeId,
    pub target_amf: AmfId,
    pub attacked: bool,
}

impl SessionReport {
    /// Preferred bucket, before accounting for full buckets
    pub fn preferred_bucket(&self, recovery: bool) -> Bucket {
        if recovery && self.final_target == self.serving {
            Bucket::ServingReconnect
        } else if self.target_amf != self.serving_amf {
            Bucket::CrossAmf
        } else {
            Bucket::SameAmf
        }
    }
}

/// One handover session
pub struct Session<'a> {
    topology: &'a Topology,
    layout: SessionLayout,
    max_steps: usize,
    ue: UeContext,
    amfs: Vec<AmfContext>,
    nodes: Vec<GnbContext>,
    mailbox: Mailbox,
    /// Delivered messages in order
    trace: Vec<(ActorId, MessageType)>,
}

impl<'a> Session<'a> {
    /// Session with a random placement
    pub fn new(
        topology: &'a Topology,
        config: &SimConfig,
        keys: SecurityKeys,
        rng: &mut dyn RngCore,
    ) -> HandoverResult<Self> {
        let layout = topology.random_layout(rng)?;
        Self::with_layout(topology, config, keys, layout)
    }

    /// Session for a given placement
    pub fn with_layout(
        topology: &'a Topology,
        config: &SimConfig,
        keys: SecurityKeys,
        layout: SessionLayout,
    ) -> HandoverResult<Self> {
        let ue_id = UeId(config.ue_id);
        let slots = topology.node_slots();

        let amfs = [AmfId::FIRST, AmfId::SECOND]
            .into_iter()
            .map(|id| {
                let position = topology
                    .amf_position(id)
                    .ok_or(HandoverError::UnknownActor(ActorId::Amf(id)))?;
                Ok(AmfContext::new(id, position, slots, config.secured, &keys))
            })
            .collect::<HandoverResult<Vec<_>>>()?;

        let mut nodes = topology
            .node_ids()
            .map(|id| {
                let position = topology
                    .node_position(id)
                    .ok_or(HandoverError::UnknownActor(ActorId::Node(id)))?;
                let amf = topology.controller(id)?;
                let mut node = GnbContext::legitimate(id, position, config.secured, amf, &keys);
                if id == layout.serving {
                    node.set_active_context(Some(ue_id));
                }
                Ok(node)
            })
            .collect::<HandoverResult<Vec<_>>>()?;

        if let Some(rogue) = layout.rogue {
            nodes.push(GnbContext::rogue(rogue.addr, rogue.cell, rogue.position, config.secured));
        }

        let ue = UeContext::new(
            ue_id,
            layout.ue,
            config.secured,
            keys,
            layout.serving,
            layout.serving_amf,
        );

        Ok(Self {
            topology,
            layout,
            max_steps: config.max_steps,
            ue,
            amfs,
            nodes,
            mailbox: Mailbox::new(),
            trace: Vec::new(),
        })
    }

    pub fn layout(&self) -> &SessionLayout {
        &self.layout
    }

    pub fn ue(&self) -> &UeContext {
        &self.ue
    }

    pub fn amf(&self, id: AmfId) -> Option<&AmfContext> {
        self.amfs.iter().find(|amf| amf.amf_id() == id)
    }

    pub fn node(&self, id: NodeId) -> Option<&GnbContext> {
        self.nodes.iter().find(|node| node.node_id() == id)
    }

    pub fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    /// Receiver and type of every delivered message
    pub fn trace(&self) -> &[(ActorId, MessageType)] {
        &self.trace
    }

    /// Run to an outcome
    ///
    /// Returns `None` when the serving node is already the best cell and no
    /// handover takes place.
    pub fn run(&mut self, rng: &mut dyn RngCore) -> HandoverResult<Option<SessionReport>> {
        self.ue.measure(self.topology.beacons(&self.layout));

        let started = Instant::now();
        let Some(first) = self.ue.start_handover(&mut self.mailbox, rng)? else {
            return Ok(None);
        };
        let mut elapsed = started.elapsed().as_secs_f64() + self.price(ActorId::Terminal, &first)?;

        let mut steps = 0usize;
        let outcome = loop {
            if steps >= self.max_steps {
                return Err(HandoverError::RoundLimitExceeded {
                    max_steps: self.max_steps,
                });
            }
            let occupied = self.mailbox.occupied_count();
            if occupied > 1 {
                return Err(HandoverError::MultiplePending { occupied });
            }
            let id = self
                .mailbox
                .next_occupied()
                .ok_or(HandoverError::Stalled { steps })?;
            let msg = self.mailbox.take(id)?;
            self.trace.push((id, msg.msg_type()));

            let started = Instant::now();
            let step = self.dispatch(id, msg, rng)?;
            elapsed += started.elapsed().as_secs_f64() + self.price(id, &step)?;
            steps += 1;

            if let Some(outcome) = step.outcome {
                break outcome;
            }
        };

        let final_target = self
            .ue
            .target()
            .map(|beacon| beacon.cell)
            .ok_or(HandoverError::NoRecoveryTarget)?;

        let report = SessionReport {
            outcome,
            elapsed,
            steps,
            serving: self.layout.serving,
            serving_amf: self.layout.serving_amf,
            final_target,
            target_amf: self.topology.controller(final_target)?,
            attacked: outcome.is_recovery(),
        };
        log::debug!(
            "session done: {} in {} steps, {:.9}s ({} -> {})",
            report.outcome,
            report.steps,
            report.elapsed,
            report.serving,
            report.final_target
        );
        Ok(Some(report))
    }

    fn dispatch(&mut self, id: ActorId, msg: Message, rng: &mut dyn RngCore) -> HandoverResult<Step> {
        match id {
            ActorId::Terminal => self.ue.handle(&mut self.mailbox, msg, rng),
            ActorId::Amf(amf) => self
                .amfs
                .iter_mut()
                .find(|a| a.amf_id() == amf)
                .ok_or(HandoverError::UnknownActor(id))?
                .handle(&mut self.mailbox, msg, rng),
            ActorId::Node(node) => self
                .nodes
                .iter_mut()
                .find(|n| n.node_id() == node)
                .ok_or(HandoverError::UnknownActor(id))?
                .handle(&mut self.mailbox, msg, rng),
        }
    }

    /// Propagation delay of the hop `step` took from `from`
    fn price(&self, from: ActorId, step: &Step) -> HandoverResult<f64> {
        if step.link.is_none() {
            return Ok(0.0);
        }
        let Some(to) = self.mailbox.next_occupied() else {
            return Ok(0.0);
        };
        self.topology
            .delay(&self.layout, from, to)
            .ok_or(HandoverError::UnknownActor(to))
    }
}

/// Aggregate result of a simulation run
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationReport {
    pub secured: bool,
    pub attacker_present: bool,
    pub rounds: usize,
    /// Sessions run, including ones without a handover
    pub sessions: usize,
    /// Sessions skipped because the serving node was already best
    pub skipped: usize,
    /// Sessions whose bucket was full on arrival
    pub discarded: usize,
    pub outcomes: OutcomeTally,
    /// Recorded timings per bucket
    pub timings: [Vec<f64>; 3],
}

impl SimulationReport {
    pub fn timings(&self, bucket: Bucket) -> &[f64] {
        &self.timings[bucket.index()]
    }

    pub fn summary(&self, bucket: Bucket) -> Summary {
        Summary::from_values(self.timings(bucket), self.rounds)
    }

    /// Buckets this run fills
    pub fn buckets(&self) -> &'static [Bucket] {
        Bucket::active(self.secured && self.attacker_present)
    }

    pub fn is_complete(&self) -> bool {
        self.buckets()
            .iter()
            .all(|b| self.timings(*b).len() >= self.rounds)
    }

    /// Mode tag used in result file names
    pub fn mode_tag(&self) -> &'static str {
        match (self.secured, self.attacker_present) {
            (false, _) => "std",
            (true, false) => "patch",
            (true, true) => "patch_att",
        }
    }
}

/// Multi-session run over one configuration
pub struct Simulation {
    config: SimConfig,
    keys: SecurityKeys,
    topology: Topology,
}

impl Simulation {
    /// Validate `config` and parse its keys
    pub fn new(config: SimConfig) -> ConfigResult<Self> {
        let keys = config.security_keys()?;
        Self::with_keys(config, keys)
    }

    /// Simulation with keys that were already parsed
    pub fn with_keys(config: SimConfig, keys: SecurityKeys) -> ConfigResult<Self> {
        config.validate()?;
        let topology = Topology::new(&config);
        Ok(Self { config, keys, topology })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Run from the configured seed
    pub fn run(&self) -> HandoverResult<SimulationReport> {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        self.run_with(&mut rng)
    }

    pub fn run_with(&self, rng: &mut dyn RngCore) -> HandoverResult<SimulationReport> {
        let attacker_present = self.topology.attacker_present();
        let rounds = self.config.rounds;

        let mut report = SimulationReport {
            secured: self.config.secured,
            attacker_present,
            rounds,
            sessions: 0,
            skipped: 0,
            discarded: 0,
            outcomes: OutcomeTally::default(),
            timings: Default::default(),
        };

        log::info!(
            "Simulating {} handover{} ({} rounds per bucket, seed {})",
            if self.config.secured { "BARON" } else { "standard" },
            if attacker_present { " under attack" } else { "" },
            rounds,
            self.config.seed
        );

        while !report.is_complete() {
            if report.sessions >= self.config.max_sessions {
                log::warn!(
                    "Stopping after {} sessions with incomplete buckets",
                    report.sessions
                );
                break;
            }
            report.sessions += 1;

            let mut session = Session::new(&self.topology, &self.config, self.keys, rng)?;
            let Some(result) = session.run(rng)? else {
                report.skipped += 1;
                continue;
            };
            report.outcomes.record(result.outcome);

            match self.place(&report, &result) {
                Some(bucket) => report.timings[bucket.index()].push(result.elapsed),
                None => report.discarded += 1,
            }
        }

        log::info!(
            "Simulation finished after {} sessions: {}",
            report.sessions,
            report.outcomes
        );
        Ok(report)
    }

    /// Bucket with room for `result`, falling through full buckets
    fn place(&self, report: &SimulationReport, result: &SessionReport) -> Option<Bucket> {
        let candidates: &[Bucket] = match result.preferred_bucket(report.secured && report.attacker_present) {
            Bucket::ServingReconnect => &[Bucket::ServingReconnect, Bucket::SameAmf],
            Bucket::CrossAmf => &[Bucket::CrossAmf, Bucket::SameAmf],
            Bucket::SameAmf => &[Bucket::SameAmf],
        };
        candidates
            .iter()
            .copied()
            .find(|bucket| report.timings(*bucket).len() < report.rounds)
    }
}
