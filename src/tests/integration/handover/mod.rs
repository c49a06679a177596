//! Handover Integration Tests
//!
//! Full sessions over the default deployment:
//! - Plain handover under one AMF and across the AMF pair
//! - Rogue node detection with fast and core reconnection recovery
//! - Recovery refused when the terminal holds the wrong keys

use baron_core::{ActorId, AmfId, MessageType, NodeId, SecurityKeys, SessionOutcome};
use baron_crypt::Token;
use baron_sim::stats::write_csv;
use baron_sim::{Bucket, Session, Simulation, Topology, UeState};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::common::{core_hops, foreign_keys, layout, test_config, Harness, NEAR_NODE_1, NEAR_NODE_3};

use MessageType::*;

fn node(id: u32) -> ActorId {
    ActorId::Node(NodeId(id))
}

fn amf(id: u32) -> ActorId {
    ActorId::Amf(AmfId(id))
}

const UE: ActorId = ActorId::Terminal;

// ============================================================================
// Plain handover
// ============================================================================

/// Test: Scenario A, unsecured handover between two nodes of AMF 1
///
/// 1. Terminal reports node 1 to its serving node 2
/// 2. Node 2 asks AMF 1, AMF 1 prepares node 1
/// 3. AMF 1 commands node 2, node 2 relays to the terminal
/// 4. Terminal performs random access at node 1
#[test]
fn test_scenario_a_unsecured_same_amf() {
    let config = test_config(false, false);
    let topology = Topology::new(&config);
    let layout = layout(&topology, NEAR_NODE_1, None);
    assert_eq!(layout.serving, NodeId(2));

    let mut session = Session::with_layout(&topology, &config, SecurityKeys::default(), layout).unwrap();
    let mut rng = StdRng::seed_from_u64(1);
    let report = session.run(&mut rng).unwrap().unwrap();

    assert_eq!(report.outcome, SessionOutcome::Success);
    assert_eq!(
        session.trace(),
        &[
            (node(2), MeasurementReport),
            (amf(1), HandoverRequired),
            (node(1), HandoverRequest),
            (amf(1), HandoverAck),
            (node(2), HandoverCommand),
            (UE, HandoverCommand),
            (node(1), RachProcedure),
            (UE, RachOk),
        ]
    );
    assert_eq!(report.final_target, NodeId(1));
    assert_eq!(report.preferred_bucket(false), Bucket::SameAmf);
    assert_eq!(session.node(NodeId(1)).unwrap().auth_token(), None);
}

/// Test: Scenario B, secured handover from node 8 (AMF 2) to node 3 (AMF 1)
///
/// The request crosses to the peer AMF and the acknowledgement comes back,
/// the authentication counter moves by exactly one end to end.
#[test]
fn test_scenario_b_secured_cross_amf() {
    let config = test_config(true, false);
    let topology = Topology::new(&config);
    let layout = layout(&topology, NEAR_NODE_3, None);
    assert_eq!(layout.serving, NodeId(8));
    assert_eq!(layout.serving_amf, AmfId(2));

    let keys = SecurityKeys::default();
    let mut session = Session::with_layout(&topology, &config, keys, layout).unwrap();
    let mut rng = StdRng::seed_from_u64(2);
    let report = session.run(&mut rng).unwrap().unwrap();

    assert_eq!(report.outcome, SessionOutcome::Success);
    assert_eq!(
        session.trace(),
        &[
            (node(8), MeasurementReport),
            (amf(2), HandoverRequired),
            (amf(1), HandoverRequest),
            (node(3), HandoverRequest),
            (amf(1), HandoverAck),
            (amf(2), HandoverAck),
            (node(8), HandoverCommand),
            (UE, HandoverCommand),
            (node(3), RachProcedure),
            (UE, RachOk),
        ]
    );
    assert_eq!(core_hops(session.trace()), 2);
    assert_eq!(report.preferred_bucket(false), Bucket::CrossAmf);

    // Target node holds the AMF's a + 1, which the terminal adopted
    let stored = session.node(NodeId(3)).unwrap().auth_token().unwrap();
    assert_eq!(stored.open(&keys.core), session.ue().auth_counter());
    assert!(stored.ct_eq(&Token::seal(session.ue().auth_counter(), &keys.core)));

    // Serving node 8 relayed the reconnection token minted by AMF 2
    let relayed = session.node(NodeId(8)).unwrap().reconnection_token().unwrap();
    assert_eq!(relayed, Token::seal(session.ue().reconnection_counter(), &keys.core));

    // Only the serving AMF minted a reconnection token
    let serving_amf = session.amf(AmfId(2)).unwrap();
    assert_eq!(
        serving_amf.reconnection_counter(),
        Some(session.ue().reconnection_counter())
    );
    assert_eq!(session.amf(AmfId(1)).unwrap().reconnection_counter(), None);
    assert_eq!(serving_amf.pending(), None);
    assert_eq!(session.amf(AmfId(1)).unwrap().pending(), None);
}

// ============================================================================
// Attack and recovery
// ============================================================================

/// Test: Scenario C, rogue spoofing node 1 near a terminal served by node 2
///
/// With node 1 excluded the serving node is the best cell again, so the
/// terminal reconnects on the fast path.
#[test]
fn test_scenario_c_fast_reconnection() {
    let config = test_config(true, true);
    let topology = Topology::new(&config);
    let layout = layout(&topology, NEAR_NODE_1, Some(1));

    let mut session = Session::with_layout(&topology, &config, SecurityKeys::default(), layout).unwrap();
    let mut rng = StdRng::seed_from_u64(3);
    let report = session.run(&mut rng).unwrap().unwrap();

    assert_eq!(report.outcome, SessionOutcome::RecoverySuccess);
    assert!(report.attacked);
    assert_eq!(
        &session.trace()[6..],
        &[
            (node(13), RachProcedure),
            (UE, RachOk),
            (node(2), ReconnectionRecovery),
            (UE, ReconnectionRecoveryOk),
        ]
    );
    assert_eq!(report.final_target, NodeId(2));
    assert_eq!(report.preferred_bucket(true), Bucket::ServingReconnect);
}

/// Test: Rogue spoofing node 5, recovery through node 1 verified by AMF 1
#[test]
fn test_same_amf_core_recovery() {
    let config = test_config(true, true);
    let topology = Topology::new(&config);
    let layout = layout(&topology, NEAR_NODE_1, Some(5));

    let mut session = Session::with_layout(&topology, &config, SecurityKeys::default(), layout).unwrap();
    let mut rng = StdRng::seed_from_u64(4);
    let report = session.run(&mut rng).unwrap().unwrap();

    assert_eq!(report.outcome, SessionOutcome::RecoverySuccess);
    assert_eq!(
        &session.trace()[8..],
        &[
            (node(1), ReconnectionRecovery),
            (amf(1), ReconnectionRecovery),
            (node(1), ReconnectionRecoveryOk),
            (UE, ReconnectionRecoveryOk),
        ]
    );
    assert_eq!(report.final_target, NodeId(1));
    assert_eq!(report.preferred_bucket(true), Bucket::SameAmf);

    // Both ends ratcheted by two
    let amf1 = session.amf(AmfId(1)).unwrap();
    assert_eq!(amf1.reconnection_counter(), Some(session.ue().reconnection_counter()));
}

/// Test: Rogue spoofing node 7, recovery through node 3 (AMF 1) while the
/// terminal's reconnection token belongs to AMF 2
#[test]
fn test_cross_amf_core_recovery() {
    let config = test_config(true, true);
    let topology = Topology::new(&config);
    let layout = layout(&topology, NEAR_NODE_3, Some(7));

    let mut session = Session::with_layout(&topology, &config, SecurityKeys::default(), layout).unwrap();
    let mut rng = StdRng::seed_from_u64(5);
    let report = session.run(&mut rng).unwrap().unwrap();

    assert_eq!(report.outcome, SessionOutcome::RecoverySuccess);
    assert_eq!(
        &session.trace()[8..],
        &[
            (node(3), ReconnectionRecovery),
            (amf(1), ReconnectionRecovery),
            (amf(2), ReconnectionRecovery),
            (amf(1), ReconnectionRecoveryOk),
            (node(3), ReconnectionRecoveryOk),
            (UE, ReconnectionRecoveryOk),
        ]
    );
    assert_eq!(core_hops(session.trace()), 2);
    assert_eq!(report.target_amf, AmfId(1));
    assert_eq!(report.preferred_bucket(true), Bucket::CrossAmf);
    assert_eq!(session.amf(AmfId(1)).unwrap().pending(), None);
}

/// Test: Rogue answers without tokens in standard mode and goes unnoticed
#[test]
fn test_rogue_undetected_when_unsecured() {
    let config = test_config(false, true);
    let topology = Topology::new(&config);
    let layout = layout(&topology, NEAR_NODE_1, Some(1));

    let mut session = Session::with_layout(&topology, &config, SecurityKeys::default(), layout).unwrap();
    let mut rng = StdRng::seed_from_u64(6);
    let report = session.run(&mut rng).unwrap().unwrap();

    assert_eq!(report.outcome, SessionOutcome::Success);
    assert_eq!(session.trace().last(), Some(&(UE, RachOk)));
    assert!(session.trace().contains(&(node(13), RachProcedure)));
}

/// Test: Rogue detection over many random placements
#[test]
fn test_rogue_detected_over_random_seeds() {
    let config = test_config(true, true);
    let topology = Topology::new(&config);
    let mut detected = 0;

    for seed in 0..300u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut session = Session::new(&topology, &config, SecurityKeys::default(), &mut rng).unwrap();
        let Some(report) = session.run(&mut rng).unwrap() else {
            continue;
        };
        let first_choice = session.ue().select_target(None).unwrap();
        if first_choice.addr == topology.rogue_addr() {
            assert_eq!(report.outcome, SessionOutcome::RecoverySuccess, "seed {}", seed);
            detected += 1;
        } else {
            assert_eq!(report.outcome, SessionOutcome::Success, "seed {}", seed);
        }
    }
    assert!(detected > 0);
}

// ============================================================================
// Key mismatch
// ============================================================================

/// Test: Terminal with foreign keys is refused on the fast path
#[test]
fn test_fast_recovery_rejected_with_wrong_access_key() {
    let config = test_config(true, true);
    let topology = Topology::new(&config);
    let layout = layout(&topology, NEAR_NODE_1, Some(1));

    let mut harness = Harness::new(&config, layout, SecurityKeys::default(), foreign_keys());
    let mut rng = StdRng::seed_from_u64(7);
    let outcome = harness.run(&mut rng).unwrap();

    assert_eq!(outcome, Some(SessionOutcome::RecoveryRejected));
    assert_eq!(harness.trace.last(), Some(&(UE, ReconnectionRecoveryRejected)));
    assert_eq!(harness.ue.state(), UeState::Completed(SessionOutcome::RecoveryRejected));
}

/// Test: Terminal with foreign keys is refused by its serving AMF
#[test]
fn test_core_recovery_rejected_with_wrong_core_key() {
    let config = test_config(true, true);
    let topology = Topology::new(&config);
    let layout = layout(&topology, NEAR_NODE_1, Some(5));

    let mut harness = Harness::new(&config, layout, SecurityKeys::default(), foreign_keys());
    let mut rng = StdRng::seed_from_u64(8);
    let outcome = harness.run(&mut rng).unwrap();

    assert_eq!(outcome, Some(SessionOutcome::RecoveryRejected));
    assert!(harness.trace.contains(&(amf(1), ReconnectionRecovery)));
    assert_eq!(harness.amf(1).pending(), None);
}

/// Test: A wrong core key alone makes a legitimate target look forged, and
/// the fast path still recovers because it only uses the access key
#[test]
fn test_wrong_core_key_recovers_on_fast_path() {
    let config = test_config(true, false);
    let topology = Topology::new(&config);
    let layout = layout(&topology, NEAR_NODE_1, None);

    let keys = SecurityKeys::default();
    let terminal = SecurityKeys::new(foreign_keys().core, keys.access);
    let mut harness = Harness::new(&config, layout, keys, terminal);
    let mut rng = StdRng::seed_from_u64(9);
    let outcome = harness.run(&mut rng).unwrap();

    assert_eq!(outcome, Some(SessionOutcome::RecoverySuccess));
    assert!(harness.trace.contains(&(node(2), ReconnectionRecovery)));
    assert_eq!(harness.max_occupied, 1);
}

/// Test: Re-selection after the attack lands on the strongest remaining cell
#[test]
fn test_recovery_target_reselected() {
    let config = test_config(true, true);
    let topology = Topology::new(&config);
    let layout = layout(&topology, NEAR_NODE_3, Some(7));

    let mut harness = Harness::new(&config, layout, SecurityKeys::default(), SecurityKeys::default());
    let mut rng = StdRng::seed_from_u64(10);
    let outcome = harness.run(&mut rng).unwrap();

    assert_eq!(outcome, Some(SessionOutcome::RecoverySuccess));
    assert_eq!(harness.ue.target().map(|b| b.cell), Some(NodeId(3)));
    assert_eq!(harness.ue.state(), UeState::Completed(SessionOutcome::RecoverySuccess));
    assert_eq!(harness.node(3).active_context(), None);
    assert_eq!(harness.node(8).active_context(), Some(baron_core::UeId(config.ue_id)));
    assert_eq!(harness.core_hops(), 2);
}

// ============================================================================
// Simulation
// ============================================================================

/// Test: Full simulation under attack fills every bucket
#[test]
fn test_simulation_under_attack() {
    let simulation = Simulation::new(test_config(true, true)).unwrap();
    let report = simulation.run().unwrap();

    assert!(report.is_complete());
    assert_eq!(report.mode_tag(), "patch_att");
    assert!(report.outcomes.get(SessionOutcome::RecoverySuccess) > 0);
    assert_eq!(report.outcomes.get(SessionOutcome::RecoveryRejected), 0);
    assert_eq!(report.outcomes.get(SessionOutcome::RecoveryAborted), 0);

    for bucket in Bucket::ALL {
        let summary = report.summary(bucket);
        assert_eq!(summary.count, 20);
        assert!(summary.median.unwrap() > 0.0);

        let mut csv = Vec::new();
        write_csv(&mut csv, &summary.samples).unwrap();
        let text = String::from_utf8(csv).unwrap();
        assert_eq!(text.lines().count(), summary.samples.len());
        let total: u64 = text
            .lines()
            .map(|line| line.split(';').nth(1).unwrap().parse::<u64>().unwrap())
            .sum();
        assert_eq!(total, 20);
    }
}

/// Test: Standard handover never runs recovery, even with the rogue present
#[test]
fn test_simulation_standard_mode() {
    let simulation = Simulation::new(test_config(false, true)).unwrap();
    let report = simulation.run().unwrap();

    assert_eq!(report.mode_tag(), "std");
    assert_eq!(report.outcomes.recoveries(), 0);
    assert!(report.timings(Bucket::SameAmf).len() >= 20);
}
