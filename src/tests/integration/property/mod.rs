//! Property-based tests for full handover sessions
//!
//! Random placements and seeds over the default deployment, checking the
//! single-message discipline and that a secured terminal always recovers
//! from the rogue node.

use baron_core::{ActorId, MessageType, NodeId, SecurityKeys, SessionOutcome};
use baron_sim::{Position, Topology};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::common::{layout, test_config, Harness, NEAR_NODE_1, NEAR_NODE_3};

// ============================================================================
// Strategies
// ============================================================================

fn arb_anchor() -> impl Strategy<Value = Position> {
    prop_oneof![Just(NEAR_NODE_1), Just(NEAR_NODE_3)]
}

fn arb_cell() -> impl Strategy<Value = u32> {
    1u32..=12
}

// ============================================================================
// Mailbox discipline
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// At most one message is ever in flight, and every handover starts at
    /// the serving node and ends at the terminal
    #[test]
    fn prop_single_message_in_flight(
        seed in any::<u64>(),
        secured in any::<bool>(),
        attacker in any::<bool>(),
    ) {
        let config = test_config(secured, attacker);
        let topology = Topology::new(&config);
        let mut rng = StdRng::seed_from_u64(seed);
        let layout = topology.random_layout(&mut rng).unwrap();
        let serving = layout.serving;

        let mut harness = Harness::new(&config, layout, SecurityKeys::default(), SecurityKeys::default());
        let outcome = harness.run(&mut rng).unwrap();

        prop_assert!(harness.max_occupied <= 1);
        prop_assert!(harness.mailbox.is_empty());

        if outcome.is_some() {
            prop_assert_eq!(
                harness.trace.first().copied(),
                Some((ActorId::Node(serving), MessageType::MeasurementReport))
            );
            prop_assert_eq!(harness.trace.last().map(|(id, _)| *id), Some(ActorId::Terminal));
        } else {
            prop_assert!(harness.trace.is_empty());
        }
    }
}

// ============================================================================
// Recovery
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Whatever cell the rogue spoofs, a secured terminal detects it and
    /// reconnects through a legitimate node
    #[test]
    fn prop_spoofed_cell_always_recovered(
        anchor in arb_anchor(),
        cell in arb_cell(),
        seed in any::<u64>(),
    ) {
        let config = test_config(true, true);
        let topology = Topology::new(&config);
        let unspoofed = layout(&topology, anchor, None);
        prop_assume!(NodeId(cell) != unspoofed.serving);

        let layout = layout(&topology, anchor, Some(cell));
        let mut harness = Harness::new(&config, layout, SecurityKeys::default(), SecurityKeys::default());
        let mut rng = StdRng::seed_from_u64(seed);
        let outcome = harness.run(&mut rng).unwrap();

        prop_assert_eq!(outcome, Some(SessionOutcome::RecoverySuccess));
        let target = harness.ue.target().map(|b| b.cell);
        prop_assert!(target.is_some());
        prop_assert_ne!(target, Some(NodeId(cell)));
    }
}
