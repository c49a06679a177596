//! BARON Handover Simulator
//!
//! Actor state machines for the terminal (UE), the access nodes (gNB, with a
//! rogue variant) and the two AMFs, plus the topology, round driver and
//! statistics used to run them.

pub mod amf_sm;     // Mobility-management function
pub mod context;    // Topology, placement, propagation
pub mod driver;     // Session round loop and scenario buckets
pub mod error;      // Error types
pub mod event;      // Actor trait
pub mod gnb_sm;     // Access node, legitimate and rogue
pub mod stats;      // Grouping, median, CSV output
pub mod ue_sm;      // Terminal


pub use amf_sm::{AmfContext, PendingRequest};
pub use context::{Beacon, Position, RogueSite, SessionLayout, Topology};
pub use driver::{Bucket, Session, SessionReport, Simulation, SimulationReport};
pub use error::{HandoverError, HandoverResult};
pub use event::Actor;
pub use gnb_sm::GnbContext;
pub use stats::{OutcomeTally, Sample, Summary};
pub use ue_sm::{RecoveryPath, UeContext, UeState};
