//! Stage topology and execution.
//!
//! This module provides:
//! - Stage identities and the two fixed topologies
//! - Topology builder with validation
//! - The bounded-loop routers
//! - The sequential pipeline runner

mod router;
mod runner;
mod topology;


pub use router::route;
pub use runner::PipelineRunner;
pub use topology::{
    Edge, RouterKind, StageId, StageNode, Topology, TopologyBuilder,
    TopologyKind,
};
