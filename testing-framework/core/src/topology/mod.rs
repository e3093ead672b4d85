pub mod config;
pub mod generation;
pub mod invariants;

pub use config::{TopologyBuildError, TopologyBuilder, TopologyConfig};
pub use generation::{AccountGraph, AccountId, Edge, GeneratedTopology, preferential_attachment};
