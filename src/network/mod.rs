//! Executable networks built from genomes.
//!
//! [`Network::build`] turns a [`Genome`](crate::genome::Genome) and a
//! [`Topology`](crate::genome::Topology) snapshot into weight matrices;
//! [`Network::execute`] maps an input vector to a decision index. Networks
//! may contain cycles; execution relaxes node values over a bounded number
//! of rounds instead of relying on a layer order.
//!
//! # Key Types
//!
//! - [`Network`]: matrices plus evaluation mask
//! - [`NodeValue`]: `Pending | Resolved(f64)` mask entry
//! - [`NetworkSettings`]: bias and activation functions
//! - [`Activation`], [`OutputActivation`]: hidden and output activations

mod activation;
mod types;

pub use activation::{Activation, OutputActivation};
pub use types::{build_network, Network, NetworkSettings, NodeValue, DECISION_SLOTS};
