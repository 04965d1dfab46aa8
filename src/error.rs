//! Crate-wide error type.
//!
//! Only boundaries that take external input return errors: configuration,
//! seeding, the genome codec, and the index/slot based trainer API.
//! Exhausted mutations, empty genomes, unresolved recurrent cycles and
//! zero-fitness generations are handled in place and never surface here.

use thiserror::Error;

/// Errors returned by `u-neat`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NeatError {
    /// A [`NeatConfig`](crate::trainer::NeatConfig) parameter is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A topology descriptor is not of the form `innovations.inputs.hidden.outputs`.
    #[error("malformed topology descriptor `{0}`")]
    MalformedTopology(String),

    /// A gene record is not of the form `innovation.input.output.weight.enabled`.
    #[error("malformed gene record `{record}`: {reason}")]
    MalformedGene { record: String, reason: String },

    /// Two genes of one genome carry the same innovation id.
    #[error("innovation {0} appears more than once in a genome")]
    DuplicateInnovation(u64),

    /// A gene references a node outside the topology it was serialized with.
    #[error("gene {innovation} references node {node}, but the topology has {node_count} nodes")]
    UnknownNode {
        innovation: u64,
        node: u32,
        node_count: u32,
    },

    /// Seed genomes were serialized against a different input/output layout.
    #[error("topology has {actual_inputs} inputs and {actual_outputs} outputs, configuration expects {expected_inputs} and {expected_outputs}")]
    TopologyMismatch {
        expected_inputs: u32,
        expected_outputs: u32,
        actual_inputs: u32,
        actual_outputs: u32,
    },

    /// An input vector does not match the configured input count.
    #[error("expected {expected} inputs, got {actual}")]
    InputLength { expected: usize, actual: usize },

    /// No population member exists at this index.
    #[error("no population member at index {0}")]
    UnknownMember(usize),

    /// No simulation slot exists at this index.
    #[error("no simulation slot {0}")]
    UnknownSlot(usize),
}
