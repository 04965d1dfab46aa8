//! Global innovation bookkeeping.
//!
//! Alignment is only meaningful if every structural mutation in the whole
//! run draws its innovation ids and hidden-node ids from one monotonic
//! source. [`InnovationRegistry`] is that source. It is passed by `&mut`
//! into every structural mutation, so the borrow checker serializes
//! allocation; code that mutates genomes in parallel must wrap the
//! registry in a lock.
//!
//! # Node numbering
//!
//! Node ids form three contiguous ranges:
//!
//! ```text
//! outputs [0, O)   inputs [O, O + I)   hidden [O + I, O + I + H)
//! ```
//!
//! `H` only grows.

use std::ops::Range;

/// A consistent read of the global counters, taken once per network build
/// and written in front of serialized genomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Topology {
    /// Highest innovation id allocated so far.
    pub innovations: u64,
    /// Number of input nodes.
    pub inputs: u32,
    /// Number of hidden nodes allocated so far.
    pub hidden: u32,
    /// Number of output nodes.
    pub outputs: u32,
}

impl Topology {
    /// Total number of node ids in use.
    pub fn node_count(&self) -> u32 {
        self.outputs + self.inputs + self.hidden
    }

    /// Output node ids.
    pub fn output_range(&self) -> Range<u32> {
        0..self.outputs
    }

    /// Input node ids.
    pub fn input_range(&self) -> Range<u32> {
        self.outputs..self.outputs + self.inputs
    }

    /// Hidden node ids.
    pub fn hidden_range(&self) -> Range<u32> {
        self.outputs + self.inputs..self.node_count()
    }

    /// Returns `true` if `node` is an output node.
    pub fn is_output(&self, node: u32) -> bool {
        node < self.outputs
    }

    /// Returns `true` if `node` is an input node.
    pub fn is_input(&self, node: u32) -> bool {
        self.input_range().contains(&node)
    }

    /// Position of an input node in the input vector.
    pub fn input_index(&self, node: u32) -> Option<usize> {
        self.is_input(node)
            .then(|| (node - self.outputs) as usize)
    }
}

/// Process-wide counter of innovation ids and hidden nodes.
///
/// Exclusively owned by the trainer; a fresh registry starts with no
/// innovations and no hidden nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnovationRegistry {
    inputs: u32,
    outputs: u32,
    hidden: u32,
    innovations: u64,
}

impl InnovationRegistry {
    /// Creates a registry for the given input/output layout.
    pub fn new(inputs: u32, outputs: u32) -> Self {
        Self {
            inputs,
            outputs,
            hidden: 0,
            innovations: 0,
        }
    }

    /// Resumes counting from a previously taken snapshot.
    pub fn from_topology(topology: Topology) -> Self {
        Self {
            inputs: topology.inputs,
            outputs: topology.outputs,
            hidden: topology.hidden,
            innovations: topology.innovations,
        }
    }

    /// Number of input nodes.
    pub fn inputs(&self) -> u32 {
        self.inputs
    }

    /// Number of output nodes.
    pub fn outputs(&self) -> u32 {
        self.outputs
    }

    /// Hidden nodes allocated so far.
    pub fn hidden(&self) -> u32 {
        self.hidden
    }

    /// Highest innovation id allocated so far.
    pub fn innovations(&self) -> u64 {
        self.innovations
    }

    /// Allocates the next innovation id. Ids start at 1.
    pub fn next_innovation(&mut self) -> u64 {
        self.innovations += 1;
        self.innovations
    }

    /// Allocates a new hidden node and returns its global id.
    pub fn new_node(&mut self) -> u32 {
        self.hidden += 1;
        self.outputs + self.inputs + self.hidden - 1
    }

    /// Snapshot of the current counters.
    pub fn topology(&self) -> Topology {
        Topology {
            innovations: self.innovations,
            inputs: self.inputs,
            hidden: self.hidden,
            outputs: self.outputs,
        }
    }
}
