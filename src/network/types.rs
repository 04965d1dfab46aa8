//! Network construction and execution.
//!
//! A [`Network`] is a rebuildable, read-only view of a genome:
//!
//! - an `N x N` matrix between the *active* nodes (every input or hidden
//!   node that is the source of at least one enabled gene),
//! - an `N x O` matrix from active nodes to outputs,
//! - a seed mask of [`NodeValue`]s: inputs start resolved, hidden nodes
//!   start pending.
//!
//! The active ordering is first-seen order over the genome, not node id
//! order, so the hidden matrix can hold edges pointing in either direction.
//! Execution therefore relaxes the mask repeatedly instead of doing one
//! matrix product.

use super::activation::{Activation, OutputActivation};
use crate::genome::{Genome, Topology};
use std::collections::HashMap;

/// Number of leading outputs a decision is taken over.
pub const DECISION_SLOTS: usize = 4;

/// A node's value during one evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeValue {
    /// Not yet known this evaluation.
    Pending,
    /// Final activated value.
    Resolved(f64),
}

impl NodeValue {
    /// Returns `true` if the value is still unknown.
    pub fn is_pending(&self) -> bool {
        matches!(self, NodeValue::Pending)
    }
}

/// Evaluation parameters shared by every network of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NetworkSettings {
    /// Added to every node sum and every output sum before activation.
    pub bias: f64,
    /// Hidden-node activation.
    pub activation: Activation,
    /// Output-layer activation.
    pub output_activation: OutputActivation,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            bias: 1.0,
            activation: Activation::Tanh,
            output_activation: OutputActivation::Softmax,
        }
    }
}

/// Weighted input arriving at one active node during a relaxation round.
#[derive(Debug, Clone, Copy, Default)]
struct Incoming {
    /// Sum over resolved sources.
    sum: f64,
    /// Some weighted source is still pending.
    blocked: bool,
}

/// Executable form of a genome.
///
/// Immutable after [`build`](Network::build); [`execute`](Network::execute)
/// takes `&self`, so one network may be evaluated from several threads.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Network {
    /// Active index -> global node id.
    nodes: Vec<u32>,
    /// Row-major `[source][destination]`, `nodes.len()` squared.
    hidden: Vec<f64>,
    /// Row-major `[source][output]`, `nodes.len() * outputs`.
    output: Vec<f64>,
    /// Initial mask for every evaluation.
    seed: Vec<NodeValue>,
    /// `(active index, input vector index)` for every active input node.
    input_slots: Vec<(usize, usize)>,
    outputs: usize,
    settings: NetworkSettings,
}

/// Builds a network from a genome and a topology snapshot.
///
/// Equivalent to [`Network::build`].
pub fn build_network(genome: &Genome, topology: &Topology, settings: NetworkSettings) -> Network {
    Network::build(genome, topology, settings)
}

impl Network {
    /// Builds a network from the enabled genes of `genome`.
    ///
    /// Genes ending in a hidden node that has no enabled outgoing gene lead
    /// nowhere and are dropped. A genome without enabled genes yields an
    /// empty network whose outputs are the bias alone.
    pub fn build(genome: &Genome, topology: &Topology, settings: NetworkSettings) -> Self {
        let outputs = topology.outputs as usize;

        let mut nodes = Vec::new();
        let mut index: HashMap<u32, usize> = HashMap::new();
        for gene in genome.iter().filter(|g| g.enabled) {
            index.entry(gene.input_node).or_insert_with(|| {
                nodes.push(gene.input_node);
                nodes.len() - 1
            });
        }

        let n = nodes.len();
        let mut hidden = vec![0.0; n * n];
        let mut output = vec![0.0; n * outputs];
        for gene in genome.iter().filter(|g| g.enabled) {
            let src = index[&gene.input_node];
            if topology.is_output(gene.output_node) {
                output[src * outputs + gene.output_node as usize] = gene.scaled_weight();
            } else if let Some(&dst) = index.get(&gene.output_node) {
                hidden[src * n + dst] = gene.scaled_weight();
            }
        }

        let mut seed = Vec::with_capacity(n);
        let mut input_slots = Vec::new();
        for (i, &node) in nodes.iter().enumerate() {
            match topology.input_index(node) {
                Some(k) => {
                    seed.push(NodeValue::Resolved(0.0));
                    input_slots.push((i, k));
                }
                None => seed.push(NodeValue::Pending),
            }
        }

        Self {
            nodes,
            hidden,
            output,
            seed,
            input_slots,
            outputs,
            settings,
        }
    }

    /// Number of active nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Global ids of the active nodes, in matrix order.
    pub fn nodes(&self) -> &[u32] {
        &self.nodes
    }

    /// Initial evaluation mask: inputs resolved to 0, hidden nodes pending.
    pub fn mask(&self) -> &[NodeValue] {
        &self.seed
    }

    /// Number of output nodes.
    pub fn output_count(&self) -> usize {
        self.outputs
    }

    /// Evaluation parameters.
    pub fn settings(&self) -> &NetworkSettings {
        &self.settings
    }

    /// Weight of the active-to-active edge `from -> to`, if both are active.
    pub fn hidden_weight(&self, from: u32, to: u32) -> Option<f64> {
        let src = self.position(from)?;
        let dst = self.position(to)?;
        Some(self.hidden[src * self.nodes.len() + dst])
    }

    /// Weight of the edge from active node `from` to output `to`.
    pub fn output_weight(&self, from: u32, to: usize) -> Option<f64> {
        let src = self.position(from)?;
        (to < self.outputs).then(|| self.output[src * self.outputs + to])
    }

    fn position(&self, node: u32) -> Option<usize> {
        self.nodes.iter().position(|&n| n == node)
    }

    /// Runs the network and returns the index of the strongest of the first
    /// [`DECISION_SLOTS`] outputs. Ties go to the lowest index.
    ///
    /// `inputs[k]` feeds input node `outputs + k`; missing inputs read as 0
    /// and extra ones are ignored.
    pub fn execute(&self, inputs: &[f64]) -> usize {
        decide(&self.activate(inputs))
    }

    /// Runs the network and returns the activated output vector.
    pub fn activate(&self, inputs: &[f64]) -> Vec<f64> {
        let values = self.resolve(inputs);

        let mut out = vec![self.settings.bias; self.outputs];
        for (i, value) in values.iter().enumerate() {
            let row = &self.output[i * self.outputs..(i + 1) * self.outputs];
            for (o, w) in out.iter_mut().zip(row) {
                *o += value * w;
            }
        }
        self.settings.output_activation.apply(&mut out);
        out
    }

    /// Resolves every active node.
    ///
    /// Each round, a pending node whose weighted sources are all resolved
    /// takes `activation(sum + bias)`. Acyclic chains resolve within `N`
    /// rounds. Nodes still pending after `N` rounds sit on a cycle; they are
    /// forced to `activation(partial sum + bias)` using only the resolved
    /// contributions of the last round. This is an approximation of
    /// recurrent behaviour that guarantees termination.
    fn resolve(&self, inputs: &[f64]) -> Vec<f64> {
        let n = self.nodes.len();
        let bias = self.settings.bias;
        let activation = self.settings.activation;

        let mut values = self.seed.clone();
        for &(i, k) in &self.input_slots {
            values[i] = NodeValue::Resolved(inputs.get(k).copied().unwrap_or(0.0));
        }

        let mut incoming = vec![Incoming::default(); n];
        let mut rounds = 0;
        while rounds < n && values.iter().any(NodeValue::is_pending) {
            incoming = self.propagate(&values);
            for (value, delta) in values.iter_mut().zip(&incoming) {
                if value.is_pending() && !delta.blocked {
                    *value = NodeValue::Resolved(activation.apply(delta.sum + bias));
                }
            }
            rounds += 1;
        }

        values
            .iter()
            .zip(&incoming)
            .map(|(value, delta)| match *value {
                NodeValue::Resolved(v) => v,
                NodeValue::Pending => {
                    log::trace!("forcing unresolved node on a cycle after {rounds} rounds");
                    activation.apply(delta.sum + bias)
                }
            })
            .collect()
    }

    /// One product of the mask with the hidden matrix.
    fn propagate(&self, values: &[NodeValue]) -> Vec<Incoming> {
        let n = self.nodes.len();
        let mut incoming = vec![Incoming::default(); n];
        for (src, value) in values.iter().enumerate() {
            let row = &self.hidden[src * n..(src + 1) * n];
            for (delta, &w) in incoming.iter_mut().zip(row) {
                if w == 0.0 {
                    continue;
                }
                match value {
                    NodeValue::Resolved(v) => delta.sum += v * w,
                    NodeValue::Pending => delta.blocked = true,
                }
            }
        }
        incoming
    }
}

/// Index of the largest of the first [`DECISION_SLOTS`] values; the first
/// index strictly greater than the current best wins.
fn decide(outputs: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in outputs.iter().enumerate().take(DECISION_SLOTS) {
        if v > outputs[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::codec::{decode, encode};
    use crate::genome::mutation::{mutate_structure, mutate_weights, SplitPolicy, WeightMutation};
    use crate::genome::{Gene, InnovationRegistry};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn linear() -> NetworkSettings {
        NetworkSettings {
            bias: 0.0,
            activation: Activation::Identity,
            output_activation: OutputActivation::Elementwise(Activation::Identity),
        }
    }

    fn topology(inputs: u32, hidden: u32, outputs: u32) -> Topology {
        Topology {
            innovations: 0,
            inputs,
            hidden,
            outputs,
        }
    }

    #[test]
    fn test_network_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Network>();
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_network_is_serializable() {
        fn assert_serde<T: serde::Serialize + serde::de::DeserializeOwned>() {}
        assert_serde::<Network>();
        assert_serde::<NodeValue>();
    }

    #[test]
    fn test_empty_genome_passes_bias_through() {
        let net = Network::build(&Genome::new(), &topology(4, 0, 4), NetworkSettings::default());
        assert_eq!(net.node_count(), 0);

        let out = net.activate(&[1.0, 2.0, 3.0, 4.0]);
        // Equal biases through softmax give a uniform distribution.
        assert!(out.iter().all(|&v| (v - 0.25).abs() < 1e-12));
        assert_eq!(net.execute(&[1.0, 2.0, 3.0, 4.0]), 0);
        assert_eq!(net.execute(&[]), 0);
    }

    #[test]
    fn test_direct_connections() {
        // Inputs 2 and 3 feed outputs 0 and 1.
        let genome = Genome::from_genes(vec![
            Gene::new(1, 2, 0, 100),
            Gene::new(2, 3, 1, -50),
        ]);
        let net = Network::build(&genome, &topology(2, 0, 2), linear());

        assert_eq!(net.nodes(), &[2, 3]);
        assert_eq!(net.output_weight(2, 0), Some(1.0));
        assert_eq!(net.output_weight(3, 1), Some(-0.5));

        assert_eq!(net.activate(&[2.0, 4.0]), vec![2.0, -2.0]);
        assert_eq!(net.execute(&[2.0, 4.0]), 0);
        assert_eq!(net.execute(&[-2.0, -4.0]), 1);
    }

    #[test]
    fn test_hidden_chain() {
        // input 4 -> hidden 5 -> output 2
        let genome = Genome::from_genes(vec![
            Gene::new(1, 4, 5, 50),
            Gene::new(2, 5, 2, 100),
        ]);
        let net = Network::build(&genome, &topology(1, 1, 4), linear());

        assert_eq!(net.mask(), &[NodeValue::Resolved(0.0), NodeValue::Pending]);
        assert_eq!(net.hidden_weight(4, 5), Some(0.5));
        assert_eq!(net.activate(&[2.0]), vec![0.0, 0.0, 1.0, 0.0]);
        assert_eq!(net.execute(&[2.0]), 2);
    }

    #[test]
    fn test_backward_edges_in_active_order() {
        // Hidden node 6 is seen first, so the chain 4 -> 5 -> 6 runs
        // against the matrix order.
        let genome = Genome::from_genes(vec![
            Gene::new(3, 6, 2, 100),
            Gene::new(1, 4, 5, 100),
            Gene::new(2, 5, 6, 100),
        ]);
        let net = Network::build(&genome, &topology(1, 2, 4), linear());

        assert_eq!(net.nodes(), &[6, 4, 5]);
        assert_eq!(net.activate(&[3.0]), vec![0.0, 0.0, 3.0, 0.0]);
    }

    #[test]
    fn test_cycle_is_forced_to_resolve() {
        // 4 -> 5 <-> 6 -> 0: nodes 5 and 6 wait on each other.
        let genome = Genome::from_genes(vec![
            Gene::new(1, 4, 5, 100),
            Gene::new(2, 5, 6, 100),
            Gene::new(3, 6, 5, 100),
            Gene::new(4, 6, 0, 100),
        ]);
        let settings = NetworkSettings {
            bias: 0.5,
            ..linear()
        };
        let net = Network::build(&genome, &topology(1, 2, 4), settings);

        // Forced: node 6 sees no resolved input, so it takes 0 + bias.
        let out = net.activate(&[2.0]);
        assert_eq!(out, vec![1.0, 0.5, 0.5, 0.5]);
        assert_eq!(net.execute(&[2.0]), 0);
    }

    #[test]
    fn test_self_loop_terminates() {
        let genome = Genome::from_genes(vec![
            Gene::new(1, 2, 3, 100),
            Gene::new(2, 3, 3, 100),
            Gene::new(3, 3, 1, 100),
        ]);
        let net = Network::build(&genome, &topology(1, 1, 2), NetworkSettings::default());
        let decision = net.execute(&[1.0]);
        assert!(decision < 2);
        assert!(net.activate(&[1.0]).iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_disabled_genes_ignored() {
        let mut genome = Genome::from_genes(vec![
            Gene::new(1, 2, 0, 100),
            Gene::new(2, 2, 1, 100),
        ]);
        genome.set_enabled(1, false);
        let net = Network::build(&genome, &topology(1, 0, 2), linear());
        assert_eq!(net.output_weight(2, 1), Some(0.0));
        assert_eq!(net.activate(&[1.0]), vec![1.0, 0.0]);
    }

    #[test]
    fn test_dangling_hidden_gene_dropped() {
        // Hidden node 3 has no outgoing gene, so it is not active.
        let genome = Genome::from_genes(vec![
            Gene::new(1, 2, 3, 100),
            Gene::new(2, 2, 0, 100),
        ]);
        let net = Network::build(&genome, &topology(1, 1, 2), linear());
        assert_eq!(net.nodes(), &[2]);
        assert_eq!(net.hidden_weight(2, 3), None);
    }

    #[test]
    fn test_decision_ties_and_window() {
        assert_eq!(decide(&[0.2, 0.2, 0.1, 0.2]), 0);
        assert_eq!(decide(&[0.1, 0.3, 0.3, 0.3]), 1);
        // Only the first four outputs are considered.
        assert_eq!(decide(&[0.1, 0.2, 0.3, 0.4, 9.0]), 3);
        assert_eq!(decide(&[0.5, 0.9]), 1);
    }

    #[test]
    fn test_serialized_genome_rebuilds_identically() {
        let mut registry = InnovationRegistry::new(4, 4);
        let mut genome = Genome::genesis(&mut registry);
        let mut rng = StdRng::seed_from_u64(2024);
        mutate_weights(&mut genome, 1.0, WeightMutation::Reset, &mut rng);
        for _ in 0..15 {
            mutate_structure(&mut genome, 1.0, SplitPolicy::Fixed(0.5), &mut registry, &mut rng);
        }

        let settings = NetworkSettings::default();
        let topology = registry.topology();
        let original = Network::build(&genome, &topology, settings);

        let (decoded_topology, decoded) = decode(&encode(&topology, &genome)).unwrap();
        let rebuilt = Network::build(&decoded, &decoded_topology, settings);
        assert_eq!(rebuilt, original);

        for _ in 0..50 {
            let inputs: Vec<f64> = (0..4).map(|_| rng.random_range(-1.0..1.0)).collect();
            assert_eq!(original.execute(&inputs), rebuilt.execute(&inputs));
            assert_eq!(original.activate(&inputs), rebuilt.activate(&inputs));
        }
    }
}
