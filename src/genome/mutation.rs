//! Weight and structure mutation.
//!
//! Weight mutation touches genes in place. Structure mutation only ever
//! appends genes and flips enabled bits, drawing every new innovation id
//! and hidden node from the shared [`InnovationRegistry`].
//!
//! # Operators
//!
//! - [`mutate_weights`]: per-gene reset (or legacy perturbation)
//! - [`mutate_structure`]: at most one add-node or add-connection per call

use super::innovation::InnovationRegistry;
use super::types::{Gene, Genome, WEIGHT_LIMIT};
use rand::Rng;
use std::collections::{BTreeSet, HashSet};

/// Weight mutation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WeightMutation {
    /// Replace the weight with a fresh draw from `[-WEIGHT_LIMIT, WEIGHT_LIMIT]`.
    #[default]
    Reset,

    /// Half the time reset, otherwise scale the weight by 1.05 (rounded to
    /// the nearest fixed-point unit, unbounded).
    Perturb,
}

/// How a structural mutation chooses between adding a node and adding a
/// connection.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SplitPolicy {
    /// Add a node with this probability, otherwise add a connection.
    Fixed(f64),

    /// Add a node with probability
    /// `enabled connections / (possible sources * possible destinations)`,
    /// favouring new connections while the network is sparse.
    Adaptive,
}

impl Default for SplitPolicy {
    fn default() -> Self {
        SplitPolicy::Fixed(0.5)
    }
}

/// The change a structural mutation made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuralMutation {
    /// Gene `split` was disabled and rerouted through hidden node `node`
    /// via genes `incoming` and `outgoing`.
    AddNode {
        split: u64,
        node: u32,
        incoming: u64,
        outgoing: u64,
    },

    /// A new enabled connection `from -> to`.
    AddConnection { innovation: u64, from: u32, to: u32 },
}

/// Draws a weight uniformly from `[-WEIGHT_LIMIT, WEIGHT_LIMIT]`.
pub fn random_weight<R: Rng>(rng: &mut R) -> i32 {
    rng.random_range(-WEIGHT_LIMIT..=WEIGHT_LIMIT)
}

/// Mutates each gene's weight independently with probability `rate`.
///
/// Returns the number of genes touched.
pub fn mutate_weights<R: Rng>(
    genome: &mut Genome,
    rate: f64,
    policy: WeightMutation,
    rng: &mut R,
) -> usize {
    let mut touched = 0;
    for index in 0..genome.len() {
        if rng.random_range(0.0..1.0) >= rate {
            continue;
        }
        let weight = match policy {
            WeightMutation::Reset => random_weight(rng),
            WeightMutation::Perturb => {
                if rng.random_bool(0.5) {
                    random_weight(rng)
                } else {
                    (genome.genes()[index].weight as f64 * 1.05).round() as i32
                }
            }
        };
        genome.set_weight(index, weight);
        touched += 1;
    }
    touched
}

/// With probability `rate`, applies exactly one structural change.
///
/// Returns `None` when the roll fails or the chosen change is impossible
/// (add-node on an empty genome, add-connection on a fully connected
/// genome). Neither case is an error.
pub fn mutate_structure<R: Rng>(
    genome: &mut Genome,
    rate: f64,
    split: SplitPolicy,
    registry: &mut InnovationRegistry,
    rng: &mut R,
) -> Option<StructuralMutation> {
    if rng.random_range(0.0..1.0) >= rate {
        return None;
    }

    let candidates = Candidates::collect(genome, registry);
    let node_probability = match split {
        SplitPolicy::Fixed(p) => p,
        SplitPolicy::Adaptive => candidates.saturation(genome),
    };

    if rng.random_range(0.0..1.0) < node_probability {
        add_node(genome, registry, rng)
    } else {
        add_connection(genome, &candidates, registry, rng)
    }
}

/// Splits a random gene with a new hidden node.
///
/// The old gene is disabled; `input -> node` gets full weight and
/// `node -> output` inherits the old weight.
pub fn add_node<R: Rng>(
    genome: &mut Genome,
    registry: &mut InnovationRegistry,
    rng: &mut R,
) -> Option<StructuralMutation> {
    if genome.is_empty() {
        log::trace!("add-node skipped: genome has no genes");
        return None;
    }

    let index = rng.random_range(0..genome.len());
    let old = genome.genes()[index];
    genome.set_enabled(index, false);

    let node = registry.new_node();
    let incoming = registry.next_innovation();
    let outgoing = registry.next_innovation();
    genome.push(Gene::new(incoming, old.input_node, node, WEIGHT_LIMIT));
    genome.push(Gene::new(outgoing, node, old.output_node, old.weight));

    Some(StructuralMutation::AddNode {
        split: old.innovation,
        node,
        incoming,
        outgoing,
    })
}

/// Adds one connection between two nodes not yet linked in either
/// direction.
///
/// Resamples up to `sources * destinations` times; if every draw is
/// rejected the genome is treated as fully connected and left unchanged.
fn add_connection<R: Rng>(
    genome: &mut Genome,
    candidates: &Candidates,
    registry: &mut InnovationRegistry,
    rng: &mut R,
) -> Option<StructuralMutation> {
    let linked: HashSet<(u32, u32)> = genome
        .iter()
        .flat_map(|g| [(g.input_node, g.output_node), (g.output_node, g.input_node)])
        .collect();

    let attempts = candidates.sources.len() * candidates.destinations.len();
    for _ in 0..attempts {
        let from = candidates.sources[rng.random_range(0..candidates.sources.len())];
        let to = candidates.destinations[rng.random_range(0..candidates.destinations.len())];
        if from == to || linked.contains(&(from, to)) {
            continue;
        }

        let innovation = registry.next_innovation();
        genome.push(Gene::new(innovation, from, to, random_weight(rng)));
        return Some(StructuralMutation::AddConnection {
            innovation,
            from,
            to,
        });
    }

    log::trace!("add-connection skipped: no free pair after {attempts} attempts");
    None
}

/// Nodes that may start or end a new connection.
struct Candidates {
    sources: Vec<u32>,
    destinations: Vec<u32>,
}

impl Candidates {
    /// Inputs and hidden nodes as sources, outputs and hidden nodes as
    /// destinations: the base ranges plus every node the genome mentions.
    fn collect(genome: &Genome, registry: &InnovationRegistry) -> Self {
        let topology = registry.topology();
        let mut sources: BTreeSet<u32> = topology.input_range().collect();
        let mut destinations: BTreeSet<u32> = topology.output_range().collect();

        for gene in genome {
            for node in [gene.input_node, gene.output_node] {
                if !topology.is_output(node) {
                    sources.insert(node);
                }
                if !topology.is_input(node) {
                    destinations.insert(node);
                }
            }
        }

        Self {
            sources: sources.into_iter().collect(),
            destinations: destinations.into_iter().collect(),
        }
    }

    fn saturation(&self, genome: &Genome) -> f64 {
        let possible = (self.sources.len() * self.destinations.len()).max(1);
        (genome.enabled_count() as f64 / possible as f64).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn genesis(inputs: u32, outputs: u32) -> (Genome, InnovationRegistry) {
        let mut registry = InnovationRegistry::new(inputs, outputs);
        let genome = Genome::genesis(&mut registry);
        (genome, registry)
    }

    #[test]
    fn test_weight_reset_rate_one_touches_all() {
        let (mut genome, _) = genesis(4, 4);
        let mut rng = StdRng::seed_from_u64(42);
        let touched = mutate_weights(&mut genome, 1.0, WeightMutation::Reset, &mut rng);
        assert_eq!(touched, 16);
        assert!(genome
            .iter()
            .all(|g| (-WEIGHT_LIMIT..=WEIGHT_LIMIT).contains(&g.weight)));
        // 16 uniform draws from 201 values are vanishingly unlikely to all be 100.
        assert!(genome.iter().any(|g| g.weight != WEIGHT_LIMIT));
    }

    #[test]
    fn test_weight_rate_zero_is_noop() {
        let (mut genome, _) = genesis(3, 3);
        let before = genome.clone();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            mutate_weights(&mut genome, 0.0, WeightMutation::Perturb, &mut rng),
            0
        );
        assert_eq!(genome, before);
    }

    #[test]
    fn test_perturb_keeps_structure() {
        let (mut genome, _) = genesis(3, 2);
        let mut rng = StdRng::seed_from_u64(9);
        mutate_weights(&mut genome, 1.0, WeightMutation::Perturb, &mut rng);
        assert_eq!(genome.len(), 6);
        assert_eq!(genome.enabled_count(), 6);
    }

    #[test]
    fn test_add_node_reroutes_connection() {
        let (mut genome, mut registry) = genesis(2, 2);
        genome.set_weight(0, -30);
        genome.set_weight(1, -30);
        genome.set_weight(2, -30);
        genome.set_weight(3, -30);
        let mut rng = StdRng::seed_from_u64(5);

        let change = add_node(&mut genome, &mut registry, &mut rng).expect("non-empty genome");
        let StructuralMutation::AddNode {
            split,
            node,
            incoming,
            outgoing,
        } = change
        else {
            panic!("expected add-node, got {change:?}");
        };

        assert_eq!(node, 4);
        assert_eq!((incoming, outgoing), (5, 6));
        assert_eq!(registry.hidden(), 1);

        let old = genome.iter().find(|g| g.innovation == split).copied().unwrap();
        assert!(!old.enabled);

        let first = genome.genes()[4];
        let second = genome.genes()[5];
        assert_eq!((first.input_node, first.output_node), (old.input_node, node));
        assert_eq!(first.weight, WEIGHT_LIMIT);
        assert_eq!((second.input_node, second.output_node), (node, old.output_node));
        assert_eq!(second.weight, -30);
        assert!(first.enabled && second.enabled);
    }

    #[test]
    fn test_add_node_on_empty_genome_is_noop() {
        let mut genome = Genome::new();
        let mut registry = InnovationRegistry::new(2, 2);
        let mut rng = StdRng::seed_from_u64(5);
        assert!(add_node(&mut genome, &mut registry, &mut rng).is_none());
        assert_eq!(registry.innovations(), 0);
        assert_eq!(registry.hidden(), 0);
    }

    #[test]
    fn test_add_connection_on_fully_connected_genome_is_noop() {
        // Genesis links every input to every output, and there are no
        // hidden nodes: nothing is left to connect.
        let (mut genome, mut registry) = genesis(3, 3);
        let before = genome.clone();
        let mut rng = StdRng::seed_from_u64(11);
        let change = mutate_structure(
            &mut genome,
            1.0,
            SplitPolicy::Fixed(0.0),
            &mut registry,
            &mut rng,
        );
        assert!(change.is_none());
        assert_eq!(genome, before);
        assert_eq!(registry.innovations(), 9);
    }

    #[test]
    fn test_add_connection_links_fresh_pair() {
        // Genome only connects input 4 -> output 0; the other inputs and
        // outputs are reachable through the base ranges.
        let mut registry = InnovationRegistry::new(4, 4);
        let first = registry.next_innovation();
        let mut genome = Genome::from_genes(vec![Gene::new(first, 4, 0, 50)]);
        let mut rng = StdRng::seed_from_u64(3);

        let change = mutate_structure(
            &mut genome,
            1.0,
            SplitPolicy::Fixed(0.0),
            &mut registry,
            &mut rng,
        )
        .expect("free pairs exist");

        let StructuralMutation::AddConnection { innovation, from, to } = change else {
            panic!("expected add-connection, got {change:?}");
        };
        assert_eq!(innovation, 2);
        assert!((4..8).contains(&from));
        assert!((0..4).contains(&to));
        assert_ne!((from, to), (4, 0));
        assert_eq!(genome.len(), 2);
    }

    #[test]
    fn test_rate_zero_never_mutates_structure() {
        let (mut genome, mut registry) = genesis(2, 2);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            assert!(mutate_structure(
                &mut genome,
                0.0,
                SplitPolicy::Fixed(1.0),
                &mut registry,
                &mut rng
            )
            .is_none());
        }
        assert_eq!(genome.len(), 4);
    }

    #[test]
    fn test_adaptive_split_saturation() {
        let (genome, registry) = genesis(2, 2);
        let candidates = Candidates::collect(&genome, &registry);
        // 4 enabled connections over 2 x 2 possible pairs.
        assert!((candidates.saturation(&genome) - 1.0).abs() < 1e-12);

        let sparse = Genome::from_genes(vec![genome.genes()[0]]);
        let candidates = Candidates::collect(&sparse, &registry);
        assert!((candidates.saturation(&sparse) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_adaptive_split_follows_saturation() {
        let mut rng = StdRng::seed_from_u64(21);

        // Every possible pair is connected: adaptive always adds a node.
        for _ in 0..10 {
            let (mut genome, mut registry) = genesis(2, 2);
            let change = mutate_structure(
                &mut genome,
                1.0,
                SplitPolicy::Adaptive,
                &mut registry,
                &mut rng,
            );
            assert!(matches!(change, Some(StructuralMutation::AddNode { .. })));
        }

        // No enabled connection: adaptive always adds a connection.
        for _ in 0..10 {
            let mut registry = InnovationRegistry::new(2, 2);
            let first = registry.next_innovation();
            let mut gene = Gene::new(first, 2, 0, 40);
            gene.enabled = false;
            let mut genome = Genome::from_genes(vec![gene]);

            let change = mutate_structure(
                &mut genome,
                1.0,
                SplitPolicy::Adaptive,
                &mut registry,
                &mut rng,
            );
            let Some(StructuralMutation::AddConnection { from, to, .. }) = change else {
                panic!("expected add-connection, got {change:?}");
            };
            assert_ne!((from, to), (2, 0));
            assert_eq!(registry.hidden(), 0);
        }
    }

    #[test]
    fn test_hidden_nodes_become_candidates() {
        let (mut genome, mut registry) = genesis(2, 2);
        let mut rng = StdRng::seed_from_u64(8);
        add_node(&mut genome, &mut registry, &mut rng);

        let candidates = Candidates::collect(&genome, &registry);
        assert_eq!(candidates.sources, vec![2, 3, 4]);
        assert_eq!(candidates.destinations, vec![0, 1, 4]);
    }

    proptest! {
        #[test]
        fn prop_structure_mutation_never_loses_connectivity(
            seed in any::<u64>(),
            rounds in 1usize..40,
            split in 0.0f64..=1.0,
        ) {
            let (mut genome, mut registry) = genesis(3, 2);
            let mut rng = StdRng::seed_from_u64(seed);
            let mut seen: Vec<u64> = genome.iter().map(|g| g.innovation).collect();

            for _ in 0..rounds {
                let enabled_before = genome.enabled_count();
                let len_before = genome.len();
                let max_before = registry.innovations();

                mutate_structure(&mut genome, 1.0, SplitPolicy::Fixed(split), &mut registry, &mut rng);

                prop_assert!(genome.enabled_count() >= enabled_before);
                prop_assert!(genome.len() >= len_before);
                for gene in &genome.genes()[len_before..] {
                    prop_assert!(gene.innovation > max_before);
                }
                // Old records keep their innovation ids and order.
                let ids: Vec<u64> = genome.iter().map(|g| g.innovation).collect();
                prop_assert_eq!(&ids[..seen.len()], &seen[..]);
                seen = ids;
            }
        }
    }
}
