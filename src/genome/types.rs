//! Gene and genome representation.
//!
//! A [`Gene`] is one potential connection between two nodes of the global
//! node numbering space. A [`Genome`] owns an ordered list of genes in
//! insertion order; identity for alignment is the innovation id, never the
//! position in the list.
//!
//! Weights are stored in fixed-point units: an integer nominally in
//! `[-WEIGHT_LIMIT, WEIGHT_LIMIT]`, scaled by `1 / WEIGHT_SCALE` when a
//! network is built. This keeps genes exact under serialization.

use super::innovation::InnovationRegistry;

/// Fixed-point scale: a stored weight of `100` is `1.0` at evaluation time.
pub const WEIGHT_SCALE: f64 = 100.0;

/// Magnitude bound for freshly drawn weights, in fixed-point units.
pub const WEIGHT_LIMIT: i32 = 100;

/// One connection record.
///
/// # Invariants
///
/// - Within one genome, `innovation` is unique.
/// - Across genomes, equal `innovation` means the same historical
///   connection, i.e. the same `(input_node, output_node)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Gene {
    /// Global historical marking.
    pub innovation: u64,
    /// Source node id.
    pub input_node: u32,
    /// Destination node id.
    pub output_node: u32,
    /// Weight in fixed-point units (see [`WEIGHT_SCALE`]).
    pub weight: i32,
    /// Disabled genes stay in the genome but are ignored by networks.
    pub enabled: bool,
}

impl Gene {
    /// Creates an enabled gene.
    pub fn new(innovation: u64, input_node: u32, output_node: u32, weight: i32) -> Self {
        Self {
            innovation,
            input_node,
            output_node,
            weight,
            enabled: true,
        }
    }

    /// The weight as used during evaluation.
    pub fn scaled_weight(&self) -> f64 {
        self.weight as f64 / WEIGHT_SCALE
    }
}

/// An ordered collection of genes describing one candidate network.
///
/// Genes are never removed. Structural mutation disables old genes and
/// appends new ones, so historical markings survive any number of
/// generations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Genome {
    genes: Vec<Gene>,
}

impl Genome {
    /// Creates an empty genome.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a genome from genes in the given order.
    ///
    /// # Panics
    /// Panics if two genes share an innovation id. Use
    /// [`codec::decode`](super::codec::decode) for untrusted input.
    pub fn from_genes(genes: Vec<Gene>) -> Self {
        let mut genome = Self {
            genes: Vec::with_capacity(genes.len()),
        };
        for gene in genes {
            genome.push(gene);
        }
        genome
    }

    /// Builds the minimal genome: every input connected to every output.
    ///
    /// Allocates `inputs * outputs` innovations from `registry`. Gene
    /// `i * outputs + j` (zero-based) connects input node `outputs + i` to
    /// output node `j` with full weight.
    pub fn genesis(registry: &mut InnovationRegistry) -> Self {
        let inputs = registry.inputs();
        let outputs = registry.outputs();
        let mut genome = Self {
            genes: Vec::with_capacity((inputs * outputs) as usize),
        };
        for i in 0..inputs {
            for j in 0..outputs {
                let innovation = registry.next_innovation();
                genome
                    .genes
                    .push(Gene::new(innovation, outputs + i, j, WEIGHT_LIMIT));
            }
        }
        genome
    }

    /// Appends a gene.
    ///
    /// # Panics
    /// Panics if the innovation id is already present.
    pub fn push(&mut self, gene: Gene) {
        assert!(
            !self.contains(gene.innovation),
            "innovation {} already present in genome",
            gene.innovation
        );
        self.genes.push(gene);
    }

    /// Genes in insertion order.
    pub fn genes(&self) -> &[Gene] {
        &self.genes
    }

    /// Iterates over genes in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Gene> {
        self.genes.iter()
    }

    /// Number of gene records, enabled or not.
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    /// Returns `true` if the genome has no genes.
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Number of enabled genes.
    pub fn enabled_count(&self) -> usize {
        self.genes.iter().filter(|g| g.enabled).count()
    }

    /// Highest innovation id, or 0 for an empty genome.
    pub fn max_innovation(&self) -> u64 {
        self.genes.iter().map(|g| g.innovation).max().unwrap_or(0)
    }

    /// Returns `true` if a gene with this innovation id exists.
    pub fn contains(&self, innovation: u64) -> bool {
        self.genes.iter().any(|g| g.innovation == innovation)
    }

    /// Returns `true` if any gene, enabled or not, links `a` and `b` in
    /// either direction.
    pub fn links(&self, a: u32, b: u32) -> bool {
        self.genes.iter().any(|g| {
            (g.input_node == a && g.output_node == b) || (g.input_node == b && g.output_node == a)
        })
    }

    /// Replaces the weight of the gene at `index`.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    pub fn set_weight(&mut self, index: usize, weight: i32) {
        self.genes[index].weight = weight;
    }

    /// Sets the enabled bit of the gene at `index`.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    pub fn set_enabled(&mut self, index: usize, enabled: bool) {
        self.genes[index].enabled = enabled;
    }
}

impl<'a> IntoIterator for &'a Genome {
    type Item = &'a Gene;
    type IntoIter = std::slice::Iter<'a, Gene>;

    fn into_iter(self) -> Self::IntoIter {
        self.genes.iter()
    }
}
