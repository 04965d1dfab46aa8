//! Historical-marking alignment and the operators built on it.
//!
//! [`align`] buckets the genes of two genomes by innovation id.
//! [`compatibility`] and [`crossover`] both consume that one alignment.
//!
//! # References
//!
//! - Stanley & Miikkulainen (2002), "Evolving Neural Networks through
//!   Augmenting Topologies", *Evolutionary Computation* 10(2), 99–127

use super::types::{Gene, Genome, WEIGHT_SCALE};
use rand::Rng;
use std::collections::BTreeMap;

/// The genes two genomes hold for one innovation id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aligned<'a> {
    /// Gene from the first genome, if present.
    pub left: Option<&'a Gene>,
    /// Gene from the second genome, if present.
    pub right: Option<&'a Gene>,
}

impl Aligned<'_> {
    /// Returns `true` if both genomes carry this innovation.
    pub fn is_matched(&self) -> bool {
        self.left.is_some() && self.right.is_some()
    }
}

/// Aligns two genomes by innovation id, in ascending id order.
pub fn align<'a>(left: &'a Genome, right: &'a Genome) -> BTreeMap<u64, Aligned<'a>> {
    let mut aligned: BTreeMap<u64, Aligned<'a>> = BTreeMap::new();
    for gene in left {
        aligned
            .entry(gene.innovation)
            .or_insert(Aligned {
                left: None,
                right: None,
            })
            .left = Some(gene);
    }
    for gene in right {
        aligned
            .entry(gene.innovation)
            .or_insert(Aligned {
                left: None,
                right: None,
            })
            .right = Some(gene);
    }
    aligned
}

/// Coefficients of the compatibility distance and the speciation threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompatibilityParams {
    /// Excess gene coefficient.
    pub c1: f64,
    /// Disjoint gene coefficient.
    pub c2: f64,
    /// Average weight difference coefficient.
    pub c3: f64,
    /// Genomes closer than this belong to the same species.
    pub threshold: f64,
}

impl Default for CompatibilityParams {
    fn default() -> Self {
        Self {
            c1: 1.0,
            c2: 1.0,
            c3: 1.0,
            threshold: 2.0,
        }
    }
}

impl CompatibilityParams {
    /// Returns `true` if the two genomes belong to the same species.
    pub fn is_compatible(&self, a: &Genome, b: &Genome) -> bool {
        compatibility(a, b, self.c1, self.c2, self.c3) < self.threshold
    }
}

/// Excess / disjoint / matched-weight breakdown of an alignment.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AlignmentSummary {
    /// Unmatched genes beyond the other genome's highest innovation.
    pub excess: usize,
    /// Unmatched genes within both genomes' innovation range.
    pub disjoint: usize,
    /// Genes present in both genomes.
    pub matched: usize,
    /// Mean absolute scaled weight difference over matched genes (0 if none).
    pub mean_weight_diff: f64,
}

/// Classifies the alignment of two genomes.
pub fn summarize(left: &Genome, right: &Genome) -> AlignmentSummary {
    let left_max = left.max_innovation();
    let right_max = right.max_innovation();

    let mut summary = AlignmentSummary::default();
    let mut weight_diff = 0.0;

    for aligned in align(left, right).values() {
        match (aligned.left, aligned.right) {
            (Some(l), Some(r)) => {
                summary.matched += 1;
                weight_diff += (l.weight - r.weight).abs() as f64 / WEIGHT_SCALE;
            }
            (Some(l), None) if l.innovation > right_max => summary.excess += 1,
            (None, Some(r)) if r.innovation > left_max => summary.excess += 1,
            _ => summary.disjoint += 1,
        }
    }

    if summary.matched > 0 {
        summary.mean_weight_diff = weight_diff / summary.matched as f64;
    }
    summary
}

/// NEAT compatibility distance.
///
/// `(c1 * E + c2 * D) / N + c3 * W`, where `N` is the gene count of the
/// larger genome (at least 1) and `W` is the mean weight difference of
/// matched genes.
pub fn compatibility(left: &Genome, right: &Genome, c1: f64, c2: f64, c3: f64) -> f64 {
    let summary = summarize(left, right);
    let n = left.len().max(right.len()).max(1) as f64;
    (c1 * summary.excess as f64 + c2 * summary.disjoint as f64) / n
        + c3 * summary.mean_weight_diff
}

/// Produces a child genome from two scored parents.
///
/// - Matched innovations: one parent's copy, chosen uniformly.
/// - Unmatched innovations: inherited only from the fitter parent.
///
/// Ties in fitness go to the parent with more genes, and to `a` when the
/// gene counts are equal too. Neither parent is modified. Child genes are
/// ordered by innovation id.
pub fn crossover<R: Rng>(
    a: &Genome,
    a_fitness: f64,
    b: &Genome,
    b_fitness: f64,
    rng: &mut R,
) -> Genome {
    let (larger, larger_fitness, smaller, smaller_fitness) = if a.len() >= b.len() {
        (a, a_fitness, b, b_fitness)
    } else {
        (b, b_fitness, a, a_fitness)
    };
    let larger_wins = larger_fitness >= smaller_fitness;

    let genes = align(larger, smaller)
        .into_values()
        .filter_map(|aligned| match (aligned.left, aligned.right) {
            (Some(l), Some(s)) => Some(if rng.random_bool(0.5) { *l } else { *s }),
            (Some(l), None) => larger_wins.then_some(*l),
            (None, Some(s)) => (!larger_wins).then_some(*s),
            (None, None) => None,
        })
        .collect();

    Genome::from_genes(genes)
}
