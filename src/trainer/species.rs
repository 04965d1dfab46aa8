//! Speciation and the per-species steps of a generation.
//!
//! Each step is a free function over the population and a *partition*
//! (member indices grouped by species), so it can be tested on its own:
//!
//! 1. [`speciate`]: group members by compatibility with prior representatives
//! 2. [`adjusted_fitness`]: divide scores by species size
//! 3. [`allocate_offspring`]: share the next population by adjusted fitness
//! 4. [`cull`]: keep each species' members at or above a percentile

use super::types::{Member, MemberId};
use crate::genome::{CompatibilityParams, Genome};
use rand::Rng;

/// A group of compatible genomes carried into the next speciation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Species {
    members: Vec<MemberId>,
    genomes: Vec<Genome>,
}

impl Species {
    /// Ids of the members, in population order.
    pub fn members(&self) -> &[MemberId] {
        &self.members
    }

    /// Genomes of the members, aligned with [`members`](Self::members).
    pub fn genomes(&self) -> &[Genome] {
        &self.genomes
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if the species has gone extinct.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Picks a uniformly random member genome to stand for the species.
    pub fn representative<R: Rng>(&self, rng: &mut R) -> Option<&Genome> {
        if self.genomes.is_empty() {
            return None;
        }
        Some(&self.genomes[rng.random_range(0..self.genomes.len())])
    }
}

/// The species partition of the last evaluated generation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpeciesSet {
    species: Vec<Species>,
}

impl SpeciesSet {
    /// Creates an empty set; the first speciation founds every species.
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures a partition of `population`, dropping empty groups.
    pub fn from_partition(population: &[Member], partition: &[Vec<usize>]) -> Self {
        let species = partition
            .iter()
            .filter(|group| !group.is_empty())
            .map(|group| Species {
                members: group.iter().map(|&i| population[i].id).collect(),
                genomes: group.iter().map(|&i| population[i].genome.clone()).collect(),
            })
            .collect();
        Self { species }
    }

    /// All species.
    pub fn species(&self) -> &[Species] {
        &self.species
    }

    /// Iterates over the species.
    pub fn iter(&self) -> std::slice::Iter<'_, Species> {
        self.species.iter()
    }

    /// Number of species.
    pub fn len(&self) -> usize {
        self.species.len()
    }

    /// Returns `true` before the first speciation.
    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    /// The species containing `id`, if any.
    pub fn species_of(&self, id: MemberId) -> Option<&Species> {
        self.species.iter().find(|s| s.members.contains(&id))
    }

    /// One random representative per species, in species order.
    pub fn representatives<R: Rng>(&self, rng: &mut R) -> Vec<Genome> {
        self.species
            .iter()
            .filter_map(|s| s.representative(rng).cloned())
            .collect()
    }
}

/// Assigns every member, in population order, to the first representative
/// it is compatible with, founding a new species when none match.
///
/// Returns member indices per species. Groups of representatives that
/// attracted nobody are dropped.
pub fn speciate(
    population: &[Member],
    mut representatives: Vec<Genome>,
    params: &CompatibilityParams,
) -> Vec<Vec<usize>> {
    let mut partition: Vec<Vec<usize>> = vec![Vec::new(); representatives.len()];

    for (i, member) in population.iter().enumerate() {
        match representatives
            .iter()
            .position(|rep| params.is_compatible(&member.genome, rep))
        {
            Some(s) => partition[s].push(i),
            None => {
                representatives.push(member.genome.clone());
                partition.push(vec![i]);
            }
        }
    }

    partition.retain(|group| !group.is_empty());
    partition
}

/// Each member's score divided by the size of its species, aligned with
/// `partition`.
pub fn adjusted_fitness(population: &[Member], partition: &[Vec<usize>]) -> Vec<Vec<f64>> {
    partition
        .iter()
        .map(|group| {
            let size = group.len() as f64;
            group.iter().map(|&i| population[i].score / size).collect()
        })
        .collect()
}

/// Offspring per species, proportional to each species' share of the total
/// adjusted fitness and rounded to the nearest integer.
///
/// Species whose adjusted fitness sums below zero count as zero, so every
/// share stays in `[0, 1]`. If no species has a positive sum there is no
/// fitness signal, and each species keeps its current size. The result may
/// not sum exactly to `population_size`.
pub fn allocate_offspring(adjusted: &[Vec<f64>], population_size: usize) -> Vec<usize> {
    let totals: Vec<f64> = adjusted
        .iter()
        .map(|s| s.iter().sum::<f64>().max(0.0))
        .collect();
    let total: f64 = totals.iter().sum();

    if total <= 0.0 || !total.is_finite() {
        log::debug!("no positive fitness; preserving species sizes");
        return adjusted.iter().map(Vec::len).collect();
    }

    totals
        .iter()
        .map(|&t| ((t / total) * population_size as f64).round() as usize)
        .collect()
}

/// Eligible parents per species.
///
/// Members are ranked by ascending score; the cutoff is the adjusted
/// fitness at position `round((len - 1) * percentile)`, and every member
/// at or above it survives. Returned indices are in ascending score order.
pub fn cull(population: &[Member], partition: &[Vec<usize>], percentile: f64) -> Vec<Vec<usize>> {
    partition
        .iter()
        .map(|group| {
            if group.is_empty() {
                return Vec::new();
            }
            let mut ranked = group.clone();
            ranked.sort_by(|&a, &b| {
                population[a]
                    .score
                    .partial_cmp(&population[b].score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            let size = ranked.len() as f64;
            let cutoff_at = ((ranked.len() - 1) as f64 * percentile).round() as usize;
            let cutoff = population[ranked[cutoff_at]].score / size;

            ranked
                .into_iter()
                .filter(|&i| population[i].score / size >= cutoff)
                .collect()
        })
        .collect()
}
