//! Generation lifecycle.
//!
//! [`Trainer`] owns the population, the species partition and the
//! innovation registry. An external driver evaluates members (directly or
//! through simulation slots), reports their scores, and calls
//! [`Trainer::advance_generation`] once every member has a score:
//!
//! ```text
//! Evaluating -> GenerationComplete -> Speciating -> Culling
//!            -> Reproducing -> Mutating -> Rebuilding -> Evaluating
//! ```

use super::config::NeatConfig;
use super::species::{adjusted_fitness, allocate_offspring, cull, speciate, SpeciesSet};
use super::types::{GenerationStats, Member, MemberId};
use crate::error::NeatError;
use crate::genome::codec::check_genome;
use crate::genome::{
    crossover, mutate_structure, mutate_weights, Genome, InnovationRegistry, Topology,
    WeightMutation,
};
use crate::network::{Network, NetworkSettings};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Per-generation bookkeeping: slot cursors, reported scores, top score.
///
/// Reset at every generation boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainerState {
    generation: usize,
    slots: Vec<usize>,
    next_member: usize,
    scored: Vec<bool>,
    top_score: Option<f64>,
}

impl TrainerState {
    /// Fresh state: slot `i` evaluates member `i`.
    pub fn new(generation: usize, slot_count: usize, population_len: usize) -> Self {
        let slots: Vec<usize> = (0..slot_count.min(population_len)).collect();
        Self {
            generation,
            next_member: slots.len(),
            slots,
            scored: vec![false; population_len],
            top_score: None,
        }
    }

    /// Current generation, starting at 0.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Member index each slot is evaluating.
    pub fn slots(&self) -> &[usize] {
        &self.slots
    }

    /// Member index assigned to `slot`.
    pub fn slot(&self, slot: usize) -> Result<usize, NeatError> {
        self.slots
            .get(slot)
            .copied()
            .ok_or(NeatError::UnknownSlot(slot))
    }

    /// Hands `slot` the next member nobody has evaluated yet.
    ///
    /// Returns `Ok(None)` once every member has been handed out; the slot
    /// keeps its last member.
    pub fn assign_next(&mut self, slot: usize) -> Result<Option<usize>, NeatError> {
        if slot >= self.slots.len() {
            return Err(NeatError::UnknownSlot(slot));
        }
        if self.next_member >= self.scored.len() {
            return Ok(None);
        }
        let member = self.next_member;
        self.slots[slot] = member;
        self.next_member += 1;
        Ok(Some(member))
    }

    /// Records a score for `member` and updates the generation's top score.
    pub fn record(&mut self, member: usize, score: f64) {
        self.scored[member] = true;
        self.top_score = Some(self.top_score.map_or(score, |top| top.max(score)));
    }

    /// Number of members with a reported score.
    pub fn scored_count(&self) -> usize {
        self.scored.iter().filter(|&&s| s).count()
    }

    /// Returns `true` once every member has a reported score.
    pub fn is_generation_over(&self) -> bool {
        self.scored.iter().all(|&s| s)
    }

    /// Highest score reported this generation.
    pub fn top_score(&self) -> Option<f64> {
        self.top_score
    }
}

/// Drives a NEAT population through evaluation and reproduction.
///
/// # Usage
///
/// ```
/// use u_neat::trainer::{NeatConfig, Trainer};
///
/// let config = NeatConfig::default()
///     .with_population_size(10)
///     .with_slots(2)
///     .with_seed(42);
/// let mut trainer = Trainer::new(config).unwrap();
///
/// // Score every member with the network's decision on a fixed input.
/// trainer.evaluate_with(|net| net.execute(&[0.5, -0.5, 1.0, 0.0]) as f64);
/// assert!(trainer.is_generation_over());
///
/// let stats = trainer.advance_generation();
/// assert_eq!(stats.generation, 0);
/// assert_eq!(trainer.generation(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Trainer {
    config: NeatConfig,
    registry: InnovationRegistry,
    population: Vec<Member>,
    species: SpeciesSet,
    state: TrainerState,
    rng: StdRng,
}

impl Trainer {
    /// Creates a population from the minimal genome, every input connected
    /// to every output, with all weights randomized.
    ///
    /// # Errors
    /// Returns [`NeatError::InvalidConfig`] if the configuration is invalid.
    pub fn new(config: NeatConfig) -> Result<Self, NeatError> {
        config.validate()?;

        let mut rng = create_rng(config.seed);
        let mut registry = InnovationRegistry::new(config.inputs, config.outputs);
        let base = Genome::genesis(&mut registry);

        let genomes: Vec<Genome> = (0..config.population_size)
            .map(|_| {
                let mut genome = base.clone();
                mutate_weights(&mut genome, 1.0, WeightMutation::Reset, &mut rng);
                genome
            })
            .collect();

        Ok(Self::assemble(config, registry, genomes, rng))
    }

    /// Creates a population from previously exported genomes.
    ///
    /// Seeds are assigned round-robin and kept as-is. `topology` must be
    /// the descriptor the seeds were exported with; counting resumes from it.
    ///
    /// # Errors
    /// Fails on an invalid configuration, an empty seed list, a topology
    /// whose input/output counts differ from the configuration, or a seed
    /// holding innovation or node ids beyond `topology`
    /// (see [`check_genome`]).
    pub fn from_seeds(
        config: NeatConfig,
        topology: Topology,
        seeds: Vec<Genome>,
    ) -> Result<Self, NeatError> {
        config.validate()?;
        if seeds.is_empty() {
            return Err(NeatError::InvalidConfig("no seed genomes given".into()));
        }
        if topology.inputs != config.inputs || topology.outputs != config.outputs {
            return Err(NeatError::TopologyMismatch {
                expected_inputs: config.inputs,
                expected_outputs: config.outputs,
                actual_inputs: topology.inputs,
                actual_outputs: topology.outputs,
            });
        }
        for seed in &seeds {
            check_genome(&topology, seed)?;
        }

        let rng = create_rng(config.seed);
        let registry = InnovationRegistry::from_topology(topology);
        let genomes = seeds
            .iter()
            .cycle()
            .take(config.population_size)
            .cloned()
            .collect();

        Ok(Self::assemble(config, registry, genomes, rng))
    }

    fn assemble(
        config: NeatConfig,
        registry: InnovationRegistry,
        genomes: Vec<Genome>,
        rng: StdRng,
    ) -> Self {
        let networks = build_networks(
            &genomes,
            &registry.topology(),
            config.network_settings(),
            config.parallel,
        );
        let population: Vec<Member> = genomes
            .into_iter()
            .zip(networks)
            .enumerate()
            .map(|(index, (genome, network))| {
                Member::new(MemberId { generation: 0, index }, None, genome, network)
            })
            .collect();

        log::info!(
            "initialized population of {} ({} inputs, {} outputs)",
            population.len(),
            config.inputs,
            config.outputs
        );

        Self {
            state: TrainerState::new(0, config.slots, population.len()),
            config,
            registry,
            population,
            species: SpeciesSet::new(),
            rng,
        }
    }

    /// The run's configuration.
    pub fn config(&self) -> &NeatConfig {
        &self.config
    }

    /// Current generation, starting at 0.
    pub fn generation(&self) -> usize {
        self.state.generation
    }

    /// Returns `true` once `max_generations` generations have completed.
    pub fn is_finished(&self) -> bool {
        self.state.generation >= self.config.max_generations
    }

    /// Snapshot of the global counters; prefix exports with it.
    pub fn topology(&self) -> Topology {
        self.registry.topology()
    }

    /// Per-generation bookkeeping.
    pub fn state(&self) -> &TrainerState {
        &self.state
    }

    /// The current population.
    pub fn population(&self) -> &[Member] {
        &self.population
    }

    /// Member at `index`.
    pub fn member(&self, index: usize) -> Result<&Member, NeatError> {
        self.population
            .get(index)
            .ok_or(NeatError::UnknownMember(index))
    }

    /// Species partition of the last evaluated generation. Empty until the
    /// first [`advance_generation`](Self::advance_generation).
    pub fn species(&self) -> &SpeciesSet {
        &self.species
    }

    /// Runs member `index`'s network and returns its decision.
    ///
    /// # Errors
    /// Fails if `index` is out of range or `inputs` has the wrong length.
    pub fn execute(&self, index: usize, inputs: &[f64]) -> Result<usize, NeatError> {
        let expected = self.config.inputs as usize;
        if inputs.len() != expected {
            return Err(NeatError::InputLength {
                expected,
                actual: inputs.len(),
            });
        }
        Ok(self.member(index)?.network.execute(inputs))
    }

    /// Sets member `index`'s score, replacing any earlier report.
    ///
    /// # Errors
    /// Fails if `index` is out of range.
    pub fn report_score(&mut self, index: usize, score: f64) -> Result<(), NeatError> {
        let member = self
            .population
            .get_mut(index)
            .ok_or(NeatError::UnknownMember(index))?;
        member.score = score;
        self.state.record(index, score);
        Ok(())
    }

    /// Member index currently assigned to `slot`.
    pub fn slot_member(&self, slot: usize) -> Result<usize, NeatError> {
        self.state.slot(slot)
    }

    /// Runs the network assigned to `slot`.
    pub fn execute_slot(&self, slot: usize, inputs: &[f64]) -> Result<usize, NeatError> {
        self.execute(self.state.slot(slot)?, inputs)
    }

    /// Reports a score for the member assigned to `slot`.
    pub fn report_slot_score(&mut self, slot: usize, score: f64) -> Result<(), NeatError> {
        let index = self.state.slot(slot)?;
        self.report_score(index, score)
    }

    /// Moves `slot` on to the next unevaluated member.
    ///
    /// Returns `Ok(None)` when none are left.
    pub fn move_to_next(&mut self, slot: usize) -> Result<Option<usize>, NeatError> {
        self.state.assign_next(slot)
    }

    /// Returns `true` once every member has a reported score.
    pub fn is_generation_over(&self) -> bool {
        self.state.is_generation_over()
    }

    /// Highest score reported this generation.
    pub fn top_score(&self) -> Option<f64> {
        self.state.top_score()
    }

    /// Scores every member with `fitness` and records the results as if
    /// reported through [`report_score`](Self::report_score).
    ///
    /// Runs in parallel when the `parallel` feature and
    /// [`NeatConfig::parallel`] are both on.
    pub fn evaluate_with<F>(&mut self, fitness: F)
    where
        F: Fn(&Network) -> f64 + Sync,
    {
        let scores = score_networks(&self.population, &fitness, self.config.parallel);
        for (index, score) in scores.into_iter().enumerate() {
            self.population[index].score = score;
            self.state.record(index, score);
        }
    }

    /// Replaces the population with the next generation.
    ///
    /// Speciates against the previous generation's representatives,
    /// allocates offspring by adjusted fitness, culls each species below
    /// the reproduction percentile, breeds by crossover, mutates weights
    /// then structure, and rebuilds every network against one topology
    /// snapshot.
    ///
    /// # Panics
    /// Panics if some member has no reported score
    /// (see [`is_generation_over`](Self::is_generation_over)).
    pub fn advance_generation(&mut self) -> GenerationStats {
        assert!(
            self.state.is_generation_over(),
            "advance_generation called with {} of {} members scored",
            self.state.scored_count(),
            self.population.len()
        );

        let generation = self.state.generation;
        let next = generation + 1;

        // Speciate
        let representatives = self.species.representatives(&mut self.rng);
        let partition = speciate(
            &self.population,
            representatives,
            &self.config.compatibility,
        );

        // Adjust fitness and allocate
        let adjusted = adjusted_fitness(&self.population, &partition);
        let allocation = allocate_offspring(&adjusted, self.config.population_size);

        // Cull
        let eligible = cull(
            &self.population,
            &partition,
            self.config.reproduction_percentile,
        );

        // Reproduce
        let mut genomes = Vec::with_capacity(self.config.population_size);
        let mut lineage = Vec::with_capacity(self.config.population_size);
        for (s, (parents, &count)) in eligible.iter().zip(&allocation).enumerate() {
            log::debug!(
                "species {s}: {} members, {} eligible, {count} offspring",
                partition[s].len(),
                parents.len()
            );
            if parents.is_empty() {
                continue;
            }
            for _ in 0..count {
                let a = &self.population[parents[self.rng.random_range(0..parents.len())]];
                let b = &self.population[parents[self.rng.random_range(0..parents.len())]];
                genomes.push(crossover(&a.genome, a.score, &b.genome, b.score, &mut self.rng));
                lineage.push((a.id, b.id));
            }
        }

        // Mutate
        for genome in &mut genomes {
            mutate_weights(
                genome,
                self.config.weight_mutation_rate,
                self.config.weight_mutation,
                &mut self.rng,
            );
            mutate_structure(
                genome,
                self.config.structure_mutation_rate,
                self.config.split,
                &mut self.registry,
                &mut self.rng,
            );
        }

        // Rebuild
        let networks = build_networks(
            &genomes,
            &self.registry.topology(),
            self.config.network_settings(),
            self.config.parallel,
        );

        let stats = GenerationStats {
            generation,
            species: partition.len(),
            offspring: genomes.len(),
            top_score: self.state.top_score(),
            mean_score: mean_score(&self.population),
            allocation,
        };

        self.species = SpeciesSet::from_partition(&self.population, &partition);
        self.population = genomes
            .into_iter()
            .zip(networks)
            .zip(lineage)
            .enumerate()
            .map(|(index, ((genome, network), parents))| {
                Member::new(
                    MemberId {
                        generation: next,
                        index,
                    },
                    Some(parents),
                    genome,
                    network,
                )
            })
            .collect();
        self.state = TrainerState::new(next, self.config.slots, self.population.len());

        log::info!(
            "generation {generation}: {} species, top {:?}, mean {:.3}, {} offspring",
            stats.species,
            stats.top_score,
            stats.mean_score,
            stats.offspring
        );
        if self.population.is_empty() {
            log::warn!("generation {next} has no members");
        }

        stats
    }
}

fn create_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::seed_from_u64(rand::random()),
    }
}

fn mean_score(population: &[Member]) -> f64 {
    if population.is_empty() {
        return 0.0;
    }
    population.iter().map(|m| m.score).sum::<f64>() / population.len() as f64
}

/// Builds one network per genome against the same topology snapshot.
#[cfg_attr(not(feature = "parallel"), allow(unused_variables))]
fn build_networks(
    genomes: &[Genome],
    topology: &Topology,
    settings: NetworkSettings,
    parallel: bool,
) -> Vec<Network> {
    #[cfg(feature = "parallel")]
    if parallel {
        return genomes
            .par_iter()
            .map(|g| Network::build(g, topology, settings))
            .collect();
    }
    genomes
        .iter()
        .map(|g| Network::build(g, topology, settings))
        .collect()
}

#[cfg_attr(not(feature = "parallel"), allow(unused_variables))]
fn score_networks<F>(population: &[Member], fitness: &F, parallel: bool) -> Vec<f64>
where
    F: Fn(&Network) -> f64 + Sync,
{
    #[cfg(feature = "parallel")]
    if parallel {
        return population.par_iter().map(|m| fitness(&m.network)).collect();
    }
    population.iter().map(|m| fitness(&m.network)).collect()
}

// ============================================================================
// Tests
// ============================================================================
