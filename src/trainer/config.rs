//! Trainer configuration.
//!
//! [`NeatConfig`] holds every parameter of a training run.

use crate::error::NeatError;
use crate::genome::{CompatibilityParams, SplitPolicy, WeightMutation};
use crate::network::{Activation, NetworkSettings, OutputActivation};

/// Configuration for a NEAT training run.
///
/// # Defaults
///
/// ```
/// use u_neat::trainer::NeatConfig;
///
/// let config = NeatConfig::default();
/// assert_eq!(config.population_size, 100);
/// assert_eq!(config.inputs, 4);
/// assert_eq!(config.outputs, 4);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use u_neat::genome::SplitPolicy;
/// use u_neat::trainer::NeatConfig;
///
/// let config = NeatConfig::default()
///     .with_population_size(50)
///     .with_io(6, 4)
///     .with_split(SplitPolicy::Adaptive)
///     .with_reproduction_percentile(0.5)
///     .with_seed(7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NeatConfig {
    /// Number of individuals per generation.
    ///
    /// Offspring allocation rounds per species, so later generations may
    /// drift from this by up to `species - 1`.
    pub population_size: usize,

    /// Number of generations the driver intends to run.
    pub max_generations: usize,

    /// Number of simulations that evaluate members concurrently.
    pub slots: usize,

    /// Length of the input vector.
    pub inputs: u32,

    /// Number of output nodes. Decisions use the first four.
    pub outputs: u32,

    /// Per-gene probability of a weight mutation (0.0–1.0).
    pub weight_mutation_rate: f64,

    /// How a mutated weight changes.
    pub weight_mutation: WeightMutation,

    /// Per-child probability of one structural mutation (0.0–1.0).
    pub structure_mutation_rate: f64,

    /// Add-node vs. add-connection choice.
    pub split: SplitPolicy,

    /// Speciation coefficients and threshold.
    pub compatibility: CompatibilityParams,

    /// Fraction of each species (by ascending score) excluded from breeding
    /// (0.0–1.0). `0.8` keeps roughly the top fifth.
    pub reproduction_percentile: f64,

    /// Bias added before every activation.
    pub bias: f64,

    /// Hidden-node activation.
    pub activation: Activation,

    /// Output-layer activation.
    pub output_activation: OutputActivation,

    /// Whether to rebuild and batch-evaluate networks in parallel using
    /// rayon. Ignored without the `parallel` feature.
    pub parallel: bool,

    /// Random seed for reproducibility.
    ///
    /// `None` uses a random seed.
    pub seed: Option<u64>,
}

impl Default for NeatConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            max_generations: 100,
            slots: 10,
            inputs: 4,
            outputs: 4,
            weight_mutation_rate: 0.1,
            weight_mutation: WeightMutation::Reset,
            structure_mutation_rate: 0.8,
            split: SplitPolicy::Fixed(0.5),
            compatibility: CompatibilityParams::default(),
            reproduction_percentile: 0.8,
            bias: 1.0,
            activation: Activation::Tanh,
            output_activation: OutputActivation::Softmax,
            parallel: true,
            seed: None,
        }
    }
}

impl NeatConfig {
    /// Sets the population size.
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    /// Sets the maximum number of generations.
    pub fn with_max_generations(mut self, n: usize) -> Self {
        self.max_generations = n;
        self
    }

    /// Sets the number of concurrent simulation slots.
    pub fn with_slots(mut self, n: usize) -> Self {
        self.slots = n;
        self
    }

    /// Sets the input and output counts.
    pub fn with_io(mut self, inputs: u32, outputs: u32) -> Self {
        self.inputs = inputs;
        self.outputs = outputs;
        self
    }

    /// Sets the per-gene weight mutation rate.
    pub fn with_weight_mutation_rate(mut self, rate: f64) -> Self {
        self.weight_mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the weight mutation policy.
    pub fn with_weight_mutation(mut self, policy: WeightMutation) -> Self {
        self.weight_mutation = policy;
        self
    }

    /// Sets the structural mutation rate.
    pub fn with_structure_mutation_rate(mut self, rate: f64) -> Self {
        self.structure_mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the add-node / add-connection split.
    ///
    /// A fixed probability is clamped into `[0, 1]`.
    pub fn with_split(mut self, split: SplitPolicy) -> Self {
        self.split = match split {
            SplitPolicy::Fixed(p) => SplitPolicy::Fixed(p.clamp(0.0, 1.0)),
            SplitPolicy::Adaptive => SplitPolicy::Adaptive,
        };
        self
    }

    /// Sets the compatibility coefficients and threshold.
    pub fn with_compatibility(mut self, params: CompatibilityParams) -> Self {
        self.compatibility = params;
        self
    }

    /// Sets the reproduction percentile.
    pub fn with_reproduction_percentile(mut self, percentile: f64) -> Self {
        self.reproduction_percentile = percentile.clamp(0.0, 1.0);
        self
    }

    /// Sets the bias.
    pub fn with_bias(mut self, bias: f64) -> Self {
        self.bias = bias;
        self
    }

    /// Sets the hidden-node activation.
    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    /// Sets the output-layer activation.
    pub fn with_output_activation(mut self, activation: OutputActivation) -> Self {
        self.output_activation = activation;
        self
    }

    /// Enables or disables parallel rebuild and evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Network evaluation parameters derived from this configuration.
    pub fn network_settings(&self) -> NetworkSettings {
        NetworkSettings {
            bias: self.bias,
            activation: self.activation,
            output_activation: self.output_activation,
        }
    }

    /// Validates the configuration.
    ///
    /// Returns [`NeatError::InvalidConfig`] describing the first invalid
    /// parameter.
    pub fn validate(&self) -> Result<(), NeatError> {
        let invalid = |msg: &str| -> Result<(), NeatError> { Err(NeatError::InvalidConfig(msg.into())) };

        if self.population_size == 0 {
            return invalid("population_size must be at least 1");
        }
        if self.max_generations == 0 {
            return invalid("max_generations must be at least 1");
        }
        if self.inputs == 0 {
            return invalid("inputs must be at least 1");
        }
        if self.outputs == 0 {
            return invalid("outputs must be at least 1");
        }
        if self.slots == 0 {
            return invalid("slots must be at least 1");
        }
        if self.slots > self.population_size {
            return invalid("slots must not exceed population_size");
        }
        if !(0.0..=1.0).contains(&self.weight_mutation_rate)
            || !(0.0..=1.0).contains(&self.structure_mutation_rate)
            || !(0.0..=1.0).contains(&self.reproduction_percentile)
        {
            return invalid("rates and percentiles must lie in [0, 1]");
        }
        if let SplitPolicy::Fixed(p) = self.split {
            if !(0.0..=1.0).contains(&p) {
                return invalid("split probability must lie in [0, 1]");
            }
        }
        let c = &self.compatibility;
        if !(c.threshold.is_finite() && c.threshold > 0.0) {
            return invalid("compatibility threshold must be positive and finite");
        }
        if !(c.c1.is_finite() && c.c2.is_finite() && c.c3.is_finite()) {
            return invalid("compatibility coefficients must be finite");
        }
        if !self.bias.is_finite() {
            return invalid("bias must be finite");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NeatConfig::default();
        assert_eq!(config.population_size, 100);
        assert_eq!(config.max_generations, 100);
        assert_eq!(config.slots, 10);
        assert!((config.weight_mutation_rate - 0.1).abs() < 1e-10);
        assert!((config.structure_mutation_rate - 0.8).abs() < 1e-10);
        assert_eq!(config.split, SplitPolicy::Fixed(0.5));
        assert!((config.reproduction_percentile - 0.8).abs() < 1e-10);
        assert!((config.compatibility.threshold - 2.0).abs() < 1e-10);
        assert_eq!(config.activation, Activation::Tanh);
        assert_eq!(config.output_activation, OutputActivation::Softmax);
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = NeatConfig::default()
            .with_population_size(20)
            .with_max_generations(5)
            .with_slots(4)
            .with_io(6, 5)
            .with_weight_mutation(WeightMutation::Perturb)
            .with_bias(0.0)
            .with_activation(Activation::Sigmoid)
            .with_output_activation(OutputActivation::Elementwise(Activation::Identity))
            .with_parallel(false)
            .with_seed(42);

        assert_eq!(config.population_size, 20);
        assert_eq!(config.max_generations, 5);
        assert_eq!(config.slots, 4);
        assert_eq!((config.inputs, config.outputs), (6, 5));
        assert_eq!(config.weight_mutation, WeightMutation::Perturb);
        assert!(!config.parallel);
        assert_eq!(config.seed, Some(42));

        let settings = config.network_settings();
        assert_eq!(settings.bias, 0.0);
        assert_eq!(settings.activation, Activation::Sigmoid);
    }

    #[test]
    fn test_clamp_rates() {
        let config = NeatConfig::default()
            .with_weight_mutation_rate(1.5)
            .with_structure_mutation_rate(-0.5)
            .with_reproduction_percentile(2.0)
            .with_split(SplitPolicy::Fixed(-1.0));

        assert!((config.weight_mutation_rate - 1.0).abs() < 1e-10);
        assert!((config.structure_mutation_rate - 0.0).abs() < 1e-10);
        assert!((config.reproduction_percentile - 1.0).abs() < 1e-10);
        assert_eq!(config.split, SplitPolicy::Fixed(0.0));
    }

    #[test]
    fn test_validate_rejects_empty_population() {
        let config = NeatConfig::default().with_population_size(0).with_slots(0);
        assert!(matches!(config.validate(), Err(NeatError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_zero_io() {
        assert!(NeatConfig::default().with_io(0, 4).validate().is_err());
        assert!(NeatConfig::default().with_io(4, 0).validate().is_err());
    }

    #[test]
    fn test_validate_slots() {
        let config = NeatConfig::default().with_population_size(5).with_slots(6);
        assert!(config.validate().is_err());
        let config = NeatConfig::default().with_slots(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_threshold() {
        let config = NeatConfig::default().with_compatibility(CompatibilityParams {
            threshold: 0.0,
            ..CompatibilityParams::default()
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_raw_field_out_of_range() {
        let mut config = NeatConfig::default();
        config.weight_mutation_rate = 3.0;
        assert!(config.validate().is_err());

        let mut config = NeatConfig::default();
        config.bias = f64::NAN;
        assert!(config.validate().is_err());
    }
}
