//! Gene-encoded network topologies.
//!
//! A [`Genome`] is an ordered list of [`Gene`]s, each one a potential
//! connection tagged with a globally unique innovation id. Innovation ids
//! and hidden-node ids come from one [`InnovationRegistry`] so that any two
//! genomes of a run can be aligned gene by gene.
//!
//! # Key Types
//!
//! - [`Gene`], [`Genome`]: the encoding
//! - [`InnovationRegistry`], [`Topology`]: global counters and their snapshot
//! - [`CompatibilityParams`]: speciation distance coefficients
//!
//! # Submodules
//!
//! - [`alignment`]: innovation alignment, compatibility distance, crossover
//! - [`mutation`]: weight and structure mutation
//! - [`codec`]: delimited text form for export and seeding

pub mod alignment;
pub mod codec;
mod innovation;
pub mod mutation;
mod types;

pub use alignment::{align, compatibility, crossover, CompatibilityParams};
pub use innovation::{InnovationRegistry, Topology};
pub use mutation::{mutate_structure, mutate_weights, SplitPolicy, StructuralMutation, WeightMutation};
pub use types::{Gene, Genome, WEIGHT_LIMIT, WEIGHT_SCALE};
