//! Population training.
//!
//! [`Trainer`] runs the NEAT generation loop: members are evaluated by an
//! external driver (one call per member, through simulation slots, or in a
//! batch with [`Trainer::evaluate_with`]), then
//! [`Trainer::advance_generation`] speciates, culls, breeds and mutates to
//! produce the next population.
//!
//! # Key Types
//!
//! - [`NeatConfig`]: run parameters with builder methods and validation
//! - [`Trainer`]: owns population, species and the innovation registry
//! - [`TrainerState`]: slot cursors and per-generation score bookkeeping
//! - [`Member`], [`MemberId`]: one individual and its stable identifier
//! - [`GenerationStats`]: summary returned at each generation boundary
//!
//! # Submodules
//!
//! - [`species`]: speciation, fitness sharing, offspring allocation, culling
//!
//! # References
//!
//! - Stanley & Miikkulainen (2002), *Evolving Neural Networks through
//!   Augmenting Topologies*

mod config;
mod runner;
pub mod species;
mod types;

pub use config::NeatConfig;
pub use runner::{Trainer, TrainerState};
pub use species::{Species, SpeciesSet};
pub use types::{GenerationStats, Member, MemberId};
