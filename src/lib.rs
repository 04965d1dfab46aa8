//! NeuroEvolution of Augmenting Topologies (NEAT) for game-playing agents.
//!
//! Evolves neural networks whose topology grows over time, scored by an
//! external simulation such as a Pac-Man game loop:
//!
//! - **Genomes**: connection genes tagged with global innovation ids, a
//!   shared [`InnovationRegistry`](genome::InnovationRegistry), weight and
//!   structure mutation, alignment, compatibility distance and crossover.
//! - **Networks**: matrix form of a genome that maps an input vector to one
//!   of four decisions, tolerating recurrent connections by bounded
//!   relaxation.
//! - **Training**: speciation, fitness sharing, per-species culling and
//!   reproduction, driven one generation at a time.
//!
//! # Quick Start
//!
//! ```
//! use u_neat::trainer::{NeatConfig, Trainer};
//!
//! let config = NeatConfig::default()
//!     .with_population_size(30)
//!     .with_slots(5)
//!     .with_seed(1);
//! let mut trainer = Trainer::new(config).unwrap();
//!
//! while trainer.generation() < 3 {
//!     trainer.evaluate_with(|net| {
//!         let up = net.execute(&[1.0, 0.0, 0.0, 0.0]) == 0;
//!         if up { 1.0 } else { 0.0 }
//!     });
//!     trainer.advance_generation();
//! }
//! ```
//!
//! # Features
//!
//! - `parallel` (default): rebuild and batch-evaluate networks with rayon
//! - `serde`: `Serialize`/`Deserialize` for genomes, networks and configs

pub mod error;
pub mod genome;
pub mod network;
pub mod trainer;

pub use error::NeatError;
