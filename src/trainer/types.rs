//! Population member types.

use crate::genome::Genome;
use crate::network::Network;
use std::fmt;

/// Identifies a member by the generation it was born in and its position
/// in that generation's population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MemberId {
    /// Generation the member belongs to.
    pub generation: usize,
    /// Position in that generation's population.
    pub index: usize,
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.generation, self.index)
    }
}

/// One individual: a genome, the network built from it, and its score.
///
/// Higher scores are better.
#[derive(Debug, Clone)]
pub struct Member {
    /// Stable identifier.
    pub id: MemberId,
    /// Parents this member was bred from; `None` for genesis and seeds.
    pub parents: Option<(MemberId, MemberId)>,
    /// The member's genome.
    pub genome: Genome,
    /// Network built from `genome` against the generation's topology.
    pub network: Network,
    /// Last score reported for this member.
    pub score: f64,
}

impl Member {
    /// Creates an unscored member.
    pub fn new(
        id: MemberId,
        parents: Option<(MemberId, MemberId)>,
        genome: Genome,
        network: Network,
    ) -> Self {
        Self {
            id,
            parents,
            genome,
            network,
            score: 0.0,
        }
    }
}

/// Summary of one completed generation, returned by
/// [`Trainer::advance_generation`](super::Trainer::advance_generation).
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationStats {
    /// The generation that was just evaluated.
    pub generation: usize,
    /// Number of species the evaluated population split into.
    pub species: usize,
    /// Offspring requested from each species, in species order.
    pub allocation: Vec<usize>,
    /// Size of the new population.
    pub offspring: usize,
    /// Best score reported during the generation.
    pub top_score: Option<f64>,
    /// Mean member score.
    pub mean_score: f64,
}
