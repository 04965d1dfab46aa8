//! Text serialization of genomes.
//!
//! A serialized genome is a comma-separated list: a topology descriptor
//! `innovations.inputs.hidden.outputs` followed by one record per gene,
//! `innovation.input_node.output_node.weight.enabled`, in genome order.
//! Weights are fixed-point integers and `enabled` is `1` or `0`.
//!
//! ```text
//! 18.2.1.2,1.2.0.100.0,2.2.1.-35.1,3.3.0.12.1,4.3.1.-90.1,17.2.4.100.1,18.4.0.100.1
//! ```
//!
//! Because weights are integers, decoding reproduces the genome exactly,
//! and a network rebuilt from it makes the same decisions.

use super::innovation::Topology;
use super::types::{Gene, Genome};
use crate::error::NeatError;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

const FIELD_SEPARATOR: char = '.';
const RECORD_SEPARATOR: char = ',';

impl fmt::Display for Gene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}.{}",
            self.innovation,
            self.input_node,
            self.output_node,
            self.weight,
            u8::from(self.enabled)
        )
    }
}

impl FromStr for Gene {
    type Err = NeatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: &str| NeatError::MalformedGene {
            record: s.to_string(),
            reason: reason.to_string(),
        };

        // Weights may be negative, so split on '.' only; '-' stays in the field.
        let fields: Vec<&str> = s.trim().split(FIELD_SEPARATOR).collect();
        if fields.len() != 5 {
            return Err(malformed("expected 5 fields"));
        }

        let innovation = fields[0]
            .parse()
            .map_err(|_| malformed("innovation is not an unsigned integer"))?;
        let input_node = fields[1]
            .parse()
            .map_err(|_| malformed("input node is not an unsigned integer"))?;
        let output_node = fields[2]
            .parse()
            .map_err(|_| malformed("output node is not an unsigned integer"))?;
        let weight = fields[3]
            .parse()
            .map_err(|_| malformed("weight is not an integer"))?;
        let enabled = match fields[4] {
            "1" => true,
            "0" => false,
            _ => return Err(malformed("enabled bit must be 0 or 1")),
        };

        Ok(Gene {
            innovation,
            input_node,
            output_node,
            weight,
            enabled,
        })
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.innovations, self.inputs, self.hidden, self.outputs
        )
    }
}

impl FromStr for Topology {
    type Err = NeatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || NeatError::MalformedTopology(s.to_string());
        let fields: Vec<&str> = s.trim().split(FIELD_SEPARATOR).collect();
        if fields.len() != 4 {
            return Err(malformed());
        }
        Ok(Topology {
            innovations: fields[0].parse().map_err(|_| malformed())?,
            inputs: fields[1].parse().map_err(|_| malformed())?,
            hidden: fields[2].parse().map_err(|_| malformed())?,
            outputs: fields[3].parse().map_err(|_| malformed())?,
        })
    }
}

/// Serializes a genome together with the topology it depends on.
pub fn encode(topology: &Topology, genome: &Genome) -> String {
    let mut out = topology.to_string();
    for gene in genome {
        out.push(RECORD_SEPARATOR);
        out.push_str(&gene.to_string());
    }
    out
}

/// Parses the output of [`encode`].
///
/// # Errors
///
/// Fails on a malformed descriptor or gene record, on a repeated innovation
/// id, and on genes whose nodes or innovation ids lie outside the
/// descriptor's counts.
pub fn decode(s: &str) -> Result<(Topology, Genome), NeatError> {
    let mut records = s.split(RECORD_SEPARATOR);
    let topology: Topology = records.next().unwrap_or_default().parse()?;

    let mut seen = HashSet::new();
    let mut genes = Vec::new();
    for record in records.filter(|r| !r.trim().is_empty()) {
        let gene: Gene = record.parse()?;
        if !seen.insert(gene.innovation) {
            return Err(NeatError::DuplicateInnovation(gene.innovation));
        }
        check_gene(&topology, &gene)?;
        genes.push(gene);
    }

    Ok((topology, Genome::from_genes(genes)))
}

/// Checks that every gene of `genome` fits the counters of `topology`.
///
/// A genome that passes can be mutated against a registry restored from
/// `topology` without reusing an innovation or node id it already holds.
///
/// # Errors
///
/// Returns [`NeatError::MalformedGene`] for an innovation id above the
/// descriptor's and [`NeatError::UnknownNode`] for a node id outside it.
pub fn check_genome(topology: &Topology, genome: &Genome) -> Result<(), NeatError> {
    genome.iter().try_for_each(|gene| check_gene(topology, gene))
}

fn check_gene(topology: &Topology, gene: &Gene) -> Result<(), NeatError> {
    if gene.innovation > topology.innovations {
        return Err(NeatError::MalformedGene {
            record: gene.to_string(),
            reason: format!(
                "innovation exceeds the descriptor's {}",
                topology.innovations
            ),
        });
    }
    let node_count = topology.node_count();
    for node in [gene.input_node, gene.output_node] {
        if node >= node_count {
            return Err(NeatError::UnknownNode {
                innovation: gene.innovation,
                node,
                node_count,
            });
        }
    }
    Ok(())
}
