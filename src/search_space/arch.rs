//! Architecture candidates
//!
//! A `NetworkArchitecture` is one point in the discrete search space; an
//! `ArchCandidate` pairs it with a stable identifier and the mutable metadata
//! map that objective evaluation writes measured values into.

use std::collections::BTreeMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::ops::Cell;

/// Complete network architecture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkArchitecture {
    /// Input dimension
    pub input_dim: usize,
    /// Output dimension
    pub output_dim: usize,
    /// Cells in the network
    pub cells: Vec<Cell>,
    /// Global hidden dimension
    pub hidden_dim: usize,
    /// Number of stacked cells
    pub num_layers: usize,
    /// Global dropout rate
    pub dropout_rate: f64,
    /// Flat encoding of the sampled choices, used for identity
    pub encoding: Vec<usize>,
}

impl NetworkArchitecture {
    /// Create new architecture
    pub fn new(input_dim: usize, output_dim: usize) -> Self {
        Self {
            input_dim,
            output_dim,
            cells: Vec::new(),
            hidden_dim: 64,
            num_layers: 3,
            dropout_rate: 0.1,
            encoding: Vec::new(),
        }
    }

    /// Set hidden dimension
    pub fn with_hidden_dim(mut self, dim: usize) -> Self {
        self.hidden_dim = dim;
        self
    }

    /// Set number of layers
    pub fn with_num_layers(mut self, n: usize) -> Self {
        self.num_layers = n;
        self
    }

    /// Add a cell
    pub fn add_cell(mut self, cell: Cell) -> Self {
        self.cells.push(cell);
        self
    }

    /// Total operations across all cells
    pub fn num_ops(&self) -> usize {
        self.cells.iter().map(Cell::num_ops).sum()
    }

    /// Stable identity hash over the sampled choices
    pub fn compute_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hidden_dim.hash(&mut hasher);
        self.num_layers.hash(&mut hasher);
        for idx in &self.encoding {
            idx.hash(&mut hasher);
        }
        hasher.finish()
    }
}

/// A search-space sample with identity and measured metadata
///
/// `metadata` maps objective name to the measured value, plus the `budget`
/// the measurement was taken under. Once an iteration record has been
/// written from this map, the record is never updated retroactively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchCandidate {
    /// Stable identifier derived from the architecture encoding
    pub archid: String,
    /// The architecture itself
    pub arch: NetworkArchitecture,
    /// Objective name -> measured value
    pub metadata: BTreeMap<String, f64>,
}

impl ArchCandidate {
    /// Wrap an architecture, deriving its identifier
    pub fn new(arch: NetworkArchitecture) -> Self {
        let archid = format!("{:016x}", arch.compute_hash());
        Self {
            archid,
            arch,
            metadata: BTreeMap::new(),
        }
    }

    /// Record a measured value
    pub fn set_metric(&mut self, name: impl Into<String>, value: f64) {
        self.metadata.insert(name.into(), value);
    }

    /// Look up a measured value
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metadata.get(name).copied()
    }
}
