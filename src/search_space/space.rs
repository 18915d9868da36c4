//! Discrete search space
//!
//! The `DiscreteSearchSpace` trait is the seam the orchestrators talk to:
//! random sampling, deterministic seeded retrieval, and architecture
//! persistence. `NetworkSearchSpace` is the concrete cell-based space with
//! mutation and crossover operators, both constrained to the declared
//! configuration limits.

use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::Path;

use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SearchError};

use super::arch::{ArchCandidate, NetworkArchitecture};
use super::ops::{Cell, CellType, Operation, OperationType};

/// The search-space collaborator used by all orchestrators
pub trait DiscreteSearchSpace {
    /// Draw one candidate using the space's own random state
    fn random_sample(&mut self) -> ArchCandidate;

    /// Retrieve the candidate deterministically identified by a seed list.
    /// The same seeds always yield the same candidate.
    fn get(&self, seeds: &[u64]) -> ArchCandidate;

    /// Serialize a candidate's architecture to a file
    fn save_arch(&self, candidate: &ArchCandidate, path: &Path) -> Result<()>;
}

/// Configuration for the cell-based search space
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSpaceConfig {
    /// Available operations
    pub operations: Vec<OperationType>,
    /// Minimum hidden dimension
    pub min_hidden_dim: usize,
    /// Maximum hidden dimension
    pub max_hidden_dim: usize,
    /// Hidden dimension step
    pub hidden_dim_step: usize,
    /// Minimum number of layers
    pub min_layers: usize,
    /// Maximum number of layers
    pub max_layers: usize,
    /// Number of nodes per cell
    pub nodes_per_cell: usize,
    /// Maximum number of input connections per node
    pub max_inputs_per_node: usize,
    /// Dropout rate options
    pub dropout_rates: Vec<f64>,
    /// Kernel size options for convolutions
    pub kernel_sizes: Vec<usize>,
}

impl Default for SearchSpaceConfig {
    fn default() -> Self {
        Self {
            operations: OperationType::mlp_ops(),
            min_hidden_dim: 32,
            max_hidden_dim: 256,
            hidden_dim_step: 32,
            min_layers: 2,
            max_layers: 6,
            nodes_per_cell: 4,
            max_inputs_per_node: 2,
            dropout_rates: vec![0.0, 0.1, 0.2, 0.3, 0.5],
            kernel_sizes: vec![3, 5, 7],
        }
    }
}

impl SearchSpaceConfig {
    fn validate(&self) -> Result<()> {
        if self.operations.is_empty() {
            return Err(SearchError::ConfigError(
                "search space has no operations".to_string(),
            ));
        }
        if self.min_layers == 0 || self.min_layers > self.max_layers {
            return Err(SearchError::InvalidParameter {
                name: "min_layers".to_string(),
                value: self.min_layers.to_string(),
                reason: format!("must be in 1..={}", self.max_layers),
            });
        }
        if self.min_hidden_dim == 0
            || self.min_hidden_dim > self.max_hidden_dim
            || self.hidden_dim_step == 0
        {
            return Err(SearchError::ConfigError(
                "invalid hidden dimension range".to_string(),
            ));
        }
        if self.nodes_per_cell == 0 {
            return Err(SearchError::ConfigError(
                "nodes_per_cell must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Cell-based discrete architecture search space
#[derive(Debug, Clone)]
pub struct NetworkSearchSpace {
    /// Configuration
    pub config: SearchSpaceConfig,
    /// Cached hidden dim options
    hidden_dims: Vec<usize>,
    /// Input/output dims stamped on every sample
    input_dim: usize,
    output_dim: usize,
    /// Random state for `random_sample`
    rng: Xoshiro256PlusPlus,
}

impl NetworkSearchSpace {
    /// Create a new search space
    pub fn new(
        config: SearchSpaceConfig,
        input_dim: usize,
        output_dim: usize,
        seed: Option<u64>,
    ) -> Result<Self> {
        config.validate()?;
        let hidden_dims: Vec<usize> = (config.min_hidden_dim..=config.max_hidden_dim)
            .step_by(config.hidden_dim_step)
            .collect();
        let rng = match seed {
            Some(s) => Xoshiro256PlusPlus::seed_from_u64(s),
            None => Xoshiro256PlusPlus::from_entropy(),
        };

        Ok(Self {
            config,
            hidden_dims,
            input_dim,
            output_dim,
            rng,
        })
    }

    /// Default space over flat feature vectors
    pub fn mlp(input_dim: usize, output_dim: usize, seed: u64) -> Self {
        // default config is always valid
        Self::new(SearchSpaceConfig::default(), input_dim, output_dim, Some(seed))
            .expect("default config is valid")
    }

    /// Default space over sequence data
    pub fn sequence(input_dim: usize, output_dim: usize, seed: u64) -> Self {
        let config = SearchSpaceConfig {
            operations: OperationType::sequence_ops(),
            ..SearchSpaceConfig::default()
        };
        Self::new(config, input_dim, output_dim, Some(seed)).expect("default config is valid")
    }

    /// Hidden dimension choices
    pub fn hidden_dim_choices(&self) -> &[usize] {
        &self.hidden_dims
    }

    /// Number of operation choices
    pub fn num_operations(&self) -> usize {
        self.config.operations.len()
    }

    /// Generate one architecture with the given random state
    fn sample_with(&self, rng: &mut Xoshiro256PlusPlus) -> NetworkArchitecture {
        let num_layers = rng.gen_range(self.config.min_layers..=self.config.max_layers);
        let hidden_dim = self.hidden_dims[rng.gen_range(0..self.hidden_dims.len())];
        let dropout_rate =
            self.config.dropout_rates[rng.gen_range(0..self.config.dropout_rates.len())];

        let mut arch = NetworkArchitecture::new(self.input_dim, self.output_dim)
            .with_hidden_dim(hidden_dim)
            .with_num_layers(num_layers);
        arch.dropout_rate = dropout_rate;

        for layer_idx in 0..num_layers {
            let cell_type = if layer_idx % 2 == 0 {
                CellType::Normal
            } else {
                CellType::Reduction
            };
            let mut cell = Cell::new(cell_type);

            for node_idx in 0..self.config.nodes_per_cell {
                let op_idx = rng.gen_range(0..self.config.operations.len());
                let op = self.build_op(self.config.operations[op_idx], hidden_dim, dropout_rate, rng);

                // each node may read from the cell input or any earlier node
                let max_inputs = (node_idx + 2).min(self.config.max_inputs_per_node);
                let num_inputs = rng.gen_range(1..=max_inputs);
                let mut inputs: Vec<usize> = (0..node_idx + 2).collect();
                inputs.shuffle(rng);
                inputs.truncate(num_inputs);
                inputs.sort_unstable();

                cell = cell.add_operation(op, inputs);
            }

            arch = arch.add_cell(cell);
        }

        // the identity encoding hashes per-op structure including kernel
        // size, so samples differing only there never share an archid
        arch.encoding = Self::reencode(&arch);
        arch
    }

    fn build_op(
        &self,
        op_type: OperationType,
        hidden_dim: usize,
        dropout_rate: f64,
        rng: &mut Xoshiro256PlusPlus,
    ) -> Operation {
        let mut op = Operation::new(op_type);
        if op_type.has_hidden_dim() {
            op = op.with_hidden_dim(hidden_dim);
        }
        if op_type == OperationType::MultiHeadAttention {
            op = op.with_num_heads(4);
        }
        if op_type == OperationType::Dropout {
            op = op.with_dropout(dropout_rate);
        }
        if op_type == OperationType::Conv1D {
            let k = self.config.kernel_sizes[rng.gen_range(0..self.config.kernel_sizes.len())];
            op = op.with_kernel_size(k);
        }
        op
    }

    /// Mutate an architecture, staying within the configured limits
    pub fn mutate(
        &self,
        arch: &NetworkArchitecture,
        rng: &mut Xoshiro256PlusPlus,
    ) -> NetworkArchitecture {
        let mut new_arch = arch.clone();

        match rng.gen_range(0..4) {
            0 => {
                new_arch.hidden_dim = self.hidden_dims[rng.gen_range(0..self.hidden_dims.len())];
            }
            1 => {
                new_arch.dropout_rate =
                    self.config.dropout_rates[rng.gen_range(0..self.config.dropout_rates.len())];
            }
            2 => {
                // swap one operation for another legal one
                if !new_arch.cells.is_empty() {
                    let cell_idx = rng.gen_range(0..new_arch.cells.len());
                    let hidden = new_arch.hidden_dim;
                    let dropout = new_arch.dropout_rate;
                    let cell = &mut new_arch.cells[cell_idx];
                    if !cell.operations.is_empty() {
                        let op_idx = rng.gen_range(0..cell.operations.len());
                        let new_type =
                            self.config.operations[rng.gen_range(0..self.config.operations.len())];
                        cell.operations[op_idx] = self.build_op(new_type, hidden, dropout, rng);
                    }
                }
            }
            _ => {
                // grow or shrink the cell stack
                let new_layers = rng.gen_range(self.config.min_layers..=self.config.max_layers);
                while new_arch.cells.len() < new_layers {
                    let cell = Cell::new(CellType::Normal)
                        .add_operation(Operation::dense(new_arch.hidden_dim), vec![0]);
                    new_arch.cells.push(cell);
                }
                while new_arch.cells.len() > new_layers {
                    new_arch.cells.pop();
                }
                new_arch.num_layers = new_layers;
            }
        }

        new_arch.encoding = Self::reencode(&new_arch);
        new_arch
    }

    /// Crossover two architectures
    pub fn crossover(
        &self,
        parent1: &NetworkArchitecture,
        parent2: &NetworkArchitecture,
        rng: &mut Xoshiro256PlusPlus,
    ) -> NetworkArchitecture {
        let mut child = NetworkArchitecture::new(parent1.input_dim, parent1.output_dim);

        child.hidden_dim = if rng.gen_bool(0.5) {
            parent1.hidden_dim
        } else {
            parent2.hidden_dim
        };
        child.dropout_rate = if rng.gen_bool(0.5) {
            parent1.dropout_rate
        } else {
            parent2.dropout_rate
        };
        child.num_layers = if rng.gen_bool(0.5) {
            parent1.num_layers
        } else {
            parent2.num_layers
        }
        .clamp(self.config.min_layers, self.config.max_layers);

        for i in 0..child.num_layers {
            let (first, second) = if rng.gen_bool(0.5) {
                (parent1, parent2)
            } else {
                (parent2, parent1)
            };
            let cell = first
                .cells
                .get(i)
                .or_else(|| second.cells.get(i))
                .cloned()
                .unwrap_or_else(|| {
                    Cell::new(CellType::Normal)
                        .add_operation(Operation::dense(child.hidden_dim), vec![0])
                });
            child.cells.push(cell);
        }

        child.encoding = Self::reencode(&child);
        child
    }

    /// Rebuild the identity encoding after structural edits
    fn reencode(arch: &NetworkArchitecture) -> Vec<usize> {
        let mut encoding = vec![arch.hidden_dim, arch.num_layers];
        for cell in &arch.cells {
            for (op, inputs) in cell.operations.iter().zip(&cell.input_indices) {
                let mut hasher = DefaultHasher::new();
                op.op_type.hash(&mut hasher);
                op.kernel_size.hash(&mut hasher);
                encoding.push(hasher.finish() as usize);
                encoding.extend(inputs.iter().copied());
            }
        }
        encoding
    }

    fn seed_from_list(seeds: &[u64]) -> u64 {
        let mut hasher = DefaultHasher::new();
        for s in seeds {
            s.hash(&mut hasher);
        }
        hasher.finish()
    }
}

impl DiscreteSearchSpace for NetworkSearchSpace {
    fn random_sample(&mut self) -> ArchCandidate {
        let mut rng = self.rng.clone();
        let arch = self.sample_with(&mut rng);
        self.rng = rng;
        ArchCandidate::new(arch)
    }

    fn get(&self, seeds: &[u64]) -> ArchCandidate {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(Self::seed_from_list(seeds));
        ArchCandidate::new(self.sample_with(&mut rng))
    }

    fn save_arch(&self, candidate: &ArchCandidate, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&candidate.arch)?;
        fs::write(path, json)?;
        Ok(())
    }
}
