//! archsearch - Multi-objective neural architecture search
//!
//! This crate provides the orchestration layer of a NAS system:
//! - [`search_space`] - Discrete architecture space: operations, cells,
//!   candidates, seeded sampling, mutation, crossover
//! - [`objectives`] - Batched multi-objective evaluation under a budget,
//!   with analytic proxy objectives (params, latency, memory, accuracy)
//! - [`pareto`] - Non-dominated sorting into ordered Pareto tiers
//! - [`search`] - Orchestrators: successive halving, evolutionary Pareto
//!   search, random search, and the append-only search-state log
//! - [`cli`] - Command-line interface
//!
//! Gradient-based training, tokenizers, and ONNX-backed measurement are
//! deliberately out of scope; they plug in behind the
//! [`Objective`](objectives::Objective) and
//! [`DatasetProvider`](objectives::DatasetProvider) seams.

// Core error handling
pub mod error;

// Search space and evaluation
pub mod objectives;
pub mod pareto;
pub mod search_space;

// Orchestrators
pub mod search;

// CLI
pub mod cli;

pub use error::{Result, SearchError};
pub use objectives::{
    evaluate_models, DatasetProvider, Objective, ObjectiveResults, ObjectiveSet, OptimizeDirection,
};
pub use pareto::{dominates, non_dominated_sort, ParetoTier};
pub use search::{
    EvolutionConfig, EvolutionParetoSearch, NetworkEvolutionSearch, RandomSearch,
    RandomSearchConfig, SearchResults, SuccessiveHalving, SuccessiveHalvingConfig,
};
pub use search_space::{
    ArchCandidate, DiscreteSearchSpace, NetworkArchitecture, NetworkSearchSpace, SearchSpaceConfig,
};
