//! Search orchestrators
//!
//! Three control loops over one search-space/objective seam:
//! successive halving (geometric budgets, tier culling), evolutionary
//! Pareto search (mutation/crossover over the frontier), and a random
//! search baseline. All record into the append-only [`SearchResults`] log.

pub mod evolution_pareto;
pub mod random_search;
pub mod results;
pub mod successive_halving;

pub use evolution_pareto::{
    EvolutionConfig, EvolutionOutcome, EvolutionParetoSearch, NetworkEvolutionSearch,
};
pub use random_search::{RandomSearch, RandomSearchConfig, RandomSearchOutcome};
pub use results::{IterationRecord, SearchResults, SearchSummary};
pub use successive_halving::{SuccessiveHalving, SuccessiveHalvingConfig};
