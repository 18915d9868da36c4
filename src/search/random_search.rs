//! Random search baseline
//!
//! Samples a population once, evaluates every objective at a fixed budget,
//! and ranks the population by non-dominated sorting. Used as the baseline
//! the budgeted orchestrators are compared against.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, SearchError};
use crate::objectives::{evaluate_models, DatasetProvider, ObjectiveSet};
use crate::pareto::{non_dominated_sort, ParetoTier};
use crate::search_space::{ArchCandidate, DiscreteSearchSpace};

use super::results::SearchResults;

/// Random search parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomSearchConfig {
    /// Number of candidates to sample
    pub num_models: usize,
    /// Budget every candidate is evaluated at
    pub budget: f64,
    /// Directory for the state table and snapshot
    pub output_dir: PathBuf,
}

impl Default for RandomSearchConfig {
    fn default() -> Self {
        Self {
            num_models: 50,
            budget: 1.0,
            output_dir: PathBuf::from("random_search_output"),
        }
    }
}

/// Outcome of a random search: the recorded state plus the ranking
#[derive(Debug, Clone)]
pub struct RandomSearchOutcome {
    /// Recorded state (one iteration)
    pub results: SearchResults,
    /// Evaluated population in sampling order
    pub population: Vec<ArchCandidate>,
    /// Pareto tiers over the population
    pub tiers: Vec<ParetoTier>,
}

/// Random search orchestrator
pub struct RandomSearch<S: DiscreteSearchSpace> {
    config: RandomSearchConfig,
    space: S,
    objectives: ObjectiveSet,
}

impl<S: DiscreteSearchSpace> RandomSearch<S> {
    /// Create an orchestrator; invalid configuration is fatal here.
    pub fn new(config: RandomSearchConfig, space: S, objectives: ObjectiveSet) -> Result<Self> {
        if config.num_models == 0 {
            return Err(SearchError::ConfigError(
                "num_models must be positive".to_string(),
            ));
        }
        if objectives.is_empty() {
            return Err(SearchError::ConfigError(
                "at least one objective is required".to_string(),
            ));
        }
        fs::create_dir_all(&config.output_dir)?;
        Ok(Self {
            config,
            space,
            objectives,
        })
    }

    /// Sample, evaluate once, rank, persist, return.
    pub fn search(&mut self, dataset: &dyn DatasetProvider) -> Result<RandomSearchOutcome> {
        info!(
            num_models = self.config.num_models,
            budget = self.config.budget,
            "starting random search"
        );

        let mut population: Vec<ArchCandidate> = (0..self.config.num_models)
            .map(|_| self.space.random_sample())
            .collect();

        let obj_results =
            evaluate_models(&mut population, &self.objectives, dataset, self.config.budget)?;

        let mut results = SearchResults::new(self.objectives.names());
        let mut extra = BTreeMap::new();
        extra.insert(
            "budget".to_string(),
            vec![self.config.budget; population.len()],
        );
        results.add_iteration_results(&population, &obj_results, extra);

        let matrix = obj_results.minimizing_matrix(&self.objectives)?;
        let tiers = non_dominated_sort(&matrix);

        results.save_search_state(&self.config.output_dir.join("search_state_0.csv"))?;
        results.save_pareto_snapshot(&self.config.output_dir, 0, &population, &tiers)?;
        let best = tiers
            .first()
            .and_then(|t| t.members.first())
            .map(|&i| population[i].archid.clone());
        results.save_summary(&self.config.output_dir, best.as_deref())?;

        info!(
            frontier = tiers.first().map(|t| t.members.len()).unwrap_or(0),
            "random search finished"
        );

        Ok(RandomSearchOutcome {
            results,
            population,
            tiers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objectives::estimators::standard_objectives;
    use crate::objectives::SyntheticDataset;
    use crate::search_space::NetworkSearchSpace;

    #[test]
    fn test_zero_models_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = RandomSearchConfig {
            num_models: 0,
            output_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let space = NetworkSearchSpace::mlp(16, 2, 1);
        assert!(RandomSearch::new(config, space, standard_objectives(16)).is_err());
    }

    #[test]
    fn test_search_ranks_whole_population() {
        let dir = tempfile::tempdir().unwrap();
        let config = RandomSearchConfig {
            num_models: 20,
            output_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let space = NetworkSearchSpace::mlp(16, 2, 1);
        let mut search = RandomSearch::new(config, space, standard_objectives(16)).unwrap();

        let outcome = search.search(&SyntheticDataset::default()).unwrap();

        assert_eq!(outcome.population.len(), 20);
        let ranked: usize = outcome.tiers.iter().map(|t| t.members.len()).sum();
        assert_eq!(ranked, 20);
        assert_eq!(outcome.results.num_iterations(), 1);
        assert!(dir.path().join("search_state_0.csv").exists());
        assert!(dir.path().join("summary.json").exists());
    }
}
