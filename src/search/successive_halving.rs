//! Successive-halving multi-objective search
//!
//! Evaluates a shrinking population under a geometrically growing budget,
//! keeping only the best Pareto tiers each iteration. If the population
//! collapses to a single candidate it is declared the winner and persisted;
//! if the iteration limit is reached first, the recorded state is returned
//! as-is (best-effort budget exhaustion, not a failure).

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, SearchError};
use crate::objectives::{evaluate_models, DatasetProvider, ObjectiveSet};
use crate::pareto::non_dominated_sort;
use crate::search_space::{ArchCandidate, DiscreteSearchSpace};

use super::results::SearchResults;

/// Successive-halving parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessiveHalvingConfig {
    /// Maximum number of iterations
    pub num_iters: usize,
    /// Initial population size
    pub init_num_models: usize,
    /// Budget for the first iteration
    pub init_budget: f64,
    /// Budget growth factor per iteration; also sets the kept tier fraction
    pub budget_multiplier: f64,
    /// Base seed for deterministic initial sampling
    pub seed: u64,
    /// Directory for state tables, model files, and snapshots
    pub output_dir: PathBuf,
}

impl Default for SuccessiveHalvingConfig {
    fn default() -> Self {
        Self {
            num_iters: 10,
            init_num_models: 10,
            init_budget: 1.0,
            budget_multiplier: 2.0,
            seed: 1,
            output_dir: PathBuf::from("search_output"),
        }
    }
}

impl SuccessiveHalvingConfig {
    fn validate(&self) -> Result<()> {
        if self.init_num_models == 0 {
            return Err(SearchError::ConfigError(
                "init_num_models must be positive".to_string(),
            ));
        }
        if self.num_iters == 0 {
            return Err(SearchError::ConfigError(
                "num_iters must be positive".to_string(),
            ));
        }
        if self.budget_multiplier <= 1.0 {
            return Err(SearchError::InvalidParameter {
                name: "budget_multiplier".to_string(),
                value: self.budget_multiplier.to_string(),
                reason: "must be greater than 1".to_string(),
            });
        }
        if self.init_budget <= 0.0 {
            return Err(SearchError::InvalidParameter {
                name: "init_budget".to_string(),
                value: self.init_budget.to_string(),
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Successive-halving orchestrator
pub struct SuccessiveHalving<S: DiscreteSearchSpace> {
    config: SuccessiveHalvingConfig,
    space: S,
    objectives: ObjectiveSet,
    iter_num: usize,
    num_sampled_models: usize,
}

impl<S: DiscreteSearchSpace> SuccessiveHalving<S> {
    /// Create an orchestrator. Configuration violations are fatal here,
    /// before any evaluation happens.
    pub fn new(config: SuccessiveHalvingConfig, space: S, objectives: ObjectiveSet) -> Result<Self> {
        config.validate()?;
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
            iter_num: 0,
            num_sampled_models: 0,
        })
    }

    /// How many candidates have been drawn from the space
    pub fn num_sampled_models(&self) -> usize {
        self.num_sampled_models
    }

    /// Deterministic initial population from seed-derived indices
    fn sample_init_models(&mut self) -> Vec<ArchCandidate> {
        let population: Vec<ArchCandidate> = (0..self.config.init_num_models)
            .map(|i| self.space.get(&[self.config.seed + i as u64]))
            .collect();
        self.num_sampled_models += population.len();
        population
    }

    /// Run the search to completion and return the recorded state
    pub fn search(&mut self, dataset: &dyn DatasetProvider) -> Result<SearchResults> {
        let mut results = SearchResults::new(self.objectives.names());
        let mut budget = self.config.init_budget;
        let mut selected = self.sample_init_models();
        let mut winner = None;

        for i in 0..self.config.num_iters {
            if selected.len() <= 1 {
                if let Some(best) = selected.first() {
                    info!(archid = %best.archid, "search ended, single architecture selected");
                    self.space
                        .save_arch(best, &self.config.output_dir.join("final_model.json"))?;
                    winner = Some(best.archid.clone());
                }
                break;
            }

            info!(
                iteration = i,
                population = selected.len(),
                budget,
                "starting successive-halving iteration"
            );

            let obj_results = evaluate_models(&mut selected, &self.objectives, dataset, budget)?;

            let mut extra = BTreeMap::new();
            extra.insert("budget".to_string(), vec![budget; selected.len()]);
            results.add_iteration_results(&selected, &obj_results, extra);

            let models_dir = self
                .config
                .output_dir
                .join(format!("models_iter_{}", self.iter_num));
            fs::create_dir_all(&models_dir)?;
            for model in &selected {
                self.space
                    .save_arch(model, &models_dir.join(format!("{}.json", model.archid)))?;
            }

            results.save_search_state(
                &self
                    .config
                    .output_dir
                    .join(format!("search_state_{}.csv", self.iter_num)),
            )?;

            let matrix = obj_results.minimizing_matrix(&self.objectives)?;
            let tiers = non_dominated_sort(&matrix);
            results.save_pareto_snapshot(&self.config.output_dir, self.iter_num, &selected, &tiers)?;

            // keep the best 1/budget_multiplier fraction of tiers, at least one
            let keep = ((tiers.len() as f64 / self.config.budget_multiplier).floor() as usize).max(1);
            let next: Vec<ArchCandidate> = tiers
                .iter()
                .take(keep)
                .flat_map(|tier| tier.members.iter().map(|&idx| selected[idx].clone()))
                .collect();
            info!(kept = next.len(), tiers_kept = keep, "selected models for next iteration");
            selected = next;

            self.iter_num += 1;
            budget *= self.config.budget_multiplier;
        }

        results.save_summary(&self.config.output_dir, winner.as_deref())?;
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objectives::estimators::standard_objectives;
    use crate::objectives::SyntheticDataset;
    use crate::search_space::NetworkSearchSpace;

    fn setup(
        dir: &std::path::Path,
        init_num_models: usize,
        num_iters: usize,
    ) -> SuccessiveHalving<NetworkSearchSpace> {
        let config = SuccessiveHalvingConfig {
            num_iters,
            init_num_models,
            output_dir: dir.to_path_buf(),
            ..Default::default()
        };
        let space = NetworkSearchSpace::mlp(16, 2, 1);
        SuccessiveHalving::new(config, space, standard_objectives(16)).unwrap()
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = SuccessiveHalvingConfig {
            init_num_models: 0,
            output_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let space = NetworkSearchSpace::mlp(16, 2, 1);
        assert!(SuccessiveHalving::new(config, space, standard_objectives(16)).is_err());

        let config = SuccessiveHalvingConfig {
            budget_multiplier: 1.0,
            output_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let space = NetworkSearchSpace::mlp(16, 2, 1);
        assert!(SuccessiveHalving::new(config, space, standard_objectives(16)).is_err());

        let space = NetworkSearchSpace::mlp(16, 2, 1);
        let config = SuccessiveHalvingConfig {
            output_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        assert!(SuccessiveHalving::new(config, space, crate::objectives::ObjectiveSet::new()).is_err());
    }

    #[test]
    fn test_population_is_non_increasing() {
        let dir = tempfile::tempdir().unwrap();
        let mut search = setup(dir.path(), 16, 6);
        let dataset = SyntheticDataset::default();

        let results = search.search(&dataset).unwrap();
        let sizes = results.population_sizes();
        assert!(!sizes.is_empty());
        for window in sizes.windows(2) {
            assert!(window[1] <= window[0], "population grew: {:?}", sizes);
        }
    }

    #[test]
    fn test_budget_sequence_is_geometric() {
        let dir = tempfile::tempdir().unwrap();
        let mut search = setup(dir.path(), 16, 5);
        let dataset = SyntheticDataset::default();

        let results = search.search(&dataset).unwrap();
        for (i, record) in results.iterations().iter().enumerate() {
            let expected = 1.0 * 2.0_f64.powi(i as i32);
            let budgets = record.extra.get("budget").unwrap();
            assert!(budgets.iter().all(|&b| (b - expected).abs() < 1e-9));
        }
    }

    #[test]
    fn test_runs_at_most_num_iters() {
        let dir = tempfile::tempdir().unwrap();
        let mut search = setup(dir.path(), 32, 3);
        let dataset = SyntheticDataset::default();

        let results = search.search(&dataset).unwrap();
        assert!(results.num_iterations() <= 3);
    }

    #[test]
    fn test_state_files_written_per_iteration() {
        let dir = tempfile::tempdir().unwrap();
        let mut search = setup(dir.path(), 12, 4);
        let dataset = SyntheticDataset::default();

        let results = search.search(&dataset).unwrap();
        for i in 0..results.num_iterations() {
            assert!(dir.path().join(format!("search_state_{}.csv", i)).exists());
            assert!(dir.path().join(format!("models_iter_{}", i)).is_dir());
            assert!(dir.path().join(format!("pareto_front_{}.json", i)).exists());
        }
        assert!(dir.path().join("summary.json").exists());
    }

    #[test]
    fn test_single_candidate_is_immediate_winner() {
        let dir = tempfile::tempdir().unwrap();
        let mut search = setup(dir.path(), 1, 5);
        let dataset = SyntheticDataset::default();

        let results = search.search(&dataset).unwrap();
        // winner declared before any evaluation
        assert_eq!(results.num_iterations(), 0);
        assert!(dir.path().join("final_model.json").exists());
    }

    #[test]
    fn test_sampling_is_deterministic_across_runs() {
        let dir_a = tempfile::tempdir().unwrap();
        let dir_b = tempfile::tempdir().unwrap();
        let dataset = SyntheticDataset::default();

        let mut a = setup(dir_a.path(), 8, 2);
        let mut b = setup(dir_b.path(), 8, 2);
        let ra = a.search(&dataset).unwrap();
        let rb = b.search(&dataset).unwrap();

        assert_eq!(ra.iterations()[0].archids, rb.iterations()[0].archids);
    }
}
