//! Evolutionary Pareto search
//!
//! The abstract control loop is a trait with a provided `search` method;
//! implementors supply the sampling, evaluation, and variation operators.
//! Per iteration the loop runs a fixed sequence: side metrics, task
//! accuracy, frontier update, parent selection, then mutation and
//! crossover to produce the next unseen population. There is no early
//! exit; the loop always runs the full iteration count.

use std::collections::BTreeMap;
use std::path::PathBuf;

use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, SearchError};
use crate::objectives::{
    estimators::{LatencyObjective, MemoryObjective, ParamCountObjective, ProxyAccuracyObjective},
    evaluate_models, minimizing_matrix_from_metadata, results_from_metadata, DatasetProvider,
    ObjectiveSet, OptimizeDirection,
};
use crate::pareto::non_dominated_sort;
use crate::search_space::{ArchCandidate, DiscreteSearchSpace, NetworkSearchSpace};

use super::results::SearchResults;

/// Evolutionary search parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// Fixed number of iterations
    pub num_iters: usize,
    /// Initial population size
    pub init_num_models: usize,
    /// Mutations produced per selected parent
    pub mutations_per_parent: usize,
    /// Crossover offspring produced per iteration
    pub num_crossovers: usize,
    /// Evaluation budget (constant across iterations)
    pub budget: f64,
    /// Random seed for variation operators
    pub seed: u64,
    /// Directory for state tables and snapshots
    pub output_dir: PathBuf,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            num_iters: 10,
            init_num_models: 10,
            mutations_per_parent: 2,
            num_crossovers: 5,
            budget: 1.0,
            seed: 1,
            output_dir: PathBuf::from("evolution_output"),
        }
    }
}

impl EvolutionConfig {
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
        if self.mutations_per_parent == 0 && self.num_crossovers == 0 {
            return Err(SearchError::ConfigError(
                "at least one variation operator must produce offspring".to_string(),
            ));
        }
        Ok(())
    }
}

/// Final state of an evolutionary run
#[derive(Debug, Clone)]
pub struct EvolutionOutcome {
    /// Current Pareto frontier estimate over everything evaluated
    pub frontier: Vec<ArchCandidate>,
    /// Every candidate ever put into a population, in generation order.
    /// Evaluated generations carry their measured metrics; only the final
    /// offspring generation is unevaluated.
    pub history: Vec<ArchCandidate>,
    /// Iterations executed (always the configured count)
    pub iterations_run: usize,
}

/// Abstract evolutionary Pareto search loop
pub trait EvolutionParetoSearch {
    /// Draw the initial unseen population
    fn sample_init_population(&mut self, n: usize) -> Vec<ArchCandidate>;

    /// Measure side-channel metrics (latency, memory, size) into metadata
    fn calc_side_metrics(&mut self, population: &mut [ArchCandidate]) -> Result<()>;

    /// Measure the task-accuracy proxy into metadata
    fn calc_task_accuracy(&mut self, population: &mut [ArchCandidate]) -> Result<()>;

    /// Fold the freshly evaluated population into the frontier estimate
    fn update_pareto_frontier(&mut self, population: &[ArchCandidate]) -> Result<Vec<ArchCandidate>>;

    /// Produce mutated offspring, staying within search-space limits
    fn mutate_parents(&mut self, parents: &[ArchCandidate]) -> Vec<ArchCandidate>;

    /// Produce crossover offspring, staying within search-space limits
    fn crossover_parents(&mut self, parents: &[ArchCandidate]) -> Vec<ArchCandidate>;

    /// Choose parents from the frontier. Default: the whole frontier.
    fn select_parents(&mut self, frontier: &[ArchCandidate]) -> Vec<ArchCandidate> {
        frontier.to_vec()
    }

    /// Hook called after each iteration's frontier update
    fn on_iteration(
        &mut self,
        _iteration: usize,
        _evaluated: &[ArchCandidate],
        _frontier: &[ArchCandidate],
    ) -> Result<()> {
        Ok(())
    }

    /// Run the full loop for exactly `num_iters` iterations
    fn search(&mut self, num_iters: usize, init_num_models: usize) -> Result<EvolutionOutcome> {
        if init_num_models == 0 {
            return Err(SearchError::ConfigError(
                "init_num_models must be positive".to_string(),
            ));
        }
        if num_iters == 0 {
            return Err(SearchError::ConfigError(
                "num_iters must be positive".to_string(),
            ));
        }

        let mut unseen = self.sample_init_population(init_num_models);
        let mut history: Vec<ArchCandidate> = Vec::new();
        let mut frontier = Vec::new();

        for i in 0..num_iters {
            info!(
                iteration = i,
                unseen = unseen.len(),
                "starting evolution iteration"
            );

            self.calc_side_metrics(&mut unseen)?;
            self.calc_task_accuracy(&mut unseen)?;
            // snapshot after the metric stages so history entries carry
            // their measurements
            history.extend(unseen.iter().cloned());

            frontier = self.update_pareto_frontier(&unseen)?;
            self.on_iteration(i, &unseen, &frontier)?;

            let parents = self.select_parents(&frontier);
            let mutated = self.mutate_parents(&parents);
            let crossovered = self.crossover_parents(&parents);
            info!(
                frontier = frontier.len(),
                mutated = mutated.len(),
                crossovered = crossovered.len(),
                "produced next population"
            );

            unseen = crossovered.into_iter().chain(mutated).collect();
        }

        // the final offspring generation is produced but never evaluated
        history.extend(unseen);

        Ok(EvolutionOutcome {
            frontier,
            history,
            iterations_run: num_iters,
        })
    }
}

/// Concrete evolutionary search over [`NetworkSearchSpace`] with the
/// analytic proxy objectives.
pub struct NetworkEvolutionSearch {
    config: EvolutionConfig,
    space: NetworkSearchSpace,
    dataset: Box<dyn DatasetProvider>,
    side_objectives: ObjectiveSet,
    task_objectives: ObjectiveSet,
    /// Everything evaluated so far; the frontier is estimated over this pool
    evaluated: Vec<ArchCandidate>,
    results: SearchResults,
    rng: Xoshiro256PlusPlus,
}

impl NetworkEvolutionSearch {
    /// Create a concrete evolutionary search. Configuration violations are
    /// fatal here.
    pub fn new(
        config: EvolutionConfig,
        space: NetworkSearchSpace,
        dataset: Box<dyn DatasetProvider>,
        seq_len: usize,
    ) -> Result<Self> {
        config.validate()?;
        std::fs::create_dir_all(&config.output_dir)?;

        let side_objectives = ObjectiveSet::new()
            .with(
                "latency_ms",
                OptimizeDirection::Minimize,
                Box::new(LatencyObjective::new(seq_len)),
            )
            .with(
                "memory_mb",
                OptimizeDirection::Minimize,
                Box::new(MemoryObjective::new(seq_len)),
            )
            .with(
                "params",
                OptimizeDirection::Minimize,
                Box::new(ParamCountObjective),
            );
        let task_objectives = ObjectiveSet::new().with(
            "accuracy",
            OptimizeDirection::Maximize,
            Box::new(ProxyAccuracyObjective::default()),
        );

        let mut names = side_objectives.names();
        names.extend(task_objectives.names());
        let results = SearchResults::new(names);
        let rng = Xoshiro256PlusPlus::seed_from_u64(config.seed);

        Ok(Self {
            config,
            space,
            dataset,
            side_objectives,
            task_objectives,
            evaluated: Vec::new(),
            results,
            rng,
        })
    }

    fn combined_names(&self) -> Vec<String> {
        let mut names = self.side_objectives.names();
        names.extend(self.task_objectives.names());
        names
    }

    fn combined_directions(&self) -> Vec<OptimizeDirection> {
        let mut dirs = self.side_objectives.directions();
        dirs.extend(self.task_objectives.directions());
        dirs
    }

    /// The recorded per-iteration state
    pub fn results(&self) -> &SearchResults {
        &self.results
    }

    /// Run using the stored configuration and persist the summary
    pub fn run(&mut self) -> Result<EvolutionOutcome> {
        let (num_iters, init_num_models) = (self.config.num_iters, self.config.init_num_models);
        let outcome = self.search(num_iters, init_num_models)?;

        let best = outcome.frontier.first().map(|c| c.archid.clone());
        self.results
            .save_summary(&self.config.output_dir, best.as_deref())?;
        Ok(outcome)
    }
}

impl EvolutionParetoSearch for NetworkEvolutionSearch {
    fn sample_init_population(&mut self, n: usize) -> Vec<ArchCandidate> {
        (0..n).map(|_| self.space.random_sample()).collect()
    }

    fn calc_side_metrics(&mut self, population: &mut [ArchCandidate]) -> Result<()> {
        evaluate_models(
            population,
            &self.side_objectives,
            self.dataset.as_ref(),
            self.config.budget,
        )?;
        Ok(())
    }

    fn calc_task_accuracy(&mut self, population: &mut [ArchCandidate]) -> Result<()> {
        evaluate_models(
            population,
            &self.task_objectives,
            self.dataset.as_ref(),
            self.config.budget,
        )?;
        Ok(())
    }

    fn update_pareto_frontier(&mut self, population: &[ArchCandidate]) -> Result<Vec<ArchCandidate>> {
        self.evaluated.extend(population.iter().cloned());

        let matrix = minimizing_matrix_from_metadata(
            &self.evaluated,
            &self.combined_names(),
            &self.combined_directions(),
        )?;
        let tiers = non_dominated_sort(&matrix);

        Ok(tiers
            .first()
            .map(|tier| {
                tier.members
                    .iter()
                    .map(|&i| self.evaluated[i].clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    fn mutate_parents(&mut self, parents: &[ArchCandidate]) -> Vec<ArchCandidate> {
        let mut offspring = Vec::with_capacity(parents.len() * self.config.mutations_per_parent);
        for parent in parents {
            for _ in 0..self.config.mutations_per_parent {
                let arch = self.space.mutate(&parent.arch, &mut self.rng);
                offspring.push(ArchCandidate::new(arch));
            }
        }
        offspring
    }

    fn crossover_parents(&mut self, parents: &[ArchCandidate]) -> Vec<ArchCandidate> {
        if parents.len() < 2 {
            return Vec::new();
        }
        (0..self.config.num_crossovers)
            .map(|_| {
                let a = self.rng.gen_range(0..parents.len());
                let mut b = self.rng.gen_range(0..parents.len());
                while b == a {
                    b = self.rng.gen_range(0..parents.len());
                }
                let arch = self
                    .space
                    .crossover(&parents[a].arch, &parents[b].arch, &mut self.rng);
                ArchCandidate::new(arch)
            })
            .collect()
    }

    fn on_iteration(
        &mut self,
        iteration: usize,
        evaluated: &[ArchCandidate],
        _frontier: &[ArchCandidate],
    ) -> Result<()> {
        let names = self.combined_names();
        let obj_results = results_from_metadata(evaluated, &names)?;

        let mut extra = BTreeMap::new();
        extra.insert("budget".to_string(), vec![self.config.budget; evaluated.len()]);
        self.results
            .add_iteration_results(evaluated, &obj_results, extra);

        self.results.save_search_state(
            &self
                .config
                .output_dir
                .join(format!("search_state_{}.csv", iteration)),
        )?;

        let matrix =
            minimizing_matrix_from_metadata(evaluated, &names, &self.combined_directions())?;
        let tiers = non_dominated_sort(&matrix);
        self.results
            .save_pareto_snapshot(&self.config.output_dir, iteration, evaluated, &tiers)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objectives::SyntheticDataset;

    fn setup(dir: &std::path::Path, num_iters: usize) -> NetworkEvolutionSearch {
        let config = EvolutionConfig {
            num_iters,
            init_num_models: 8,
            mutations_per_parent: 1,
            num_crossovers: 3,
            output_dir: dir.to_path_buf(),
            ..Default::default()
        };
        let space = NetworkSearchSpace::mlp(16, 2, 1);
        NetworkEvolutionSearch::new(config, space, Box::new(SyntheticDataset::default()), 16)
            .unwrap()
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = EvolutionConfig {
            init_num_models: 0,
            output_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let space = NetworkSearchSpace::mlp(16, 2, 1);
        assert!(
            NetworkEvolutionSearch::new(config, space, Box::new(SyntheticDataset::default()), 16)
                .is_err()
        );

        let config = EvolutionConfig {
            mutations_per_parent: 0,
            num_crossovers: 0,
            output_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let space = NetworkSearchSpace::mlp(16, 2, 1);
        assert!(
            NetworkEvolutionSearch::new(config, space, Box::new(SyntheticDataset::default()), 16)
                .is_err()
        );
    }

    #[test]
    fn test_runs_exactly_num_iters() {
        let dir = tempfile::tempdir().unwrap();
        let mut search = setup(dir.path(), 4);
        let outcome = search.run().unwrap();

        assert_eq!(outcome.iterations_run, 4);
        assert_eq!(search.results().num_iterations(), 4);
    }

    #[test]
    fn test_frontier_is_mutually_non_dominated() {
        let dir = tempfile::tempdir().unwrap();
        let mut search = setup(dir.path(), 3);
        let outcome = search.run().unwrap();

        assert!(!outcome.frontier.is_empty());
        let names = search.combined_names();
        let dirs = search.combined_directions();
        let matrix = minimizing_matrix_from_metadata(&outcome.frontier, &names, &dirs).unwrap();
        for (i, a) in matrix.iter().enumerate() {
            for (j, b) in matrix.iter().enumerate() {
                if i != j {
                    assert!(!crate::pareto::dominates(a, b));
                }
            }
        }
    }

    #[test]
    fn test_frontier_candidates_carry_all_metrics() {
        let dir = tempfile::tempdir().unwrap();
        let mut search = setup(dir.path(), 2);
        let outcome = search.run().unwrap();

        for candidate in &outcome.frontier {
            for name in ["latency_ms", "memory_mb", "params", "accuracy"] {
                assert!(candidate.metric(name).is_some(), "missing {}", name);
            }
        }
    }

    #[test]
    fn test_history_accumulates_generations() {
        let dir = tempfile::tempdir().unwrap();
        let mut search = setup(dir.path(), 3);
        let outcome = search.run().unwrap();

        // initial population plus at least one offspring generation
        assert!(outcome.history.len() > 8);
    }

    #[test]
    fn test_history_entries_carry_measured_metrics() {
        let dir = tempfile::tempdir().unwrap();
        let mut search = setup(dir.path(), 3);
        let outcome = search.run().unwrap();

        // the initial generation is always evaluated before being recorded
        for candidate in &outcome.history[..8] {
            for name in ["latency_ms", "memory_mb", "params", "accuracy"] {
                assert!(candidate.metric(name).is_some(), "missing {}", name);
            }
        }
        // only the final, never-evaluated offspring generation may lack them
        let unevaluated = outcome
            .history
            .iter()
            .filter(|c| c.metric("accuracy").is_none())
            .count();
        let last_generation = outcome
            .history
            .iter()
            .rev()
            .take_while(|c| c.metric("accuracy").is_none())
            .count();
        assert_eq!(unevaluated, last_generation);
    }

    #[test]
    fn test_state_files_written() {
        let dir = tempfile::tempdir().unwrap();
        let mut search = setup(dir.path(), 2);
        search.run().unwrap();

        assert!(dir.path().join("search_state_0.csv").exists());
        assert!(dir.path().join("search_state_1.csv").exists());
        assert!(dir.path().join("pareto_front_0.json").exists());
        assert!(dir.path().join("summary.json").exists());
    }
}
