//! Multi-objective evaluation
//!
//! An [`Objective`] evaluates a whole population in one blocking batched call
//! under a resource budget. [`evaluate_models`] runs every named objective,
//! writes measured values into candidate metadata, and returns the results
//! aligned with the population order. Evaluation failures propagate
//! immediately; there is no retry or partial-failure recovery.

pub mod dataset;
pub mod estimators;

pub use dataset::{DatasetProvider, SyntheticDataset};
pub use estimators::{
    standard_objectives, LatencyObjective, MemoryObjective, ParamCountObjective,
    ProxyAccuracyObjective,
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SearchError};
use crate::search_space::ArchCandidate;

/// Direction of optimization for one objective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimizeDirection {
    Minimize,
    Maximize,
}

/// A batched objective function over a population
pub trait Objective: Send + Sync {
    /// Evaluate every candidate under `budget`, returning one value per
    /// candidate in population order.
    fn evaluate(
        &self,
        population: &[ArchCandidate],
        dataset: &dyn DatasetProvider,
        budget: f64,
    ) -> Result<Vec<f64>>;
}

/// Ordered set of named objectives with their optimization directions
pub struct ObjectiveSet {
    entries: Vec<(String, OptimizeDirection, Box<dyn Objective>)>,
}

impl ObjectiveSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add an objective (builder style)
    pub fn with(
        mut self,
        name: impl Into<String>,
        direction: OptimizeDirection,
        objective: Box<dyn Objective>,
    ) -> Self {
        self.entries.push((name.into(), direction, objective));
        self
    }

    /// Objective names, in evaluation order
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(n, _, _)| n.clone()).collect()
    }

    /// Optimization directions, aligned with [`names`](Self::names)
    pub fn directions(&self) -> Vec<OptimizeDirection> {
        self.entries.iter().map(|(_, d, _)| *d).collect()
    }

    /// Number of objectives
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn iter(&self) -> impl Iterator<Item = &(String, OptimizeDirection, Box<dyn Objective>)> {
        self.entries.iter()
    }
}

impl Default for ObjectiveSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-objective value vectors for one evaluated population
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectiveResults {
    /// (objective name, per-candidate values), in evaluation order
    values: Vec<(String, Vec<f64>)>,
}

impl ObjectiveResults {
    /// Values for one objective
    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    /// All (name, values) pairs in evaluation order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.values.iter().map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    /// Population size these results cover
    pub fn population_len(&self) -> usize {
        self.values.first().map(|(_, v)| v.len()).unwrap_or(0)
    }

    /// Build the per-candidate objective matrix in minimizing form:
    /// Maximize objectives are negated so dominance checks can assume
    /// smaller-is-better throughout. NaN values are rejected.
    pub fn minimizing_matrix(&self, objectives: &ObjectiveSet) -> Result<Vec<Vec<f64>>> {
        let directions = objectives.directions();
        let names = objectives.names();
        let n = self.population_len();
        let mut matrix = vec![Vec::with_capacity(names.len()); n];

        for (name, direction) in names.iter().zip(directions) {
            let vals = self.get(name).ok_or_else(|| SearchError::EvaluationError {
                objective: name.clone(),
                reason: "objective missing from results".to_string(),
            })?;
            for (i, &v) in vals.iter().enumerate() {
                if v.is_nan() {
                    return Err(SearchError::ComputationError(format!(
                        "objective '{}' produced NaN for candidate {}",
                        name, i
                    )));
                }
                matrix[i].push(match direction {
                    OptimizeDirection::Minimize => v,
                    OptimizeDirection::Maximize => -v,
                });
            }
        }
        Ok(matrix)
    }
}

/// Evaluate all objectives over a population at one budget.
///
/// Every objective sees the whole population in a single blocking call.
/// Measured values (and the budget they were measured under) are written
/// into each candidate's metadata. The first failing objective aborts the
/// evaluation with its error.
pub fn evaluate_models(
    population: &mut [ArchCandidate],
    objectives: &ObjectiveSet,
    dataset: &dyn DatasetProvider,
    budget: f64,
) -> Result<ObjectiveResults> {
    let mut values = Vec::with_capacity(objectives.len());

    for (name, _, objective) in objectives.iter() {
        debug!(objective = %name, budget, population = population.len(), "evaluating objective");
        let vals = objective.evaluate(population, dataset, budget)?;
        if vals.len() != population.len() {
            return Err(SearchError::EvaluationError {
                objective: name.clone(),
                reason: format!(
                    "returned {} values for population of {}",
                    vals.len(),
                    population.len()
                ),
            });
        }
        for (candidate, &v) in population.iter_mut().zip(&vals) {
            candidate.set_metric(name.clone(), v);
        }
        values.push((name.clone(), vals));
    }

    for candidate in population.iter_mut() {
        candidate.set_metric("budget", budget);
    }

    Ok(ObjectiveResults { values })
}

/// Rebuild an objective matrix (minimizing form) from candidate metadata.
///
/// Used when the values were written across separate evaluation passes,
/// as in the evolutionary loop's side-metric / accuracy split.
pub fn minimizing_matrix_from_metadata(
    population: &[ArchCandidate],
    names: &[String],
    directions: &[OptimizeDirection],
) -> Result<Vec<Vec<f64>>> {
    let mut matrix = vec![Vec::with_capacity(names.len()); population.len()];
    for (name, direction) in names.iter().zip(directions) {
        for (i, candidate) in population.iter().enumerate() {
            let v = candidate
                .metric(name)
                .ok_or_else(|| SearchError::EvaluationError {
                    objective: name.clone(),
                    reason: format!("candidate {} has no measured value", candidate.archid),
                })?;
            if v.is_nan() {
                return Err(SearchError::ComputationError(format!(
                    "objective '{}' produced NaN for candidate {}",
                    name, candidate.archid
                )));
            }
            matrix[i].push(match direction {
                OptimizeDirection::Minimize => v,
                OptimizeDirection::Maximize => -v,
            });
        }
    }
    Ok(matrix)
}

/// Collect per-objective value vectors back out of candidate metadata.
pub fn results_from_metadata(
    population: &[ArchCandidate],
    names: &[String],
) -> Result<ObjectiveResults> {
    let mut values = Vec::with_capacity(names.len());
    for name in names {
        let mut vals = Vec::with_capacity(population.len());
        for candidate in population {
            vals.push(
                candidate
                    .metric(name)
                    .ok_or_else(|| SearchError::EvaluationError {
                        objective: name.clone(),
                        reason: format!("candidate {} has no measured value", candidate.archid),
                    })?,
            );
        }
        values.push((name.clone(), vals));
    }
    Ok(ObjectiveResults { values })
}
