//! Search state log
//!
//! `SearchResults` is the append-only record of a search run: one
//! `IterationRecord` per iteration, never mutated after being appended.
//! The accumulated log can be persisted as a CSV table
//! (`search_state_<iter>.csv`), per-iteration Pareto snapshots, and a
//! run summary.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::objectives::ObjectiveResults;
use crate::pareto::ParetoTier;
use crate::search_space::ArchCandidate;

/// One iteration of a search run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationRecord {
    /// Iteration number
    pub iteration: usize,
    /// Candidate identifiers, in population order
    pub archids: Vec<String>,
    /// Objective name -> per-candidate values
    pub objectives: BTreeMap<String, Vec<f64>>,
    /// Extra per-model fields (e.g. budget)
    pub extra: BTreeMap<String, Vec<f64>>,
    /// When this record was appended
    pub recorded_at: DateTime<Utc>,
}

/// Append-only log of a whole search run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    objective_names: Vec<String>,
    iterations: Vec<IterationRecord>,
    started_at: DateTime<Utc>,
}

/// Run summary persisted alongside the state tables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub num_iterations: usize,
    pub total_models_recorded: usize,
    pub objective_names: Vec<String>,
    pub winner: Option<String>,
}

impl SearchResults {
    /// Start an empty log for the given objectives
    pub fn new(objective_names: Vec<String>) -> Self {
        Self {
            objective_names,
            iterations: Vec::new(),
            started_at: Utc::now(),
        }
    }

    /// Append one iteration's population and results.
    ///
    /// The record is immutable once appended; later budgets land in later
    /// records rather than overwriting this one.
    pub fn add_iteration_results(
        &mut self,
        population: &[ArchCandidate],
        results: &ObjectiveResults,
        extra: BTreeMap<String, Vec<f64>>,
    ) {
        let iteration = self.iterations.len();
        let mut objectives = BTreeMap::new();
        for (name, vals) in results.iter() {
            objectives.insert(name.to_string(), vals.to_vec());
        }
        debug!(iteration, population = population.len(), "recording iteration");

        self.iterations.push(IterationRecord {
            iteration,
            archids: population.iter().map(|c| c.archid.clone()).collect(),
            objectives,
            extra,
            recorded_at: Utc::now(),
        });
    }

    /// Recorded iterations, oldest first
    pub fn iterations(&self) -> &[IterationRecord] {
        &self.iterations
    }

    /// Number of recorded iterations
    pub fn num_iterations(&self) -> usize {
        self.iterations.len()
    }

    /// Most recent record, if any
    pub fn last(&self) -> Option<&IterationRecord> {
        self.iterations.last()
    }

    /// Population size at each recorded iteration
    pub fn population_sizes(&self) -> Vec<usize> {
        self.iterations.iter().map(|r| r.archids.len()).collect()
    }

    /// Objective names this log was created for
    pub fn objective_names(&self) -> &[String] {
        &self.objective_names
    }

    /// Write the whole accumulated log as one CSV table.
    ///
    /// Columns: iteration, archid, the objectives in declaration order,
    /// then any extra fields in name order.
    pub fn save_search_state(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let extra_names: Vec<String> = self
            .iterations
            .iter()
            .flat_map(|r| r.extra.keys().cloned())
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut writer = csv::Writer::from_path(path)?;
        let mut header = vec!["iteration".to_string(), "archid".to_string()];
        header.extend(self.objective_names.iter().cloned());
        header.extend(extra_names.iter().cloned());
        writer.write_record(&header)?;

        for record in &self.iterations {
            for (row, archid) in record.archids.iter().enumerate() {
                let mut fields = vec![record.iteration.to_string(), archid.clone()];
                for name in &self.objective_names {
                    let val = record
                        .objectives
                        .get(name)
                        .and_then(|v| v.get(row))
                        .copied();
                    fields.push(val.map(|v| v.to_string()).unwrap_or_default());
                }
                for name in &extra_names {
                    let val = record.extra.get(name).and_then(|v| v.get(row)).copied();
                    fields.push(val.map(|v| v.to_string()).unwrap_or_default());
                }
                writer.write_record(&fields)?;
            }
        }

        writer.flush()?;
        Ok(())
    }

    /// Persist the Pareto tiers of one iteration as a JSON snapshot
    /// (`pareto_front_<iter>.json`), the data behind the original's
    /// 2D frontier-evolution plots.
    pub fn save_pareto_snapshot(
        &self,
        dir: &Path,
        iteration: usize,
        population: &[ArchCandidate],
        tiers: &[ParetoTier],
    ) -> Result<()> {
        fs::create_dir_all(dir)?;

        #[derive(Serialize)]
        struct TierSnapshot<'a> {
            rank: usize,
            archids: Vec<&'a str>,
            metadata: Vec<&'a BTreeMap<String, f64>>,
        }

        let snapshot: Vec<TierSnapshot<'_>> = tiers
            .iter()
            .map(|tier| TierSnapshot {
                rank: tier.rank,
                archids: tier
                    .members
                    .iter()
                    .map(|&i| population[i].archid.as_str())
                    .collect(),
                metadata: tier.members.iter().map(|&i| &population[i].metadata).collect(),
            })
            .collect();

        let path = dir.join(format!("pareto_front_{}.json", iteration));
        fs::write(path, serde_json::to_string_pretty(&snapshot)?)?;
        Ok(())
    }

    /// Write `summary.json` for the finished run
    pub fn save_summary(&self, dir: &Path, winner: Option<&str>) -> Result<()> {
        fs::create_dir_all(dir)?;
        let summary = SearchSummary {
            started_at: self.started_at,
            finished_at: Utc::now(),
            num_iterations: self.iterations.len(),
            total_models_recorded: self.iterations.iter().map(|r| r.archids.len()).sum(),
            objective_names: self.objective_names.clone(),
            winner: winner.map(String::from),
        };
        fs::write(
            dir.join("summary.json"),
            serde_json::to_string_pretty(&summary)?,
        )?;
        Ok(())
    }
}
