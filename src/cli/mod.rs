//! Command-line interface
//!
//! Thin wrappers that wire the default search space, proxy objectives, and
//! synthetic dataset into each orchestrator.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::*;

use crate::error::Result;
use crate::objectives::{standard_objectives, SyntheticDataset};
use crate::search::{
    EvolutionConfig, NetworkEvolutionSearch, RandomSearch, RandomSearchConfig, SuccessiveHalving,
    SuccessiveHalvingConfig,
};
use crate::search_space::NetworkSearchSpace;

const SEQ_LEN: usize = 32;

#[derive(Parser)]
#[command(name = "archsearch", version, about = "Multi-objective neural architecture search")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Successive-halving search: geometric budgets, Pareto-tier culling
    Halving {
        /// Output directory for state tables and model files
        #[arg(long, default_value = "search_output")]
        output: PathBuf,
        /// Maximum number of iterations
        #[arg(long, default_value_t = 10)]
        num_iters: usize,
        /// Initial population size
        #[arg(long, default_value_t = 16)]
        init_models: usize,
        /// Budget for the first iteration
        #[arg(long, default_value_t = 1.0)]
        init_budget: f64,
        /// Budget growth factor per iteration
        #[arg(long, default_value_t = 2.0)]
        multiplier: f64,
        /// Base seed for deterministic sampling
        #[arg(long, default_value_t = 1)]
        seed: u64,
    },
    /// Evolutionary Pareto search: mutation and crossover over the frontier
    Evolution {
        #[arg(long, default_value = "evolution_output")]
        output: PathBuf,
        #[arg(long, default_value_t = 10)]
        num_iters: usize,
        #[arg(long, default_value_t = 16)]
        init_models: usize,
        /// Mutations produced per selected parent
        #[arg(long, default_value_t = 2)]
        mutations: usize,
        /// Crossover offspring per iteration
        #[arg(long, default_value_t = 5)]
        crossovers: usize,
        #[arg(long, default_value_t = 1)]
        seed: u64,
    },
    /// Random search baseline: one sampling pass at a fixed budget
    Random {
        #[arg(long, default_value = "random_search_output")]
        output: PathBuf,
        #[arg(long, default_value_t = 50)]
        num_models: usize,
        #[arg(long, default_value_t = 1.0)]
        budget: f64,
        #[arg(long, default_value_t = 1)]
        seed: u64,
    },
}

fn step_ok(msg: &str) {
    println!("  {} {}", "✓".green(), msg);
}

fn kv(key: &str, val: &str) {
    println!("    {} {}", format!("{}:", key).dimmed(), val.white());
}

pub fn cmd_halving(
    output: &PathBuf,
    num_iters: usize,
    init_models: usize,
    init_budget: f64,
    multiplier: f64,
    seed: u64,
) -> Result<()> {
    let config = SuccessiveHalvingConfig {
        num_iters,
        init_num_models: init_models,
        init_budget,
        budget_multiplier: multiplier,
        seed,
        output_dir: output.clone(),
    };
    let space = NetworkSearchSpace::mlp(16, 2, seed);
    let mut search = SuccessiveHalving::new(config, space, standard_objectives(SEQ_LEN))?;

    let results = search.search(&SyntheticDataset::default())?;

    step_ok("successive halving finished");
    kv("iterations", &results.num_iterations().to_string());
    kv(
        "final population",
        &results
            .population_sizes()
            .last()
            .copied()
            .unwrap_or(0)
            .to_string(),
    );
    kv("output", &output.display().to_string());
    Ok(())
}

pub fn cmd_evolution(
    output: &PathBuf,
    num_iters: usize,
    init_models: usize,
    mutations: usize,
    crossovers: usize,
    seed: u64,
) -> Result<()> {
    let config = EvolutionConfig {
        num_iters,
        init_num_models: init_models,
        mutations_per_parent: mutations,
        num_crossovers: crossovers,
        seed,
        output_dir: output.clone(),
        ..Default::default()
    };
    let space = NetworkSearchSpace::mlp(16, 2, seed);
    let mut search =
        NetworkEvolutionSearch::new(config, space, Box::new(SyntheticDataset::default()), SEQ_LEN)?;

    let outcome = search.run()?;

    step_ok("evolutionary search finished");
    kv("iterations", &outcome.iterations_run.to_string());
    kv("frontier size", &outcome.frontier.len().to_string());
    kv("total sampled", &outcome.history.len().to_string());
    kv("output", &output.display().to_string());
    Ok(())
}

pub fn cmd_random(output: &PathBuf, num_models: usize, budget: f64, seed: u64) -> Result<()> {
    let config = RandomSearchConfig {
        num_models,
        budget,
        output_dir: output.clone(),
    };
    let space = NetworkSearchSpace::mlp(16, 2, seed);
    let mut search = RandomSearch::new(config, space, standard_objectives(SEQ_LEN))?;

    let outcome = search.search(&SyntheticDataset::default())?;

    step_ok("random search finished");
    kv("models", &outcome.population.len().to_string());
    kv(
        "frontier size",
        &outcome
            .tiers
            .first()
            .map(|t| t.members.len())
            .unwrap_or(0)
            .to_string(),
    );
    kv("output", &output.display().to_string());
    Ok(())
}
