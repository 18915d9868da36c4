//! archsearch - Main entry point

use archsearch::cli::{cmd_evolution, cmd_halving, cmd_random, Cli, Commands};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "archsearch=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Halving {
            output,
            num_iters,
            init_models,
            init_budget,
            multiplier,
            seed,
        } => {
            cmd_halving(&output, num_iters, init_models, init_budget, multiplier, seed)?;
        }
        Commands::Evolution {
            output,
            num_iters,
            init_models,
            mutations,
            crossovers,
            seed,
        } => {
            cmd_evolution(&output, num_iters, init_models, mutations, crossovers, seed)?;
        }
        Commands::Random {
            output,
            num_models,
            budget,
            seed,
        } => {
            cmd_random(&output, num_models, budget, seed)?;
        }
    }

    Ok(())
}
