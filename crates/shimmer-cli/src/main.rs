//! Shimmer CLI - headless host for the particle engine

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{init, run, validate};

#[derive(Parser)]
#[command(name = "shimmer")]
#[command(about = "Run and inspect Shimmer particle simulations headlessly", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter engine configuration
    Init {
        /// Path of the TOML file to create
        path: String,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Parse a configuration and report every value that would be clamped
    Validate {
        /// Path to the engine configuration
        config: String,
    },

    /// Run a simulation for a number of ticks
    Run {
        /// Path to the engine configuration
        config: String,

        /// Number of ticks to advance
        #[arg(long, default_value = "600")]
        ticks: u64,

        /// Seconds per tick
        #[arg(long, default_value = "0.016666668")]
        dt: f32,

        /// RNG seed (overrides the configuration)
        #[arg(long)]
        seed: Option<u32>,

        /// Hold the pointer at a host position (comma-separated x,y)
        #[arg(long, value_parser = parse_vec2)]
        pointer: Option<[f32; 2]>,

        /// Print telemetry every N ticks (0 disables)
        #[arg(long, default_value = "60")]
        report_every: u64,

        /// Draw the debug overlay in the final render
        #[arg(long)]
        debug: bool,

        /// Print the final frame as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
}

fn parse_vec2(s: &str) -> Result<[f32; 2], String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 2 {
        return Err(format!("expected 2 comma-separated values, got {}", parts.len()));
    }
    let x: f32 = parts[0].trim().parse().map_err(|e| format!("invalid x: {}", e))?;
    let y: f32 = parts[1].trim().parse().map_err(|e| format!("invalid y: {}", e))?;
    Ok([x, y])
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { path, force } => init::run(&path, force),
        Commands::Validate { config } => validate::run(&config),
        Commands::Run {
            config,
            ticks,
            dt,
            seed,
            pointer,
            report_every,
            debug,
            json,
        } => run::run(run::RunArgs {
            config,
            ticks,
            dt,
            seed,
            pointer,
            report_every,
            debug,
            json,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_vec2_accepts_pairs() {
        assert_eq!(parse_vec2("1.5, 2"), Ok([1.5, 2.0]));
        assert!(parse_vec2("1,2,3").is_err());
        assert!(parse_vec2("a,2").is_err());
    }

    #[test]
    fn cli_parses_run_flags() {
        let cli = Cli::try_parse_from([
            "shimmer", "run", "scene.toml", "--ticks", "10", "--pointer", "5,6", "--json",
        ])
        .unwrap();
        match cli.command {
            Commands::Run {
                ticks,
                pointer,
                json,
                ..
            } => {
                assert_eq!(ticks, 10);
                assert_eq!(pointer, Some([5.0, 6.0]));
                assert!(json);
            }
            _ => panic!("expected run"),
        }
    }
}
