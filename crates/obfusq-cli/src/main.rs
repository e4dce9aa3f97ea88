//! Obfusq Command-Line Interface
//!
//! The main entry point for the `obfusq` tool.
//!
//! ```text
//!   ┌───┐     ┌─────────────┐     ┌───┐
//!  ─┤ H ├──●──┤  obfusq  ░░ ├──●──┤ M ├─
//!   └───┘  │  └─────────────┘  │  └───┘
//!  ───────(+)────── ░░ ───────(+)──[M]──
//!
//!                O B F U S Q
//!     Semantics-preserving circuit obfuscation
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::common::OutputDialect;
use commands::obfuscate::ObfuscateArgs;
use commands::{generate, obfuscate, strategies, validate, version};

/// Obfusq - semantics-preserving quantum circuit obfuscation
#[derive(Parser)]
#[command(name = "obfusq")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file (defaults to ~/.obfusq/config.yaml)
    #[arg(long, global = true, env = "OBFUSQ_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Obfuscate an OpenQASM program
    Obfuscate {
        /// Input file (OpenQASM 2 or 3)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Strategy (substitution, composite, padding, segmented)
        #[arg(short, long, env = "OBFUSQ_STRATEGY")]
        strategy: Option<String>,

        /// Seed for reproducible output
        #[arg(long, env = "OBFUSQ_SEED")]
        seed: Option<u64>,

        /// Wrap probability for composite encapsulation
        #[arg(long)]
        probability: Option<f64>,

        /// Output dialect (defaults to the input's dialect)
        #[arg(long, value_enum)]
        dialect: Option<OutputDialect>,

        /// Run both programs on the simulator and compare
        #[arg(long)]
        validate: bool,

        /// Shots per validation run
        #[arg(long, default_value = "1024")]
        shots: u32,

        /// Validation runs per program
        #[arg(long, default_value = "10")]
        trials: u32,

        /// Write a JSON report to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Compare a program with its obfuscated form on the simulator
    Validate {
        /// Original program
        original: PathBuf,

        /// Obfuscated program
        obfuscated: PathBuf,

        /// Shots per run
        #[arg(long, default_value = "1024")]
        shots: u32,

        /// Runs per program
        #[arg(long, default_value = "10")]
        trials: u32,
    },

    /// List available strategies
    Strategies,

    /// Generate a random test program
    Generate {
        /// Number of qubits
        #[arg(short, long)]
        qubits: u32,

        /// Number of gate layers
        #[arg(short, long)]
        depth: u32,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging; RUST_LOG wins over -v
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Execute command
    let result = match cli.command {
        Commands::Obfuscate {
            input,
            output,
            strategy,
            seed,
            probability,
            dialect,
            validate,
            shots,
            trials,
            report,
        } => {
            let args = ObfuscateArgs {
                input,
                output,
                strategy,
                seed,
                probability,
                dialect,
                validate,
                shots,
                trials,
                report,
            };
            obfuscate::execute(cli.config.as_deref(), &args).await
        }

        Commands::Validate {
            original,
            obfuscated,
            shots,
            trials,
        } => validate::execute(&original, &obfuscated, shots, trials).await,

        Commands::Strategies => {
            strategies::execute();
            Ok(())
        }

        Commands::Generate {
            qubits,
            depth,
            seed,
            output,
        } => generate::execute(qubits, depth, seed, output.as_deref()),

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
