mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::{cmd_build, cmd_env, cmd_inspect, cmd_verify};
use output::OutputFormat;

/// repro - verify that a build reproduces byte-for-byte
#[derive(Parser)]
#[command(name = "repro")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Output format
  #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
  output: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Run the primary build in the current tree
  Build {
    /// Ignore any cached result
    #[arg(long)]
    rebuild: bool,
  },

  /// Build twice and compare the artifacts
  Verify {
    /// Minimum time between the primary and verification starts
    #[arg(long, default_value = "5s")]
    stagger: humantime::Duration,

    /// Rebuild from the repository host's source archive instead of a local copy
    #[arg(long)]
    remote: bool,

    /// Host serving source archives for --remote
    #[arg(long, value_name = "URL")]
    source_host: Option<String>,

    /// Load the primary result from a JSON file instead of building
    #[arg(long, value_name = "FILE")]
    primary_result: Option<PathBuf>,

    /// Load the verification result from a JSON file instead of building
    #[arg(long, value_name = "FILE")]
    verification_result: Option<PathBuf>,

    /// Write the verification result as JSON to this file
    #[arg(long, value_name = "FILE")]
    write: Option<PathBuf>,

    /// Ignore any cached results
    #[arg(long)]
    rebuild: bool,
  },

  /// Print the environment given to the build instructions
  Env {
    /// Only variables that do not depend on host paths
    #[arg(long)]
    invariant: bool,
  },

  /// Print the resolved build configuration
  Inspect,
}

fn main() -> Result<ExitCode> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let ok = match cli.command {
    Commands::Build { rebuild } => cmd_build(rebuild, cli.output)?,
    Commands::Verify {
      stagger,
      remote,
      source_host,
      primary_result,
      verification_result,
      write,
      rebuild,
    } => cmd_verify(
      cmd::VerifyArgs {
        stagger: stagger.into(),
        remote,
        source_host,
        primary_result,
        verification_result,
        write,
        rebuild,
      },
      cli.output,
    )?,
    Commands::Env { invariant } => cmd_env(invariant, cli.output)?,
    Commands::Inspect => cmd_inspect(cli.output)?,
  };

  Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
