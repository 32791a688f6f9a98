mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::cmd::{ArchiveArgs, GlobalArgs, cmd_archive_and_upload, cmd_build_and_package, cmd_info};
use crate::output::{OutputFormat, print_error};

/// juce-dist - build, package and ship a JUCE module
#[derive(Parser)]
#[command(name = "juce-dist")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(flatten)]
  global: GlobalArgs,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Provision native dependencies and assemble the module for this host
  BuildAndPackage {
    /// The folder to build the module in
    #[arg(long, default_value = "build")]
    path_to_build: PathBuf,

    /// Build number recorded with the artifact
    #[arg(long, default_value = "0")]
    build_number: String,
  },

  /// Join platform builds, stamp the version and create the distribution archive
  ArchiveAndUpload(ArchiveArgs),

  /// Show host platform and the artifact that would be produced
  Info {
    /// Build number used for the archive name
    #[arg(long, default_value = "0")]
    build_number: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  let filter = if cli.verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
  };
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let result = match cli.command {
    Commands::BuildAndPackage {
      path_to_build,
      build_number,
    } => cmd_build_and_package(&cli.global, &path_to_build, &build_number),
    Commands::ArchiveAndUpload(args) => cmd_archive_and_upload(&cli.global, &args),
    Commands::Info { build_number, output } => cmd_info(&cli.global, &build_number, output),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      print_error(&format!("{:#}", err));
      ExitCode::FAILURE
    }
  }
}
