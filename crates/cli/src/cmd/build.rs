//! Implementation of the `juce-dist build-and-package` command.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};

use juce_dist_lib::pipeline::build_and_package;
use juce_dist_lib::platform::os::Os;
use juce_dist_lib::runner::SystemRunner;

use super::GlobalArgs;
use crate::output::{format_duration, print_stat, print_success};

/// Provision dependencies for the host and assemble `<build>/<module>`.
pub fn cmd_build_and_package(global: &GlobalArgs, path_to_build: &Path, build_number: &str) -> Result<()> {
  let start = Instant::now();
  let ctx = global.context(path_to_build, build_number)?;

  let summary = build_and_package(&ctx, Os::current(), &SystemRunner).context("Build failed")?;

  let triplets = if summary.triplets.is_empty() {
    "none".to_string()
  } else {
    summary.triplets.iter().map(|t| t.name()).collect::<Vec<_>>().join(", ")
  };

  println!();
  print_success(&format!("Built module {}", ctx.module_name()));
  print_stat("Module", &summary.module_dir.display().to_string());
  print_stat("Triplets", &triplets);
  print_stat("Universal binaries", &summary.merged.len().to_string());
  print_stat("Files copied", &summary.copied.files.to_string());
  print_stat("Duration", &format_duration(start.elapsed()));

  Ok(())
}
