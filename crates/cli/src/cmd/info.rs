//! Implementation of the `juce-dist info` command.
//!
//! Reports the host platform, the triplets it provisions, and the version,
//! branch and archive name the other commands would use.

use anyhow::Result;
use serde::Serialize;
use tracing::warn;

use juce_dist_lib::archive::archive_file_name;
use juce_dist_lib::platform::Platform;

use super::GlobalArgs;
use crate::output::{OutputFormat, print_json, print_stat};

#[derive(Debug, Serialize)]
struct InfoReport {
  platform: Option<String>,
  triplets: Vec<String>,
  module: String,
  version: Option<String>,
  branch: Option<String>,
  archive: Option<String>,
}

pub fn cmd_info(global: &GlobalArgs, build_number: &str, output: OutputFormat) -> Result<()> {
  let project_dir = global.project_dir()?;
  let config = global.load_config(&project_dir)?;
  let platform = Platform::current();

  let repo = match global.repo_info(&project_dir, &config) {
    Ok(repo) => Some(repo),
    Err(err) => {
      warn!(error = %format!("{:#}", err), "version unavailable");
      None
    }
  };

  let report = InfoReport {
    platform: platform.map(|p| p.to_string()),
    triplets: platform
      .map(|p| p.triplets().iter().map(|t| t.name().to_string()).collect())
      .unwrap_or_default(),
    module: config.module.name.clone(),
    version: repo.as_ref().map(|r| r.version.clone()),
    branch: repo.as_ref().map(|r| r.branch.clone()),
    archive: repo
      .as_ref()
      .map(|r| archive_file_name(&config.module.name, &r.version, build_number, r.is_detached())),
  };

  if output.is_json() {
    return print_json(&report);
  }

  let unknown = || "unknown".to_string();
  println!("System:");
  print_stat("Platform", &report.platform.clone().unwrap_or_else(unknown));
  print_stat(
    "Triplets",
    &if report.triplets.is_empty() {
      "none".to_string()
    } else {
      report.triplets.join(", ")
    },
  );
  println!("Module:");
  print_stat("Name", &report.module);
  print_stat("Version", &report.version.clone().unwrap_or_else(unknown));
  print_stat("Branch", &report.branch.clone().unwrap_or_else(unknown));
  print_stat("Archive", &report.archive.clone().unwrap_or_else(unknown));

  Ok(())
}
