mod archive;
mod build;
mod info;

pub use archive::{ArchiveArgs, cmd_archive_and_upload};
pub use build::cmd_build_and_package;
pub use info::cmd_info;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;

use juce_dist_lib::config::DistConfig;
use juce_dist_lib::git::RepoInfo;
use juce_dist_lib::pipeline::BuildContext;

/// Options shared by every subcommand.
#[derive(Debug, Args)]
pub struct GlobalArgs {
  /// Repository root containing vcpkg, triplets and the module sources
  #[arg(long, global = true, default_value = ".")]
  pub project_dir: PathBuf,

  /// Configuration file (default: <project-dir>/juce-dist.toml if present)
  #[arg(long, global = true)]
  pub config: Option<PathBuf>,

  /// Version to stamp instead of describing the git repository
  #[arg(long, global = true)]
  pub release_version: Option<String>,

  /// Branch to report instead of the checked-out one
  #[arg(long, global = true)]
  pub branch: Option<String>,
}

impl GlobalArgs {
  pub fn project_dir(&self) -> Result<PathBuf> {
    dunce::canonicalize(&self.project_dir)
      .with_context(|| format!("Project directory not found: {}", self.project_dir.display()))
  }

  pub fn load_config(&self, project_dir: &Path) -> Result<DistConfig> {
    let config = self.config.as_deref().map(absolute).transpose()?;
    DistConfig::discover(project_dir, config.as_deref()).context("Failed to load configuration")
  }

  /// Version and branch, from the flags where given and from git otherwise.
  pub fn repo_info(&self, project_dir: &Path, config: &DistConfig) -> Result<RepoInfo> {
    if let (Some(version), Some(branch)) = (&self.release_version, &self.branch) {
      return Ok(RepoInfo::new(version.clone(), branch.clone()));
    }

    let detected = RepoInfo::detect(project_dir, &config.git)
      .context("Failed to read version from git (pass --release-version and --branch to skip)")?;

    Ok(RepoInfo {
      version: self.release_version.clone().unwrap_or(detected.version),
      branch: self.branch.clone().unwrap_or(detected.branch),
    })
  }

  /// Build the context for one invocation writing to `build_dir`.
  pub fn context(&self, build_dir: &Path, build_number: &str) -> Result<BuildContext> {
    let project_dir = self.project_dir()?;
    let config = self.load_config(&project_dir)?;
    let repo = self.repo_info(&project_dir, &config)?;
    let build_dir = absolute(build_dir)?;

    debug!(
      project_dir = %project_dir.display(),
      build_dir = %build_dir.display(),
      version = %repo.version,
      branch = %repo.branch,
      "resolved build context"
    );
    Ok(BuildContext::new(project_dir, build_dir, build_number, repo, config))
  }
}

/// Resolve `path` against the working directory.
pub fn absolute(path: &Path) -> Result<PathBuf> {
  if path.is_absolute() {
    return Ok(path.to_path_buf());
  }
  let cwd = std::env::current_dir().context("Failed to read current directory")?;
  Ok(cwd.join(path))
}
