//! Stage orchestration for the two pipeline invocations.
//!
//! `build_and_package` runs on each build host and produces
//! `<build>/<module>/` with that host's libraries and headers plus the
//! repository sources. `archive_and_upload` then runs once, joins a macOS
//! and a Windows build into one module tree, stamps it and ships it.
//!
//! All inputs travel in a [`BuildContext`] built once per invocation.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::archive::{
  ArchiveError, ArchiveSummary, DistPointer, archive_file_name, create_archive, read_dist_pointer, write_dist_pointer,
};
use crate::assemble::{
  AssembleError, CopyStats, LibraryLayout, ModuleSources, assemble_module_sources, join_platform_builds, overlay_dir,
};
use crate::config::{DistConfig, ProvisionStrategy};
use crate::consts::{LIBS_DIRNAME, STAGING_DIRNAME, STATIC_LIB_PATTERN};
use crate::git::RepoInfo;
use crate::merge::{ArchDir, MergeError, Merger};
use crate::platform::Triplet;
use crate::platform::os::Os;
use crate::provision::{InstallRoot, ProvisionError, Provisioner};
use crate::publish::{ObjectStore, PublishError, publish_archive, upload_archive};
use crate::runner::CommandRunner;
use crate::util::json::JsonFileError;
use crate::version::{VersionRecord, write_version_record};

#[derive(Debug, Error)]
pub enum PipelineError {
  #[error(transparent)]
  Provision(#[from] ProvisionError),

  #[error(transparent)]
  Merge(#[from] MergeError),

  #[error(transparent)]
  Assemble(#[from] AssembleError),

  #[error(transparent)]
  Archive(#[from] ArchiveError),

  #[error(transparent)]
  Publish(#[from] PublishError),

  #[error(transparent)]
  Metadata(#[from] JsonFileError),

  #[error("failed to create directory '{path}': {source}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("{platform} build not found at '{path}'")]
  BuildMissing { platform: &'static str, path: PathBuf },
}

/// Everything a pipeline stage needs to know about the current invocation.
#[derive(Debug, Clone)]
pub struct BuildContext {
  /// Repository root; vcpkg, overlay triplets and module sources live here.
  pub project_dir: PathBuf,
  /// Output directory of this invocation.
  pub build_dir: PathBuf,
  pub build_number: String,
  pub repo: RepoInfo,
  pub config: DistConfig,
}

impl BuildContext {
  pub fn new(
    project_dir: impl Into<PathBuf>,
    build_dir: impl Into<PathBuf>,
    build_number: impl Into<String>,
    repo: RepoInfo,
    config: DistConfig,
  ) -> Self {
    Self {
      project_dir: project_dir.into(),
      build_dir: build_dir.into(),
      build_number: build_number.into(),
      repo,
      config,
    }
  }

  pub fn module_name(&self) -> &str {
    &self.config.module.name
  }

  /// `<build>/<module>`, the output of `build_and_package`.
  pub fn module_dir(&self) -> PathBuf {
    self.build_dir.join(self.module_name())
  }

  /// `<build>/module`, the tree that gets zipped.
  pub fn staging_dir(&self) -> PathBuf {
    self.build_dir.join(STAGING_DIRNAME)
  }

  pub fn archive_name(&self) -> String {
    archive_file_name(
      self.module_name(),
      &self.repo.version,
      &self.build_number,
      self.repo.is_detached(),
    )
  }

  /// Install root for a triplet. macOS architectures are kept apart so
  /// their libraries can be merged afterwards.
  pub fn install_root(&self, triplet: Triplet) -> PathBuf {
    match triplet.os() {
      Os::MacOs => self
        .project_dir
        .join(format!("vcpkg_installed_{}", triplet.arch().apple_name())),
      _ => self.project_dir.join("vcpkg_installed"),
    }
  }
}

/// What `build_and_package` produced.
#[derive(Debug, Clone, Default)]
pub struct BuildSummary {
  pub module_dir: PathBuf,
  pub triplets: Vec<Triplet>,
  /// Universal binaries written on macOS.
  pub merged: Vec<PathBuf>,
  pub copied: CopyStats,
}

fn create_dir(path: &Path) -> Result<(), PipelineError> {
  fs::create_dir_all(path).map_err(|source| PipelineError::CreateDir {
    path: path.to_path_buf(),
    source,
  })
}

/// Provision, merge and assemble the module for the host platform.
///
/// Hosts other than macOS and Windows have nothing to provision; they still
/// get the repository sources.
pub fn build_and_package(
  ctx: &BuildContext,
  host: Option<Os>,
  runner: &dyn CommandRunner,
) -> Result<BuildSummary, PipelineError> {
  let module_dir = ctx.module_dir();
  let layout = LibraryLayout::new(&module_dir);
  create_dir(layout.root())?;

  info!(
    module = ctx.module_name(),
    build_dir = %ctx.build_dir.display(),
    host = ?host,
    "building module"
  );

  let mut summary = BuildSummary {
    module_dir: module_dir.clone(),
    ..Default::default()
  };

  match host {
    Some(os @ (Os::MacOs | Os::Windows)) => {
      let provisioner = Provisioner::new(runner, &ctx.project_dir, &ctx.config.vcpkg, os);
      let triplets = Triplet::for_os(os);

      if triplets
        .iter()
        .any(|t| *ctx.config.strategy_for(*t) == ProvisionStrategy::Vcpkg)
      {
        provisioner.bootstrap()?;
      }

      if os == Os::MacOs {
        provision_macos(ctx, &provisioner, runner, &layout, &mut summary)?;
      } else {
        provision_windows(ctx, &provisioner, &layout, &mut summary)?;
      }
      summary.triplets = triplets.to_vec();
    }
    other => {
      warn!(host = ?other, "no native dependencies can be provisioned on this host, assembling sources only");
    }
  }

  let files = ctx.config.module.files();
  let sources = ModuleSources {
    project_dir: &ctx.project_dir,
    files: &files,
  };
  summary.copied += assemble_module_sources(&sources, &module_dir)?;

  Ok(summary)
}

fn provision_macos(
  ctx: &BuildContext,
  provisioner: &Provisioner<'_>,
  runner: &dyn CommandRunner,
  layout: &LibraryLayout,
  summary: &mut BuildSummary,
) -> Result<(), PipelineError> {
  let install = |triplet: Triplet| -> Result<InstallRoot, PipelineError> {
    Ok(provisioner.install(triplet, &ctx.install_root(triplet), ctx.config.strategy_for(triplet))?)
  };

  let arm64 = install(Triplet::MacosArm64)?;
  let x86_64 = install(Triplet::MacosX86_64)?;

  let x86_64_lib = x86_64.lib_dir();
  let arm64_lib = arm64.lib_dir();
  summary.merged = Merger::new(runner).merge_all(
    &ArchDir {
      dir: &x86_64_lib,
      arch: Triplet::MacosX86_64.arch().apple_name(),
    },
    &ArchDir {
      dir: &arm64_lib,
      arch: Triplet::MacosArm64.arch().apple_name(),
    },
    &layout.macos(),
    STATIC_LIB_PATTERN,
    true,
  )?;

  // Headers are architecture independent.
  summary.copied += overlay_dir(&arm64.include_dir(), &summary.module_dir.join("include"))?;
  Ok(())
}

fn provision_windows(
  ctx: &BuildContext,
  provisioner: &Provisioner<'_>,
  layout: &LibraryLayout,
  summary: &mut BuildSummary,
) -> Result<(), PipelineError> {
  let mut headers = None;

  for &triplet in Triplet::for_os(Os::Windows) {
    let installed = provisioner.install(triplet, &ctx.install_root(triplet), ctx.config.strategy_for(triplet))?;
    let Some(runtime) = triplet.runtime() else {
      continue;
    };

    summary.copied += overlay_dir(&installed.lib_dir(), &layout.release_dir(triplet))?;
    summary.copied += overlay_dir(&installed.debug_lib_dir(), &layout.windows_debug(runtime))?;
    headers = Some(installed);
  }

  // Headers from the last runtime variant (MD).
  if let Some(installed) = headers {
    summary.copied += overlay_dir(&installed.include_dir(), &summary.module_dir.join("include"))?;
  }
  Ok(())
}

/// Where the platform builds to join live.
#[derive(Debug, Clone)]
pub struct ArchiveInputs {
  pub macos_build: PathBuf,
  pub windows_build: PathBuf,
}

/// What `archive_and_upload` produced.
#[derive(Debug, Clone)]
pub struct DistSummary {
  pub archive: ArchiveSummary,
  pub version_file: PathBuf,
  pub pointer_file: PathBuf,
  /// Object key, when the archive was uploaded.
  pub uploaded: Option<String>,
}

/// Join, stamp, zip and optionally upload.
///
/// With a `store` the archive is uploaded to the branch folder, or to the
/// version folder for tag builds.
pub fn archive_and_upload(
  ctx: &BuildContext,
  inputs: &ArchiveInputs,
  store: Option<&dyn ObjectStore>,
) -> Result<DistSummary, PipelineError> {
  let module = ctx.module_name();

  if !inputs.macos_build.is_dir() {
    return Err(PipelineError::BuildMissing {
      platform: "macOS",
      path: inputs.macos_build.clone(),
    });
  }
  let windows_libs = inputs.windows_build.join(module).join(LIBS_DIRNAME);
  if !windows_libs.is_dir() {
    return Err(PipelineError::BuildMissing {
      platform: "Windows",
      path: windows_libs,
    });
  }

  let staging = ctx.staging_dir();
  create_dir(&staging)?;
  join_platform_builds(&inputs.macos_build, &inputs.windows_build, &staging, module)?;

  let module_dir = staging.join(module);
  create_dir(&module_dir)?;
  let record = VersionRecord::new(ctx.repo.version.clone(), ctx.build_number.clone());
  let version_file = write_version_record(&module_dir, &record)?;

  let archive = create_archive(&staging, &ctx.build_dir.join(ctx.archive_name()))?;

  let pointer = DistPointer::for_archive(
    &ctx.build_dir,
    &archive.path,
    ctx.repo.version.clone(),
    ctx.build_number.clone(),
  )?;
  let pointer_file = write_dist_pointer(&ctx.build_dir, &pointer)?;

  let uploaded = match store {
    Some(store) => Some(upload_archive(
      store,
      &ctx.config.spaces.bucket,
      &archive.path,
      &ctx.repo.branch,
      &ctx.repo.version,
    )?),
    None => None,
  };

  Ok(DistSummary {
    archive,
    version_file,
    pointer_file,
    uploaded,
  })
}

/// Publish the archive recorded in `dist.json`. Returns the pointer and the
/// public object key.
pub fn publish_from_pointer(
  ctx: &BuildContext,
  store: &dyn ObjectStore,
) -> Result<(DistPointer, String), PipelineError> {
  let pointer = read_dist_pointer(&ctx.build_dir)?;
  info!(
    archive = %pointer.path,
    version = %pointer.version,
    build_number = %pointer.build_number,
    "publishing recorded archive"
  );

  let key = publish_archive(store, &ctx.config.spaces.bucket, &pointer.resolve(&ctx.build_dir))?;
  Ok((pointer, key))
}
