//! Module tree assembly.
//!
//! Every copy here is an overlay: files already in the destination that are
//! not part of the source survive, files present in both are replaced by the
//! source version. Per-platform library folders never overlap, so platform
//! outputs can be overlaid in any order.
//!
//! # Module layout
//!
//! ```text
//! <module>/
//! ├── CMakeLists.txt, <module>.h, <module>.cpp
//! ├── include/
//! ├── src/
//! └── libs/
//!     ├── MacOSX/                       # universal static libraries
//!     └── VisualStudio2022/x64/{MT,MTd,MD,MDd}/
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::consts::LIBS_DIRNAME;
use crate::platform::{Runtime, Triplet};

/// Errors that can occur while assembling a module tree.
#[derive(Debug, Error)]
pub enum AssembleError {
  #[error("source directory does not exist: {0}")]
  SourceMissing(PathBuf),

  #[error("required file does not exist: {0}")]
  FileMissing(PathBuf),

  #[error("failed to walk '{path}': {message}")]
  Walk { path: PathBuf, message: String },

  #[error("failed to create directory '{path}': {source}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to copy '{from}' to '{to}': {source}")]
  Copy {
    from: PathBuf,
    to: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Counts reported by an overlay copy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
  pub files: usize,
  pub dirs: usize,
}

impl std::ops::AddAssign for CopyStats {
  fn add_assign(&mut self, rhs: Self) {
    self.files += rhs.files;
    self.dirs += rhs.dirs;
  }
}

fn create_dir(path: &Path) -> Result<(), AssembleError> {
  fs::create_dir_all(path).map_err(|source| AssembleError::CreateDir {
    path: path.to_path_buf(),
    source,
  })
}

/// Overlay the contents of `src` onto `dst`.
///
/// `dst` is created if needed. Symlinked files are copied by content.
pub fn overlay_dir(src: &Path, dst: &Path) -> Result<CopyStats, AssembleError> {
  if !src.is_dir() {
    return Err(AssembleError::SourceMissing(src.to_path_buf()));
  }

  create_dir(dst)?;
  let mut stats = CopyStats::default();

  for entry in WalkDir::new(src).min_depth(1).follow_links(true).sort_by_file_name() {
    let entry = entry.map_err(|e| AssembleError::Walk {
      path: src.to_path_buf(),
      message: e.to_string(),
    })?;

    let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
    let target = dst.join(relative);

    if entry.file_type().is_dir() {
      create_dir(&target)?;
      stats.dirs += 1;
    } else if entry.file_type().is_file() {
      if let Some(parent) = target.parent() {
        create_dir(parent)?;
      }
      fs::copy(entry.path(), &target).map_err(|source| AssembleError::Copy {
        from: entry.path().to_path_buf(),
        to: target.clone(),
        source,
      })?;
      stats.files += 1;
    }
  }

  debug!(
    src = %src.display(),
    dst = %dst.display(),
    files = stats.files,
    "overlaid directory"
  );
  Ok(stats)
}

/// Copy a single file into `dir`, keeping its file name.
pub fn copy_file_into(file: &Path, dir: &Path) -> Result<PathBuf, AssembleError> {
  if !file.is_file() {
    return Err(AssembleError::FileMissing(file.to_path_buf()));
  }

  let name = file
    .file_name()
    .ok_or_else(|| AssembleError::FileMissing(file.to_path_buf()))?;
  create_dir(dir)?;
  let target = dir.join(name);

  fs::copy(file, &target).map_err(|source| AssembleError::Copy {
    from: file.to_path_buf(),
    to: target.clone(),
    source,
  })?;

  Ok(target)
}

/// Where provisioned libraries land inside a module tree.
#[derive(Debug, Clone)]
pub struct LibraryLayout {
  libs: PathBuf,
}

impl LibraryLayout {
  pub fn new(module_dir: &Path) -> Self {
    Self {
      libs: module_dir.join(LIBS_DIRNAME),
    }
  }

  pub fn root(&self) -> &Path {
    &self.libs
  }

  /// Universal macOS libraries.
  pub fn macos(&self) -> PathBuf {
    self.libs.join("MacOSX")
  }

  fn visual_studio(&self) -> PathBuf {
    self.libs.join("VisualStudio2022").join("x64")
  }

  pub fn windows_release(&self, runtime: Runtime) -> PathBuf {
    self.visual_studio().join(runtime.release_dir())
  }

  pub fn windows_debug(&self, runtime: Runtime) -> PathBuf {
    self.visual_studio().join(runtime.debug_dir())
  }

  /// Release folder for a triplet's libraries.
  ///
  /// macOS triplets all share the universal folder.
  pub fn release_dir(&self, triplet: Triplet) -> PathBuf {
    match triplet.runtime() {
      Some(runtime) => self.windows_release(runtime),
      None => self.macos(),
    }
  }
}

/// Repository-provided content copied into every module.
#[derive(Debug, Clone)]
pub struct ModuleSources<'a> {
  pub project_dir: &'a Path,
  /// Fixed top-level files, relative to the project dir.
  pub files: &'a [String],
}

/// Apply the repository's `include/`, `src/` and fixed files to `module_dir`.
///
/// Runs after any provisioned headers are in place so the repository copy
/// wins on conflicts.
pub fn assemble_module_sources(sources: &ModuleSources<'_>, module_dir: &Path) -> Result<CopyStats, AssembleError> {
  let mut stats = CopyStats::default();

  for dir in ["include", "src"] {
    stats += overlay_dir(&sources.project_dir.join(dir), &module_dir.join(dir))?;
  }

  for file in sources.files {
    copy_file_into(&sources.project_dir.join(file), module_dir)?;
    stats.files += 1;
  }

  info!(module = %module_dir.display(), files = stats.files, "assembled module sources");
  Ok(stats)
}

/// Join independently produced platform builds into one staging tree.
///
/// The macOS build tree is overlaid whole; from the Windows build only the
/// module's `libs/` subtree is taken.
pub fn join_platform_builds(
  macos_build: &Path,
  windows_build: &Path,
  staging: &Path,
  module_name: &str,
) -> Result<CopyStats, AssembleError> {
  let mut stats = overlay_dir(macos_build, staging)?;

  let windows_libs = windows_build.join(module_name).join(LIBS_DIRNAME);
  stats += overlay_dir(&windows_libs, &staging.join(module_name).join(LIBS_DIRNAME))?;

  info!(
    staging = %staging.display(),
    files = stats.files,
    "joined platform builds"
  );
  Ok(stats)
}
