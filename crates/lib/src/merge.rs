//! Universal binary creation.
//!
//! Static libraries built separately for each macOS architecture are merged
//! pairwise with `lipo`. Merging is all-or-nothing: both architecture
//! directories must contain exactly the same set of matching files, which is
//! checked before any output is written.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::runner::{CommandRunner, Invocation, RunError};

/// Errors that can occur while merging binaries.
#[derive(Debug, Error)]
pub enum MergeError {
  /// The glob pattern itself is malformed.
  #[error("invalid file pattern '{pattern}': {message}")]
  Pattern { pattern: String, message: String },

  /// An input directory could not be listed.
  #[error("failed to list '{path}': {source}")]
  ListDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The two architecture directories disagree on which files exist.
  #[error("matched files differ between architectures: {0}")]
  FileSetMismatch(FileSetMismatch),

  /// The output directory could not be created.
  #[error("failed to create output directory '{path}': {source}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// `lipo -create` failed.
  #[error("failed to merge '{file}': {source}")]
  Lipo {
    file: String,
    #[source]
    source: RunError,
  },

  /// The merged file does not contain code for a requested architecture.
  #[error("file '{path}' does not contain code for architecture {arch}")]
  MissingArchitecture { path: PathBuf, arch: String },
}

/// The difference between two file listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSetMismatch {
  pub only_in_a: Vec<String>,
  pub only_in_b: Vec<String>,
}

impl FileSetMismatch {
  pub fn is_empty(&self) -> bool {
    self.only_in_a.is_empty() && self.only_in_b.is_empty()
  }
}

impl std::fmt::Display for FileSetMismatch {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let mut parts = Vec::new();
    if !self.only_in_a.is_empty() {
      parts.push(format!("only in first: [{}]", self.only_in_a.join(", ")));
    }
    if !self.only_in_b.is_empty() {
      parts.push(format!("only in second: [{}]", self.only_in_b.join(", ")));
    }
    write!(f, "{}", parts.join("; "))
  }
}

/// One input pair for a merge.
#[derive(Debug, Clone)]
pub struct ArchDir<'a> {
  pub dir: &'a Path,
  /// Architecture name as `lipo` reports it (`x86_64`, `arm64`).
  pub arch: &'a str,
}

const LISTING_OPTIONS: glob::MatchOptions = glob::MatchOptions {
  case_sensitive: true,
  require_literal_separator: true,
  require_literal_leading_dot: true,
};

/// List the file names directly inside `dir` matching `pattern`, sorted.
///
/// The match is not recursive; directories are skipped and symlinks are
/// followed. Wildcards never match a leading dot.
pub fn list_matches(dir: &Path, pattern: &str) -> Result<Vec<String>, MergeError> {
  let matcher = glob::Pattern::new(pattern).map_err(|e| MergeError::Pattern {
    pattern: pattern.to_string(),
    message: e.to_string(),
  })?;

  let list_err = |source: std::io::Error| MergeError::ListDir {
    path: dir.to_path_buf(),
    source,
  };

  let mut matches = Vec::new();
  for entry in fs::read_dir(dir).map_err(list_err)? {
    let entry = entry.map_err(list_err)?;
    let name = entry.file_name().to_string_lossy().into_owned();
    if !matcher.matches_with(&name, LISTING_OPTIONS) {
      continue;
    }
    if fs::metadata(entry.path()).map_err(list_err)?.is_file() {
      matches.push(name);
    }
  }

  matches.sort();
  Ok(matches)
}

/// Compute which names appear in only one of the listings.
pub fn compare_file_sets(a: &[String], b: &[String]) -> FileSetMismatch {
  let set_a: BTreeSet<&String> = a.iter().collect();
  let set_b: BTreeSet<&String> = b.iter().collect();

  FileSetMismatch {
    only_in_a: set_a.difference(&set_b).map(|s| s.to_string()).collect(),
    only_in_b: set_b.difference(&set_a).map(|s| s.to_string()).collect(),
  }
}

/// Drives `lipo` through a [`CommandRunner`].
pub struct Merger<'r> {
  runner: &'r dyn CommandRunner,
  lipo: PathBuf,
}

impl<'r> Merger<'r> {
  pub fn new(runner: &'r dyn CommandRunner) -> Self {
    Self {
      runner,
      lipo: PathBuf::from("lipo"),
    }
  }

  /// Use a specific `lipo` binary instead of the one on `PATH`.
  pub fn with_lipo(mut self, lipo: impl Into<PathBuf>) -> Self {
    self.lipo = lipo.into();
    self
  }

  /// Merge `a/relative` and `b/relative` into `output_dir/relative`.
  pub fn merge_one(&self, a: &Path, b: &Path, output_dir: &Path, relative: &str) -> Result<PathBuf, MergeError> {
    let output = output_dir.join(relative);
    if let Some(parent) = output.parent() {
      fs::create_dir_all(parent).map_err(|source| MergeError::CreateDir {
        path: parent.to_path_buf(),
        source,
      })?;
    }

    let invocation = Invocation::new(&self.lipo)
      .arg("-create")
      .arg(a.join(relative))
      .arg(b.join(relative))
      .arg("-output")
      .arg(&output);

    self.runner.run(&invocation).map_err(|source| MergeError::Lipo {
      file: relative.to_string(),
      source,
    })?;

    debug!(file = relative, output = %output.display(), "merged binary");
    Ok(output)
  }

  /// Check that `path` contains code for every architecture in `archs`.
  pub fn verify_architectures(&self, path: &Path, archs: &[&str]) -> Result<(), MergeError> {
    for arch in archs {
      let invocation = Invocation::new(&self.lipo).arg(path).arg("-verify_arch").arg(arch);
      if self.runner.run(&invocation).is_err() {
        return Err(MergeError::MissingArchitecture {
          path: path.to_path_buf(),
          arch: arch.to_string(),
        });
      }
    }

    debug!(path = %path.display(), archs = ?archs, "verified architectures");
    Ok(())
  }

  /// Merge every file matching `pattern` in both directories.
  ///
  /// Fails without writing anything if the two directories do not contain
  /// the same matching files. When `verify` is set each merged file is
  /// checked for both input architectures.
  pub fn merge_all(
    &self,
    a: &ArchDir<'_>,
    b: &ArchDir<'_>,
    output_dir: &Path,
    pattern: &str,
    verify: bool,
  ) -> Result<Vec<PathBuf>, MergeError> {
    let matches_a = list_matches(a.dir, pattern)?;
    let matches_b = list_matches(b.dir, pattern)?;

    let mismatch = compare_file_sets(&matches_a, &matches_b);
    if !mismatch.is_empty() {
      return Err(MergeError::FileSetMismatch(mismatch));
    }

    info!(
      count = matches_a.len(),
      pattern,
      output = %output_dir.display(),
      "merging {} and {} binaries",
      a.arch,
      b.arch
    );

    let archs = [a.arch, b.arch];
    let mut merged = Vec::with_capacity(matches_a.len());
    for name in &matches_a {
      let output = self.merge_one(a.dir, b.dir, output_dir, name)?;
      if verify {
        self.verify_architectures(&output, &archs)?;
      }
      merged.push(output);
    }

    Ok(merged)
  }
}
