//! Archive creation and the distribution pointer.
//!
//! The staging tree is zipped into `<module>-<version>-<build>-dist.zip`
//! inside the dist build dir. The archive's path is then recorded in
//! `dist.json` so a later publish step can find it without recomputing
//! anything.

use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

use crate::consts::DIST_POINTER_FILENAME;
use crate::util::hash::{ContentHash, hash_file};
use crate::util::json::{JsonFileError, read_json, write_json};

#[derive(Debug, Error)]
pub enum ArchiveError {
  #[error("nothing to archive, directory does not exist: {0}")]
  SourceMissing(PathBuf),

  #[error("failed to walk '{path}': {message}")]
  Walk { path: PathBuf, message: String },

  #[error("io error while archiving '{path}': {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to write zip entry '{entry}': {source}")]
  Zip {
    entry: String,
    #[source]
    source: zip::result::ZipError,
  },

  #[error("archive '{archive}' is not inside build dir '{build_dir}'")]
  OutsideBuildDir { archive: PathBuf, build_dir: PathBuf },

  #[error(transparent)]
  Pointer(#[from] JsonFileError),
}

/// File name of the archive for a build.
///
/// Tag builds go to the versioned archive location, where the version alone
/// identifies the artifact, so the build number is left out.
pub fn archive_file_name(module: &str, version: &str, build_number: &str, tag_build: bool) -> String {
  if tag_build {
    format!("{}-{}-dist.zip", module, version)
  } else {
    format!("{}-{}-{}-dist.zip", module, version, build_number)
  }
}

/// What `create_archive` produced.
#[derive(Debug, Clone)]
pub struct ArchiveSummary {
  pub path: PathBuf,
  pub entries: usize,
  pub size: u64,
  pub sha256: ContentHash,
}

/// Zip the contents of `src_dir` into `dest`, replacing any existing file.
///
/// Entry names are relative to `src_dir`, use `/` separators and are added
/// in sorted order; directories get their own entries.
pub fn create_archive(src_dir: &Path, dest: &Path) -> Result<ArchiveSummary, ArchiveError> {
  if !src_dir.is_dir() {
    return Err(ArchiveError::SourceMissing(src_dir.to_path_buf()));
  }

  let io_err = |path: &Path| {
    let path = path.to_path_buf();
    move |source| ArchiveError::Io { path, source }
  };

  if let Some(parent) = dest.parent() {
    fs::create_dir_all(parent).map_err(io_err(parent))?;
  }
  if dest.exists() {
    debug!(path = %dest.display(), "replacing existing archive");
    fs::remove_file(dest).map_err(io_err(dest))?;
  }

  let file = File::create(dest).map_err(io_err(dest))?;
  let mut zip = zip::ZipWriter::new(BufWriter::new(file));
  let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
  let mut entries = 0;

  for entry in WalkDir::new(src_dir).min_depth(1).sort_by_file_name() {
    let entry = entry.map_err(|e| ArchiveError::Walk {
      path: src_dir.to_path_buf(),
      message: e.to_string(),
    })?;
    let relative = entry.path().strip_prefix(src_dir).unwrap_or(entry.path());
    let name = relative
      .components()
      .map(|c| c.as_os_str().to_string_lossy())
      .collect::<Vec<_>>()
      .join("/");

    if entry.file_type().is_dir() {
      let dir_name = format!("{}/", name);
      zip
        .add_directory(dir_name.clone(), options)
        .map_err(|source| ArchiveError::Zip { entry: dir_name, source })?;
    } else {
      zip.start_file(name.clone(), options).map_err(|source| ArchiveError::Zip {
        entry: name.clone(),
        source,
      })?;
      let mut input = File::open(entry.path()).map_err(io_err(entry.path()))?;
      io::copy(&mut input, &mut zip).map_err(io_err(entry.path()))?;
    }
    entries += 1;
  }

  zip
    .finish()
    .map_err(|source| ArchiveError::Zip {
      entry: "<central directory>".to_string(),
      source,
    })?
    .into_inner()
    .map_err(|e| ArchiveError::Io {
      path: dest.to_path_buf(),
      source: e.into_error(),
    })?;

  let size = fs::metadata(dest).map_err(io_err(dest))?.len();
  let sha256 = hash_file(dest).map_err(io_err(dest))?;

  info!(path = %dest.display(), entries, size, "created archive");
  Ok(ArchiveSummary {
    path: dest.to_path_buf(),
    entries,
    size,
    sha256,
  })
}

/// Record of the archive produced by the last archive step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistPointer {
  /// Archive path relative to the dist build dir.
  pub path: String,
  pub version: String,
  pub build_number: String,
}

impl DistPointer {
  /// Point at `archive`, which must live inside `build_dir`.
  pub fn for_archive(
    build_dir: &Path,
    archive: &Path,
    version: impl Into<String>,
    build_number: impl Into<String>,
  ) -> Result<Self, ArchiveError> {
    let relative = archive.strip_prefix(build_dir).map_err(|_| ArchiveError::OutsideBuildDir {
      archive: archive.to_path_buf(),
      build_dir: build_dir.to_path_buf(),
    })?;

    Ok(Self {
      path: relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/"),
      version: version.into(),
      build_number: build_number.into(),
    })
  }

  /// Absolute location of the archive.
  pub fn resolve(&self, build_dir: &Path) -> PathBuf {
    build_dir.join(&self.path)
  }
}

pub fn write_dist_pointer(build_dir: &Path, pointer: &DistPointer) -> Result<PathBuf, ArchiveError> {
  let path = build_dir.join(DIST_POINTER_FILENAME);
  write_json(&path, pointer)?;
  debug!(path = %path.display(), archive = %pointer.path, "wrote dist pointer");
  Ok(path)
}

pub fn read_dist_pointer(build_dir: &Path) -> Result<DistPointer, ArchiveError> {
  Ok(read_json(&build_dir.join(DIST_POINTER_FILENAME))?)
}
