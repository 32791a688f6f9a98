//! Small JSON files written next to build artifacts.
//!
//! Files are written with four-space indentation so they stay readable when
//! shipped inside the package.

use std::fs;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JsonFileError {
  #[error("failed to read {path}: {source}")]
  Read {
    path: String,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to write {path}: {source}")]
  Write {
    path: String,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse {path}: {source}")]
  Parse {
    path: String,
    #[source]
    source: serde_json::Error,
  },

  #[error("failed to serialize {path}: {source}")]
  Serialize {
    path: String,
    #[source]
    source: serde_json::Error,
  },
}

/// Serialize `value` with four-space indentation.
pub fn to_string_indented<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
  let mut buf = Vec::new();
  let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
  let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
  value.serialize(&mut serializer)?;
  // serde_json only ever emits valid UTF-8
  Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write `value` to `path`, replacing any existing file.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), JsonFileError> {
  let content = to_string_indented(value).map_err(|source| JsonFileError::Serialize {
    path: path.display().to_string(),
    source,
  })?;

  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).map_err(|source| JsonFileError::Write {
      path: path.display().to_string(),
      source,
    })?;
  }

  fs::write(path, content).map_err(|source| JsonFileError::Write {
    path: path.display().to_string(),
    source,
  })
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, JsonFileError> {
  let content = fs::read_to_string(path).map_err(|source| JsonFileError::Read {
    path: path.display().to_string(),
    source,
  })?;

  serde_json::from_str(&content).map_err(|source| JsonFileError::Parse {
    path: path.display().to_string(),
    source,
  })
}
