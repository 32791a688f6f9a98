//! Version stamping.
//!
//! The version record is the single source of truth for identifying an
//! artifact. It is written verbatim into the module tree as `version.json`.

use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::consts::VERSION_FILENAME;
use crate::util::json::{JsonFileError, read_json, write_json};

/// Timestamp format of `VersionRecord::date`, e.g. `2024-03-01 14:05:09.123456`.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
  pub version: String,
  pub build_number: String,
  pub date: String,
}

impl VersionRecord {
  /// Create a record dated now.
  pub fn new(version: impl Into<String>, build_number: impl Into<String>) -> Self {
    Self {
      version: version.into(),
      build_number: build_number.into(),
      date: Local::now().format(DATE_FORMAT).to_string(),
    }
  }
}

/// Write `record` as `<dir>/version.json`.
pub fn write_version_record(dir: &Path, record: &VersionRecord) -> Result<PathBuf, JsonFileError> {
  let path = dir.join(VERSION_FILENAME);
  write_json(&path, record)?;
  info!(
    path = %path.display(),
    version = %record.version,
    build_number = %record.build_number,
    "wrote version record"
  );
  Ok(path)
}

pub fn read_version_record(dir: &Path) -> Result<VersionRecord, JsonFileError> {
  read_json(&dir.join(VERSION_FILENAME))
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::NaiveDateTime;
  use tempfile::TempDir;

  #[test]
  fn round_trip_reproduces_record() {
    let temp = TempDir::new().unwrap();
    let record = VersionRecord {
      version: "v1.2.3-4-gabc1234".to_string(),
      build_number: "42".to_string(),
      date: "2024-03-01 14:05:09.123456".to_string(),
    };

    write_version_record(temp.path(), &record).unwrap();

    assert_eq!(read_version_record(temp.path()).unwrap(), record);
  }

  #[test]
  fn file_uses_stable_field_order_and_indent() {
    let temp = TempDir::new().unwrap();
    let record = VersionRecord {
      version: "v1.0.0".to_string(),
      build_number: "7".to_string(),
      date: "2024-01-01 00:00:00.000000".to_string(),
    };

    let path = write_version_record(temp.path(), &record).unwrap();

    assert_eq!(
      std::fs::read_to_string(path).unwrap(),
      "{\n    \"version\": \"v1.0.0\",\n    \"build_number\": \"7\",\n    \"date\": \"2024-01-01 00:00:00.000000\"\n}"
    );
  }

  #[test]
  fn new_record_date_is_parseable() {
    let record = VersionRecord::new("v1.0.0", "1");
    assert!(NaiveDateTime::parse_from_str(&record.date, DATE_FORMAT).is_ok());
  }
}
