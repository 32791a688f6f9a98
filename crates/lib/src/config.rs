//! Project configuration.
//!
//! All settings have defaults, so a project without a `juce-dist.toml` builds
//! the `indiekey_juce` module against DigitalOcean Spaces in `lon1`.
//!
//! ```toml
//! [module]
//! name = "indiekey_juce"
//!
//! [spaces]
//! bucket = "indiekey-juce"
//!
//! [targets.macos-arm64]
//! strategy = "cmake"
//! source_dir = "submodules/libsodium-cmake"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::{
  CONFIG_FILENAME, DEFAULT_MODULE_NAME, DEFAULT_OVERLAY_TRIPLETS, DEFAULT_SPACES_BUCKET, DEFAULT_SPACES_ENDPOINT,
  DEFAULT_SPACES_REGION, DEFAULT_TAG_PATTERN, DEFAULT_VCPKG_ROOT, DEFAULT_WINDOWS_BUILDTREES_ROOT,
};
use crate::platform::Triplet;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config '{path}': {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse config '{path}': {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: Box<toml::de::Error>,
  },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DistConfig {
  pub module: ModuleConfig,
  pub vcpkg: VcpkgConfig,
  pub spaces: SpacesConfig,
  pub git: GitConfig,
  /// Per-triplet provisioning strategy; triplets not listed use vcpkg.
  pub targets: BTreeMap<Triplet, ProvisionStrategy>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModuleConfig {
  pub name: String,
  /// Fixed top-level files copied into the module, relative to the project dir.
  /// Defaults to `CMakeLists.txt`, `<name>.h` and `<name>.cpp`.
  pub files: Option<Vec<String>>,
}

impl Default for ModuleConfig {
  fn default() -> Self {
    Self {
      name: DEFAULT_MODULE_NAME.to_string(),
      files: None,
    }
  }
}

impl ModuleConfig {
  pub fn files(&self) -> Vec<String> {
    match &self.files {
      Some(files) => files.clone(),
      None => vec![
        "CMakeLists.txt".to_string(),
        format!("{}.h", self.name),
        format!("{}.cpp", self.name),
      ],
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VcpkgConfig {
  /// vcpkg checkout, relative to the project dir.
  pub root: PathBuf,
  /// Overlay triplet directory, relative to the project dir.
  pub overlay_triplets: PathBuf,
  pub windows_buildtrees_root: PathBuf,
}

impl Default for VcpkgConfig {
  fn default() -> Self {
    Self {
      root: PathBuf::from(DEFAULT_VCPKG_ROOT),
      overlay_triplets: PathBuf::from(DEFAULT_OVERLAY_TRIPLETS),
      windows_buildtrees_root: PathBuf::from(DEFAULT_WINDOWS_BUILDTREES_ROOT),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpacesConfig {
  pub bucket: String,
  pub endpoint: String,
  pub region: String,
  pub force_path_style: bool,
}

impl Default for SpacesConfig {
  fn default() -> Self {
    Self {
      bucket: DEFAULT_SPACES_BUCKET.to_string(),
      endpoint: DEFAULT_SPACES_ENDPOINT.to_string(),
      region: DEFAULT_SPACES_REGION.to_string(),
      force_path_style: false,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GitConfig {
  /// Glob the version tag must match.
  pub tag_pattern: String,

  /// Also describe against lightweight tags, like `git describe --tags`.
  pub lightweight_tags: bool,
}

impl Default for GitConfig {
  fn default() -> Self {
    Self {
      tag_pattern: DEFAULT_TAG_PATTERN.to_string(),
      lightweight_tags: false,
    }
  }
}

/// How a triplet's native dependencies are produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "kebab-case", deny_unknown_fields)]
pub enum ProvisionStrategy {
  /// `vcpkg install` in manifest mode.
  #[default]
  Vcpkg,
  /// Configure, build and install a CMake project with a per-target toolchain setup.
  Cmake {
    /// CMake source tree, relative to the project dir.
    source_dir: PathBuf,
    /// Extra `-D` definitions.
    #[serde(default)]
    defines: BTreeMap<String, String>,
  },
}

impl DistConfig {
  pub fn from_toml_str(content: &str, path: &Path) -> Result<Self, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::Parse {
      path: path.to_path_buf(),
      source: Box::new(e),
    })
  }

  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_toml_str(&content, path)
  }

  /// Load `path` if given, else `<project_dir>/juce-dist.toml` if it exists, else defaults.
  pub fn discover(project_dir: &Path, path: Option<&Path>) -> Result<Self, ConfigError> {
    if let Some(path) = path {
      return Self::load(path);
    }

    let default_path = project_dir.join(CONFIG_FILENAME);
    if default_path.is_file() {
      debug!(path = %default_path.display(), "loading config");
      return Self::load(&default_path);
    }

    debug!("no config file found, using defaults");
    Ok(Self::default())
  }

  pub fn strategy_for(&self, triplet: Triplet) -> &ProvisionStrategy {
    const VCPKG: &ProvisionStrategy = &ProvisionStrategy::Vcpkg;
    self.targets.get(&triplet).unwrap_or(VCPKG)
  }
}
