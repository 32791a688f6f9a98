//! Target triplets understood by the dependency provisioner.
//!
//! A triplet combines operating system, CPU architecture and, on Windows,
//! the C runtime linkage. The names match the overlay triplets shipped in
//! the project's `triplets/` directory.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::arch::Arch;
use super::os::Os;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown triplet '{0}' (expected one of: macos-arm64, macos-x86-64, windows-x64-mt, windows-x64-md)")]
pub struct TripletParseError(pub String);

/// MSVC runtime linkage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Runtime {
  /// `/MT`: static CRT
  Static,
  /// `/MD`: dynamic CRT
  Dynamic,
}

impl Runtime {
  /// Library folder for release builds inside a JUCE module.
  pub fn release_dir(&self) -> &'static str {
    match self {
      Self::Static => "MT",
      Self::Dynamic => "MD",
    }
  }

  /// Library folder for debug builds inside a JUCE module.
  pub fn debug_dir(&self) -> &'static str {
    match self {
      Self::Static => "MTd",
      Self::Dynamic => "MDd",
    }
  }

  /// Value for `CMAKE_MSVC_RUNTIME_LIBRARY`.
  pub fn msvc_runtime_library(&self) -> &'static str {
    match self {
      Self::Static => "MultiThreaded$<$<CONFIG:Debug>:Debug>",
      Self::Dynamic => "MultiThreaded$<$<CONFIG:Debug>:Debug>DLL",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Triplet {
  MacosArm64,
  MacosX86_64,
  WindowsX64Mt,
  WindowsX64Md,
}

const MACOS_TRIPLETS: [Triplet; 2] = [Triplet::MacosArm64, Triplet::MacosX86_64];
const WINDOWS_TRIPLETS: [Triplet; 2] = [Triplet::WindowsX64Mt, Triplet::WindowsX64Md];

impl Triplet {
  pub const ALL: [Triplet; 4] = [
    Triplet::MacosArm64,
    Triplet::MacosX86_64,
    Triplet::WindowsX64Mt,
    Triplet::WindowsX64Md,
  ];

  pub fn name(&self) -> &'static str {
    match self {
      Self::MacosArm64 => "macos-arm64",
      Self::MacosX86_64 => "macos-x86-64",
      Self::WindowsX64Mt => "windows-x64-mt",
      Self::WindowsX64Md => "windows-x64-md",
    }
  }

  pub fn os(&self) -> Os {
    match self {
      Self::MacosArm64 | Self::MacosX86_64 => Os::MacOs,
      Self::WindowsX64Mt | Self::WindowsX64Md => Os::Windows,
    }
  }

  pub fn arch(&self) -> Arch {
    match self {
      Self::MacosArm64 => Arch::Aarch64,
      Self::MacosX86_64 | Self::WindowsX64Mt | Self::WindowsX64Md => Arch::X86_64,
    }
  }

  /// Runtime linkage, only meaningful on Windows.
  pub fn runtime(&self) -> Option<Runtime> {
    match self {
      Self::WindowsX64Mt => Some(Runtime::Static),
      Self::WindowsX64Md => Some(Runtime::Dynamic),
      Self::MacosArm64 | Self::MacosX86_64 => None,
    }
  }

  /// Whether installs for this triplet carry a separate `debug/lib` tree.
  pub fn has_debug_libs(&self) -> bool {
    self.runtime().is_some()
  }

  pub fn for_os(os: Os) -> &'static [Triplet] {
    match os {
      Os::MacOs => &MACOS_TRIPLETS,
      Os::Windows => &WINDOWS_TRIPLETS,
      Os::Linux => &[],
    }
  }
}

impl fmt::Display for Triplet {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.name())
  }
}

impl FromStr for Triplet {
  type Err = TripletParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Triplet::ALL
      .into_iter()
      .find(|t| t.name() == s)
      .ok_or_else(|| TripletParseError(s.to_string()))
  }
}

impl TryFrom<String> for Triplet {
  type Error = TripletParseError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<Triplet> for String {
  fn from(value: Triplet) -> Self {
    value.name().to_string()
  }
}
