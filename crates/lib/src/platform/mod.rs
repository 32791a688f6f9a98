pub mod arch;
pub mod os;
pub mod triplet;

use arch::Arch;
use os::Os;
use std::fmt;

pub use triplet::{Runtime, Triplet, TripletParseError};

/// The machine the pipeline runs on, which decides what it can provision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
  pub arch: Arch,
  pub os: Os,
}

impl Platform {
  /// Create a new platform identifier
  pub fn new(arch: Arch, os: Os) -> Self {
    Self { arch, os }
  }

  /// Detect the current platform at runtime
  ///
  /// Returns `None` if the OS or architecture is not supported
  pub fn current() -> Option<Self> {
    Some(Self {
      arch: Arch::current()?,
      os: Os::current()?,
    })
  }

  /// Triplets provisioned when building on this platform.
  ///
  /// macOS builds both architectures so they can be merged into universal
  /// binaries; Windows builds both runtime-linkage variants. Other hosts
  /// have nothing to provision.
  pub fn triplets(&self) -> &'static [Triplet] {
    Triplet::for_os(self.os)
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}-{}", self.arch, self.os)
  }
}
