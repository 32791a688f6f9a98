//! Native dependency provisioning.
//!
//! Dependencies are installed per triplet into an isolated install root laid
//! out as `<root>/<triplet>/{lib,include}` (plus `debug/lib` on Windows).
//! Two strategies produce that layout:
//!
//! - vcpkg in manifest mode, with the project's overlay triplets
//! - a plain CMake configure/build/install of a source tree, for
//!   dependencies that need a differently invoked toolchain
//!
//! Failures propagate immediately; there is no retry.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::config::{ProvisionStrategy, VcpkgConfig};
use crate::platform::Triplet;
use crate::platform::os::Os;
use crate::runner::{CommandRunner, Invocation, RunError, resolve_program};

#[derive(Debug, Error)]
pub enum ProvisionError {
  #[error("failed to bootstrap vcpkg: {0}")]
  Bootstrap(#[source] RunError),

  #[error("failed to install dependencies for {triplet}: {source}")]
  Install {
    triplet: Triplet,
    #[source]
    source: RunError,
  },

  #[error("triplet {triplet} cannot be provisioned on {host}")]
  UnsupportedHost { triplet: Triplet, host: Os },
}

/// Installed dependencies for one triplet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRoot {
  pub root: PathBuf,
  pub triplet: Triplet,
}

impl InstallRoot {
  pub fn new(root: impl Into<PathBuf>, triplet: Triplet) -> Self {
    Self {
      root: root.into(),
      triplet,
    }
  }

  pub fn prefix(&self) -> PathBuf {
    self.root.join(self.triplet.name())
  }

  pub fn lib_dir(&self) -> PathBuf {
    self.prefix().join("lib")
  }

  pub fn debug_lib_dir(&self) -> PathBuf {
    self.prefix().join("debug").join("lib")
  }

  pub fn include_dir(&self) -> PathBuf {
    self.prefix().join("include")
  }
}

/// Installs dependencies for the project at `project_dir`.
pub struct Provisioner<'a> {
  runner: &'a dyn CommandRunner,
  project_dir: &'a Path,
  vcpkg: &'a VcpkgConfig,
  host: Os,
}

impl<'a> Provisioner<'a> {
  pub fn new(runner: &'a dyn CommandRunner, project_dir: &'a Path, vcpkg: &'a VcpkgConfig, host: Os) -> Self {
    Self {
      runner,
      project_dir,
      vcpkg,
      host,
    }
  }

  fn vcpkg_root(&self) -> PathBuf {
    resolve_program(self.project_dir, &self.vcpkg.root)
  }

  fn vcpkg_executable(&self) -> PathBuf {
    let name = if self.host == Os::Windows { "vcpkg.exe" } else { "vcpkg" };
    self.vcpkg_root().join(name)
  }

  /// Build the vcpkg tool itself from the checked-out sources.
  pub fn bootstrap(&self) -> Result<(), ProvisionError> {
    let script = if self.host == Os::Windows {
      "bootstrap-vcpkg.bat"
    } else {
      "bootstrap-vcpkg.sh"
    };

    let invocation = Invocation::new(self.vcpkg_root().join(script)).cwd(self.project_dir);
    info!(script, "bootstrapping vcpkg");
    self.runner.run(&invocation).map_err(ProvisionError::Bootstrap)?;
    Ok(())
  }

  /// The `vcpkg install` call for `triplet`.
  pub fn vcpkg_install(&self, triplet: Triplet, root: &Path) -> Invocation {
    let mut invocation = Invocation::new(self.vcpkg_executable())
      .arg("install")
      .arg(format!("--triplet={}", triplet.name()));

    if triplet.os() == Os::Windows {
      invocation = invocation.arg(format!(
        "--x-buildtrees-root={}",
        self.vcpkg.windows_buildtrees_root.display()
      ));
    }

    invocation
      .arg(format!("--x-install-root={}", root.display()))
      .cwd(self.project_dir)
      .env(
        "VCPKG_OVERLAY_TRIPLETS",
        resolve_program(self.project_dir, &self.vcpkg.overlay_triplets),
      )
  }

  /// The configure/build/install calls for a CMake-provisioned triplet.
  pub fn cmake_steps(
    &self,
    triplet: Triplet,
    root: &Path,
    source_dir: &Path,
    defines: &std::collections::BTreeMap<String, String>,
  ) -> Vec<Invocation> {
    let install = InstallRoot::new(root, triplet);
    let mut configs = vec![("Release", install.prefix())];
    if triplet.has_debug_libs() {
      configs.push(("Debug", install.prefix().join("debug")));
    }

    let source_dir = resolve_program(self.project_dir, source_dir);
    let mut steps = Vec::new();

    for (config, prefix) in &configs {
      let build_dir = root
        .join("buildtrees")
        .join(triplet.name())
        .join(config.to_lowercase());

      let mut configure = Invocation::new("cmake")
        .arg("-S")
        .arg(&source_dir)
        .arg("-B")
        .arg(&build_dir)
        .arg(format!("-DCMAKE_BUILD_TYPE={}", config))
        .arg(format!("-DCMAKE_INSTALL_PREFIX={}", prefix.display()));

      match triplet.runtime() {
        Some(runtime) => {
          configure = configure
            .arg("-A")
            .arg("x64")
            .arg(format!("-DCMAKE_MSVC_RUNTIME_LIBRARY={}", runtime.msvc_runtime_library()));
        }
        None => {
          configure = configure.arg(format!("-DCMAKE_OSX_ARCHITECTURES={}", triplet.arch().apple_name()));
        }
      }

      for (key, value) in defines {
        configure = configure.arg(format!("-D{}={}", key, value));
      }

      steps.push(configure.cwd(self.project_dir));
      steps.push(
        Invocation::new("cmake")
          .arg("--build")
          .arg(&build_dir)
          .arg("--config")
          .arg(config)
          .cwd(self.project_dir),
      );
      steps.push(
        Invocation::new("cmake")
          .arg("--install")
          .arg(&build_dir)
          .arg("--config")
          .arg(config)
          .cwd(self.project_dir),
      );
    }

    steps
  }

  /// Install every dependency for `triplet` under `root`.
  pub fn install(
    &self,
    triplet: Triplet,
    root: &Path,
    strategy: &ProvisionStrategy,
  ) -> Result<InstallRoot, ProvisionError> {
    if triplet.os() != self.host {
      return Err(ProvisionError::UnsupportedHost {
        triplet,
        host: self.host,
      });
    }

    let steps = match strategy {
      ProvisionStrategy::Vcpkg => vec![self.vcpkg_install(triplet, root)],
      ProvisionStrategy::Cmake { source_dir, defines } => self.cmake_steps(triplet, root, source_dir, defines),
    };

    info!(triplet = %triplet, root = %root.display(), steps = steps.len(), "provisioning dependencies");
    for step in &steps {
      self
        .runner
        .run(step)
        .map_err(|source| ProvisionError::Install { triplet, source })?;
    }

    Ok(InstallRoot::new(root, triplet))
  }
}
