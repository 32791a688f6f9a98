//! Shared test helpers for CLI integration tests.

use std::fs::File;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Isolated test environment.
///
/// The temp directory doubles as project dir and working directory, so the
/// default build paths (`build`, `build-dist`, `build-macos`, ...) land in it.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn empty() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  /// A project with the module's fixed files and some repository sources.
  pub fn project() -> Self {
    let env = Self::empty();
    env.write_file("CMakeLists.txt", "juce_add_module(indiekey_juce)");
    env.write_file("indiekey_juce.h", "// module header");
    env.write_file("indiekey_juce.cpp", "// module source");
    env.write_file("include/indiekey/license.h", "// license");
    env.write_file("src/license.cpp", "// license");
    env
  }

  /// Platform builds as produced by `build-and-package` on each host.
  pub fn with_platform_builds(self) -> Self {
    self.write_file("build-macos/indiekey_juce/indiekey_juce.h", "// module header");
    self.write_file("build-macos/indiekey_juce/libs/MacOSX/libsodium.a", "universal");
    self.write_file(
      "build-windows/indiekey_juce/libs/VisualStudio2022/x64/MD/libsodium.lib",
      "md",
    );
    self.write_file(
      "build-windows/indiekey_juce/libs/VisualStudio2022/x64/MDd/libsodium.lib",
      "mdd",
    );
    self
  }

  pub fn path(&self) -> &Path {
    self.temp.path()
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  pub fn join(&self, relative_path: &str) -> PathBuf {
    self.temp.path().join(relative_path)
  }

  /// Entry names of a zip archive relative to the temp directory.
  pub fn zip_entries(&self, relative_path: &str) -> Vec<String> {
    let archive = zip::ZipArchive::new(File::open(self.join(relative_path)).unwrap()).unwrap();
    archive.file_names().map(str::to_string).collect()
  }

  /// Run git inside the temp directory, isolated from user and system config.
  pub fn git(&self, args: &[&str]) -> String {
    let output = std::process::Command::new("git")
      .args(["-c", "user.name=Dist Test", "-c", "user.email=dist@example.com"])
      .args(["-c", "commit.gpgsign=false", "-c", "tag.gpgsign=false"])
      .args(args)
      .current_dir(self.path())
      .env("GIT_CONFIG_NOSYSTEM", "1")
      .env("GIT_CONFIG_GLOBAL", self.join("no-global-config"))
      .output()
      .unwrap();
    assert!(output.status.success(), "git {:?} failed: {}", args, String::from_utf8_lossy(&output.stderr));
    String::from_utf8_lossy(&output.stdout).trim().to_string()
  }

  /// Initialise a repository with `main` checked out.
  pub fn with_git_repo(self) -> Self {
    self.git(&["init", "-q"]);
    self.git(&["symbolic-ref", "HEAD", "refs/heads/main"]);
    self
  }

  /// Get a Command for the juce-dist binary that derives version and branch
  /// from the repository in the temp directory.
  pub fn detect_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("juce-dist");
    cmd.current_dir(self.path());
    cmd.env_remove("SPACES_KEY");
    cmd.env_remove("SPACES_SECRET");
    cmd.arg("--project-dir").arg(self.path());
    cmd
  }

  /// Get a pre-configured Command for the juce-dist binary.
  ///
  /// Runs inside the temp directory with a fixed version and branch so no
  /// git repository is needed, and without Spaces credentials.
  pub fn dist_cmd(&self, branch: &str) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("juce-dist");
    cmd.current_dir(self.path());
    cmd.env_remove("SPACES_KEY");
    cmd.env_remove("SPACES_SECRET");
    cmd.arg("--project-dir").arg(self.path());
    cmd.args(["--release-version", "v1.2.3", "--branch", branch]);
    cmd
  }
}
