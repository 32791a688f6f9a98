//! Test utilities for juce-dist-lib.
//!
//! Cross-platform shell helpers plus [`FakeRunner`], a [`CommandRunner`] that
//! records invocations and emulates the handful of tools the pipeline drives.
//!
//! Fake "binaries" are text files with one `arch:<name>` line per contained
//! architecture, so merged output can be inspected with plain reads.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use crate::platform::Triplet;
use crate::runner::{CommandRunner, Invocation, RunError};

/// Returns the shell command and args to execute a shell script.
#[cfg(unix)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("/bin/sh", vec!["-c".to_string(), script.to_string()])
}

#[cfg(windows)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("cmd.exe", vec!["/C".to_string(), script.to_string()])
}

/// Returns the command and args to echo a message.
#[cfg(unix)]
pub fn echo_msg(msg: &str) -> (&'static str, Vec<String>) {
  ("/bin/echo", vec![msg.to_string()])
}

#[cfg(windows)]
pub fn echo_msg(msg: &str) -> (&'static str, Vec<String>) {
  ("cmd.exe", vec!["/C".to_string(), format!("echo {}", msg)])
}

/// Contents of a fake single-architecture binary.
pub fn stub_binary(arch: &str) -> String {
  format!("arch:{}\n", arch)
}

/// Architectures contained in a fake binary.
pub fn stub_archs(path: &Path) -> Vec<String> {
  fs::read_to_string(path)
    .unwrap_or_default()
    .lines()
    .filter_map(|l| l.strip_prefix("arch:"))
    .map(str::to_string)
    .collect()
}

/// Write `content` to `root/relative`, creating parents.
pub fn write_file(root: &Path, relative: &str, content: &str) -> PathBuf {
  let path = root.join(relative);
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).unwrap();
  }
  fs::write(&path, content).unwrap();
  path
}

/// A recording command runner.
///
/// - `lipo -create A B -output OUT` concatenates the inputs into `OUT`
/// - `lipo PATH -verify_arch ARCH` fails unless `PATH` contains `arch:ARCH`
/// - `vcpkg install --triplet=T --x-install-root=R` populates `R/T` with
///   one static library and one header
/// - everything else is recorded and succeeds
#[derive(Debug, Default)]
pub struct FakeRunner {
  calls: RefCell<Vec<Invocation>>,
  fail_program: Option<String>,
  libraries: Vec<String>,
}

impl FakeRunner {
  pub fn new() -> Self {
    Self {
      calls: RefCell::new(Vec::new()),
      fail_program: None,
      libraries: vec!["libsodium".to_string()],
    }
  }

  /// Make every invocation of `program` exit with code 1.
  pub fn failing_on(program: &str) -> Self {
    Self {
      fail_program: Some(program.to_string()),
      ..Self::new()
    }
  }

  /// Library base names the fake vcpkg installs.
  pub fn with_libraries(mut self, names: &[&str]) -> Self {
    self.libraries = names.iter().map(|s| s.to_string()).collect();
    self
  }

  pub fn calls(&self) -> Vec<Invocation> {
    self.calls.borrow().clone()
  }

  /// Invocations of the given program, matched by file name.
  pub fn calls_to(&self, program: &str) -> Vec<Invocation> {
    self
      .calls
      .borrow()
      .iter()
      .filter(|c| c.program_name().starts_with(program))
      .cloned()
      .collect()
  }

  fn fail(invocation: &Invocation) -> RunError {
    RunError::Failed {
      command: invocation.to_string(),
      code: Some(1),
    }
  }

  fn lipo(&self, invocation: &Invocation) -> Result<String, RunError> {
    let args = invocation.args_lossy();

    if args.first().map(String::as_str) == Some("-create") {
      let output_pos = args.iter().position(|a| a == "-output").ok_or_else(|| Self::fail(invocation))?;
      let output = args.get(output_pos + 1).ok_or_else(|| Self::fail(invocation))?;
      let mut merged = String::new();
      for input in &args[1..output_pos] {
        merged.push_str(&fs::read_to_string(input).map_err(|_| Self::fail(invocation))?);
      }
      fs::write(output, merged).map_err(|_| Self::fail(invocation))?;
      return Ok(String::new());
    }

    if args.get(1).map(String::as_str) == Some("-verify_arch") {
      let path = Path::new(&args[0]);
      let arch = args.get(2).ok_or_else(|| Self::fail(invocation))?;
      if stub_archs(path).iter().any(|a| a == arch) {
        return Ok(String::new());
      }
      return Err(Self::fail(invocation));
    }

    Ok(String::new())
  }

  fn vcpkg(&self, invocation: &Invocation) -> Result<String, RunError> {
    let args = invocation.args_lossy();
    if args.first().map(String::as_str) != Some("install") {
      return Ok(String::new());
    }

    let value = |prefix: &str| args.iter().find_map(|a| a.strip_prefix(prefix).map(str::to_string));
    let triplet: Triplet = value("--triplet=")
      .and_then(|t| t.parse().ok())
      .ok_or_else(|| Self::fail(invocation))?;
    let root = value("--x-install-root=").ok_or_else(|| Self::fail(invocation))?;
    let prefix = Path::new(&root).join(triplet.name());

    for lib in &self.libraries {
      if triplet.has_debug_libs() {
        write_file(&prefix, &format!("lib/{}.lib", lib), triplet.name());
        write_file(&prefix, &format!("debug/lib/{}d.lib", lib), triplet.name());
      } else {
        write_file(&prefix, &format!("lib/{}.a", lib), &stub_binary(triplet.arch().apple_name()));
      }
      write_file(&prefix, &format!("include/{}/{}.h", lib, lib), triplet.name());
    }

    Ok(String::new())
  }
}

impl CommandRunner for FakeRunner {
  fn run(&self, invocation: &Invocation) -> Result<String, RunError> {
    self.calls.borrow_mut().push(invocation.clone());

    let name = invocation.program_name();
    if self.fail_program.as_deref().is_some_and(|fail| name.starts_with(fail)) {
      return Err(Self::fail(invocation));
    }

    if name == "lipo" {
      self.lipo(invocation)
    } else if name.starts_with("vcpkg") {
      self.vcpkg(invocation)
    } else {
      Ok(String::new())
    }
  }
}
