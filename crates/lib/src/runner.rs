//! External command execution.
//!
//! Every external tool (vcpkg, lipo, cmake) is reached through the
//! [`CommandRunner`] trait so the pipeline can be driven by a fake runner in
//! tests. Calls are synchronous and blocking; there is no timeout.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur while running an external command.
#[derive(Debug, Error)]
pub enum RunError {
  /// The process could not be started at all.
  #[error("failed to spawn `{command}`: {source}")]
  Spawn {
    command: String,
    #[source]
    source: std::io::Error,
  },

  /// The process exited unsuccessfully.
  #[error("command failed with exit code {code:?}: {command}")]
  Failed { command: String, code: Option<i32> },
}

/// A single external process call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
  pub program: PathBuf,
  pub args: Vec<OsString>,
  pub cwd: Option<PathBuf>,
  pub env: BTreeMap<String, OsString>,
}

impl Invocation {
  pub fn new(program: impl Into<PathBuf>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      cwd: None,
      env: BTreeMap::new(),
    }
  }

  pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
    self.args.push(arg.as_ref().to_os_string());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
  {
    self.args.extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
    self
  }

  pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
    self.cwd = Some(dir.into());
    self
  }

  pub fn env(mut self, key: impl Into<String>, value: impl AsRef<OsStr>) -> Self {
    self.env.insert(key.into(), value.as_ref().to_os_string());
    self
  }

  /// Name of the program without its directory, e.g. `lipo` or `vcpkg`.
  pub fn program_name(&self) -> String {
    self
      .program
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_else(|| self.program.display().to_string())
  }

  /// Arguments as lossy UTF-8 strings, mostly useful for assertions.
  pub fn args_lossy(&self) -> Vec<String> {
    self.args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
  }
}

impl fmt::Display for Invocation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.program.display())?;
    for arg in &self.args {
      let arg = arg.to_string_lossy();
      if arg.contains(' ') {
        write!(f, " \"{}\"", arg)?;
      } else {
        write!(f, " {}", arg)?;
      }
    }
    Ok(())
  }
}

/// Runs external commands.
pub trait CommandRunner {
  /// Run the invocation to completion and return its trimmed stdout.
  fn run(&self, invocation: &Invocation) -> Result<String, RunError>;
}

/// Runs commands as real child processes.
///
/// The child inherits the parent environment; `Invocation::env` is layered on top.
/// Stderr is passed through so tool progress stays visible.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
  fn run(&self, invocation: &Invocation) -> Result<String, RunError> {
    let command_line = invocation.to_string();
    info!(cmd = %command_line, "executing command");

    let mut command = Command::new(&invocation.program);
    command.args(&invocation.args).envs(&invocation.env);
    if let Some(cwd) = &invocation.cwd {
      command.current_dir(cwd);
    }

    debug!(working_dir = ?invocation.cwd, "spawning process");

    let output = command.output().map_err(|source| RunError::Spawn {
      command: command_line.clone(),
      source,
    })?;

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(&output.stderr);

    if !stderr.is_empty() {
      debug!(stderr = %stderr, "command stderr");
    }
    if !stdout.is_empty() {
      debug!(stdout = %stdout, "command output");
    }

    if !output.status.success() {
      return Err(RunError::Failed {
        command: command_line,
        code: output.status.code(),
      });
    }

    Ok(stdout)
  }
}

/// Resolve `program` relative to `base` unless it is already absolute.
pub fn resolve_program(base: &Path, program: &Path) -> PathBuf {
  if program.is_absolute() { program.to_path_buf() } else { base.join(program) }
}
