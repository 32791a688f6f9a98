//! Repository metadata used to name artifacts.
//!
//! The version is the nearest annotated tag reachable from HEAD that matches
//! the tag pattern, rendered like `git describe`: `v1.2.3` on the tagged
//! commit, `v1.2.3-4-gabc1234` when four commits are reachable from HEAD but
//! not from the tag. The branch is the short name of HEAD, or `HEAD` for a
//! detached checkout.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use gix::ObjectId;
use gix::object::Kind;
use thiserror::Error;
use tracing::debug;

use crate::config::GitConfig;
use crate::consts::DETACHED_HEAD;

/// Errors that can occur while reading repository metadata.
#[derive(Debug, Error)]
pub enum GitError {
  #[error("failed to open repository at '{path}': {source}")]
  Open {
    path: String,
    #[source]
    source: Box<gix::discover::Error>,
  },

  #[error("invalid tag pattern '{pattern}': {message}")]
  Pattern { pattern: String, message: String },

  #[error("failed to read references: {0}")]
  References(String),

  #[error("failed to resolve HEAD: {0}")]
  ResolveHead(String),

  #[error("failed to walk history: {0}")]
  Walk(String),

  #[error("no tag matching '{pattern}' is reachable from HEAD")]
  NoMatchingTag { pattern: String },
}

/// Version and branch derived once per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoInfo {
  pub version: String,
  pub branch: String,
}

impl RepoInfo {
  pub fn new(version: impl Into<String>, branch: impl Into<String>) -> Self {
    Self {
      version: version.into(),
      branch: branch.into(),
    }
  }

  /// Read version and branch from the repository containing `path`.
  pub fn detect(path: &Path, config: &GitConfig) -> Result<Self, GitError> {
    let repo = gix::discover(path).map_err(|e| GitError::Open {
      path: path.display().to_string(),
      source: Box::new(e),
    })?;

    let info = Self {
      version: describe(&repo, &config.tag_pattern, config.lightweight_tags)?,
      branch: head_branch(&repo)?,
    };
    debug!(version = %info.version, branch = %info.branch, "detected repository info");
    Ok(info)
  }

  /// A detached HEAD usually means a tag build.
  pub fn is_detached(&self) -> bool {
    self.branch == DETACHED_HEAD
  }
}

/// Short name of the checked-out branch, or `HEAD` when detached.
pub fn head_branch(repo: &gix::Repository) -> Result<String, GitError> {
  let name = repo.head_name().map_err(|e| GitError::ResolveHead(e.to_string()))?;
  Ok(match name {
    Some(name) => name.shorten().to_string(),
    None => DETACHED_HEAD.to_string(),
  })
}

/// Describe HEAD relative to the nearest tag matching `pattern`.
///
/// The distance to a tag is the number of commits reachable from HEAD but not
/// from the tagged commit. The tag with the smallest distance wins, ties going
/// to the greatest name.
pub fn describe(repo: &gix::Repository, pattern: &str, lightweight: bool) -> Result<String, GitError> {
  let matcher = glob::Pattern::new(pattern).map_err(|e| GitError::Pattern {
    pattern: pattern.to_string(),
    message: e.to_string(),
  })?;

  let tags = matching_tags(repo, &matcher, lightweight)?;

  let head = repo.head_id().map_err(|e| GitError::ResolveHead(e.to_string()))?.detach();
  let reachable = ancestry(repo, head)?;

  let mut best: Option<(usize, &str)> = None;
  for (commit, names) in &tags {
    if !reachable.contains(commit) {
      continue;
    }
    // The tag's history is a subset of HEAD's.
    let distance = reachable.len() - ancestry(repo, *commit)?.len();
    let name = names.iter().max().map(String::as_str).unwrap_or_default();
    let better = match best {
      None => true,
      Some((d, n)) => distance < d || (distance == d && name > n),
    };
    if better {
      best = Some((distance, name));
    }
  }

  match best {
    Some((distance, tag)) => {
      debug!(tag, distance, "described HEAD");
      let abbrev = head.to_hex_with_len(7).to_string();
      Ok(format_description(tag, distance, &abbrev))
    }
    None => Err(GitError::NoMatchingTag {
      pattern: pattern.to_string(),
    }),
  }
}

/// Every commit reachable from `tip`, including `tip`.
fn ancestry(repo: &gix::Repository, tip: ObjectId) -> Result<HashSet<ObjectId>, GitError> {
  let walk = repo.rev_walk([tip]).all().map_err(|e| GitError::Walk(e.to_string()))?;
  walk
    .map(|info| info.map(|info| info.id).map_err(|e| GitError::Walk(e.to_string())))
    .collect()
}

/// Commits carrying a matching tag, with all matching tag names per commit.
///
/// Only annotated tags count unless `lightweight` is set.
fn matching_tags(
  repo: &gix::Repository,
  matcher: &glob::Pattern,
  lightweight: bool,
) -> Result<HashMap<ObjectId, Vec<String>>, GitError> {
  let platform = repo.references().map_err(|e| GitError::References(e.to_string()))?;
  let iter = platform.tags().map_err(|e| GitError::References(e.to_string()))?;

  let mut tags: HashMap<ObjectId, Vec<String>> = HashMap::new();
  for reference in iter {
    let mut reference = reference.map_err(|e| GitError::References(e.to_string()))?;
    let name = reference.name().shorten().to_string();
    if !matcher.matches(&name) {
      continue;
    }

    if !lightweight {
      let Some(target) = reference.target().try_id().map(ObjectId::from) else {
        continue;
      };
      let object = repo
        .find_object(target)
        .map_err(|e| GitError::References(e.to_string()))?;
      if object.kind != Kind::Tag {
        debug!(tag = %name, "skipping lightweight tag");
        continue;
      }
    }

    // Annotated tags peel to the tagged commit.
    let id = reference
      .peel_to_id_in_place()
      .map_err(|e| GitError::References(e.to_string()))?
      .detach();
    tags.entry(id).or_default().push(name);
  }

  Ok(tags)
}

/// Render a describe result: the bare tag on the tagged commit, otherwise
/// `<tag>-<distance>-g<abbrev>`.
pub fn format_description(tag: &str, distance: usize, abbrev: &str) -> String {
  if distance == 0 {
    tag.to_string()
  } else {
    format!("{}-{}-g{}", tag, distance, abbrev)
  }
}
