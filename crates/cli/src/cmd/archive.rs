//! Implementation of the `juce-dist archive-and-upload` command.
//!
//! Without flags this joins the macOS and Windows builds and writes the
//! archive plus `dist.json`. `--upload` additionally pushes the archive to
//! its branch or version folder. `--publish` skips all of that and makes the
//! archive recorded in `dist.json` publicly downloadable.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;

use juce_dist_lib::pipeline::{ArchiveInputs, archive_and_upload, publish_from_pointer};
use juce_dist_lib::publish::{Credentials, ObjectStore, SpacesStore};

use super::{GlobalArgs, absolute};
use crate::output::{format_bytes, format_duration, print_info, print_stat, print_success, truncate_hash};

#[derive(Debug, Args)]
pub struct ArchiveArgs {
  /// The folder to assemble and archive in
  #[arg(long, default_value = "build-dist")]
  pub path_to_build: PathBuf,

  /// Path to the macOS build
  #[arg(long, default_value = "build-macos")]
  pub path_to_build_macos: PathBuf,

  /// Path to the Windows build
  #[arg(long, default_value = "build-windows")]
  pub path_to_build_windows: PathBuf,

  /// Build number recorded with the artifact
  #[arg(long, default_value = "0")]
  pub build_number: String,

  /// Upload the archive to Spaces
  #[arg(long)]
  pub upload: bool,

  /// Publish the archive recorded in dist.json
  #[arg(long)]
  pub publish: bool,

  /// Access key for Spaces
  #[arg(long, env = "SPACES_KEY", hide_env_values = true)]
  pub spaces_key: Option<String>,

  /// Secret for Spaces
  #[arg(long, env = "SPACES_SECRET", hide_env_values = true)]
  pub spaces_secret: Option<String>,
}

pub fn cmd_archive_and_upload(global: &GlobalArgs, args: &ArchiveArgs) -> Result<()> {
  let start = Instant::now();

  // Fail on missing credentials before doing any work.
  let credentials = if args.upload || args.publish {
    Some(Credentials::from_parts(
      args.spaces_key.as_deref(),
      args.spaces_secret.as_deref(),
    )?)
  } else {
    None
  };

  let ctx = global.context(&args.path_to_build, &args.build_number)?;
  let spaces = &ctx.config.spaces;

  let store = match &credentials {
    Some(credentials) => Some(SpacesStore::new(spaces, credentials).context("Failed to create Spaces client")?),
    None => None,
  };
  let store = store.as_ref().map(|s| s as &dyn ObjectStore);

  if args.publish {
    let store = store.context("Publishing needs Spaces credentials")?;
    let (pointer, key) = publish_from_pointer(&ctx, store).context("Publish failed")?;

    println!();
    print_success("Published artifacts");
    print_stat("Version", &pointer.version);
    print_stat("Build number", &pointer.build_number);
    print_stat("URL", &format!("{}/{}/{}", spaces.endpoint, spaces.bucket, key));
    return Ok(());
  }

  let inputs = ArchiveInputs {
    macos_build: absolute(&args.path_to_build_macos)?,
    windows_build: absolute(&args.path_to_build_windows)?,
  };
  let summary = archive_and_upload(&ctx, &inputs, store).context("Archive failed")?;

  println!();
  print_success(&format!("Created {}", ctx.archive_name()));
  print_stat("Version", &ctx.repo.version);
  print_stat("Build number", &ctx.build_number);
  print_stat("Archive", &summary.archive.path.display().to_string());
  print_stat("Entries", &summary.archive.entries.to_string());
  print_stat("Size", &format_bytes(summary.archive.size));
  print_stat("SHA-256", truncate_hash(&summary.archive.sha256.0));
  match &summary.uploaded {
    Some(key) => print_stat("Uploaded", &format!("{}/{}", spaces.bucket, key)),
    None => print_info("Not uploaded (pass --upload to push to Spaces)"),
  }
  print_stat("Duration", &format_duration(start.elapsed()));

  Ok(())
}
