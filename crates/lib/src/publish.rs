//! Uploading archives to object storage.
//!
//! Two destinations exist in the bucket:
//!
//! ```text
//! branches/<branch>/<file>     # every branch build
//! archive/<version>/<file>     # tag builds (detached HEAD)
//! download/<file>              # published, public-read
//! ```
//!
//! The store itself sits behind [`ObjectStore`]; [`SpacesStore`] talks to
//! DigitalOcean Spaces (or any S3-compatible endpoint) with `aws-sdk-s3`.

use std::path::Path;

use aws_sdk_s3::config::{BehaviorVersion, Credentials as AwsCredentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use thiserror::Error;
use tracing::info;

use crate::config::SpacesConfig;
use crate::consts::DETACHED_HEAD;

#[derive(Debug, Error)]
pub enum PublishError {
  #[error("need spaces key")]
  MissingKey,

  #[error("need spaces secret")]
  MissingSecret,

  #[error("archive to upload does not exist: {0}")]
  FileMissing(String),

  #[error("failed to create async runtime: {0}")]
  Runtime(#[source] std::io::Error),

  #[error("failed to upload {bucket}/{key}: {message}")]
  Upload { bucket: String, key: String, message: String },

  #[error("failed to set ACL on {bucket}/{key}: {message}")]
  Acl { bucket: String, key: String, message: String },
}

/// Access key pair for the object store.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
  pub key: String,
  pub secret: String,
}

impl std::fmt::Debug for Credentials {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Credentials")
      .field("key", &self.key)
      .field("secret", &"<redacted>")
      .finish()
  }
}

impl Credentials {
  /// Both parts must be present and non-empty.
  pub fn from_parts(key: Option<&str>, secret: Option<&str>) -> Result<Self, PublishError> {
    let key = key.filter(|k| !k.is_empty()).ok_or(PublishError::MissingKey)?;
    let secret = secret.filter(|s| !s.is_empty()).ok_or(PublishError::MissingSecret)?;
    Ok(Self {
      key: key.to_string(),
      secret: secret.to_string(),
    })
  }
}

/// Object key for a branch or tag build upload.
pub fn upload_key(branch: &str, version: &str, file_name: &str) -> String {
  if branch == DETACHED_HEAD {
    format!("archive/{}/{}", version, file_name)
  } else {
    format!("branches/{}/{}", branch, file_name)
  }
}

/// Object key for a published download.
pub fn publish_key(file_name: &str) -> String {
  format!("download/{}", file_name)
}

/// An S3-like object store.
pub trait ObjectStore {
  fn upload_file(&self, local: &Path, bucket: &str, key: &str) -> Result<(), PublishError>;

  fn set_public_read(&self, bucket: &str, key: &str) -> Result<(), PublishError>;
}

/// DigitalOcean Spaces client.
///
/// Owns a current-thread tokio runtime so callers stay synchronous.
pub struct SpacesStore {
  client: aws_sdk_s3::Client,
  runtime: tokio::runtime::Runtime,
}

impl SpacesStore {
  pub fn new(config: &SpacesConfig, credentials: &Credentials) -> Result<Self, PublishError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
      .enable_all()
      .build()
      .map_err(PublishError::Runtime)?;

    let s3_config = aws_sdk_s3::Config::builder()
      .behavior_version(BehaviorVersion::latest())
      .endpoint_url(&config.endpoint)
      .region(Region::new(config.region.clone()))
      .credentials_provider(AwsCredentials::new(
        credentials.key.clone(),
        credentials.secret.clone(),
        None,
        None,
        "juce-dist",
      ))
      .force_path_style(config.force_path_style)
      .build();

    Ok(Self {
      client: aws_sdk_s3::Client::from_conf(s3_config),
      runtime,
    })
  }
}

impl ObjectStore for SpacesStore {
  fn upload_file(&self, local: &Path, bucket: &str, key: &str) -> Result<(), PublishError> {
    let upload_err = |message: String| PublishError::Upload {
      bucket: bucket.to_string(),
      key: key.to_string(),
      message,
    };

    self.runtime.block_on(async {
      let body = ByteStream::from_path(local).await.map_err(|e| upload_err(e.to_string()))?;
      self
        .client
        .put_object()
        .bucket(bucket)
        .key(key)
        .body(body)
        .send()
        .await
        .map_err(|e| upload_err(DisplayErrorContext(&e).to_string()))?;
      Ok(())
    })
  }

  fn set_public_read(&self, bucket: &str, key: &str) -> Result<(), PublishError> {
    self.runtime.block_on(async {
      self
        .client
        .put_object_acl()
        .bucket(bucket)
        .key(key)
        .acl(ObjectCannedAcl::PublicRead)
        .send()
        .await
        .map_err(|e| PublishError::Acl {
          bucket: bucket.to_string(),
          key: key.to_string(),
          message: DisplayErrorContext(&e).to_string(),
        })?;
      Ok(())
    })
  }
}

fn file_name(archive: &Path) -> Result<String, PublishError> {
  if !archive.is_file() {
    return Err(PublishError::FileMissing(archive.display().to_string()));
  }
  archive
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .ok_or_else(|| PublishError::FileMissing(archive.display().to_string()))
}

/// Upload a build's archive to its branch or tag location. Returns the key.
pub fn upload_archive(
  store: &dyn ObjectStore,
  bucket: &str,
  archive: &Path,
  branch: &str,
  version: &str,
) -> Result<String, PublishError> {
  let key = upload_key(branch, version, &file_name(archive)?);
  store.upload_file(archive, bucket, &key)?;
  info!(bucket, key = %key, "uploaded artifacts");
  Ok(key)
}

/// Upload an archive to the public download location. Returns the key.
pub fn publish_archive(store: &dyn ObjectStore, bucket: &str, archive: &Path) -> Result<String, PublishError> {
  let key = publish_key(&file_name(archive)?);
  store.upload_file(archive, bucket, &key)?;
  store.set_public_read(bucket, &key)?;
  info!(bucket, key = %key, "published artifacts");
  Ok(key)
}
