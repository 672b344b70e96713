use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, warn};

use crate::error::{GatewayError, Result};

const BUCKET_META: &str = ".bucket.json";

/// Settings a bucket is created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketOptions {
    pub public: bool,
    pub file_size_limit: Option<u64>,
}

/// On-disk object storage.
///
/// Each bucket is a directory under `dir`; objects live at
/// `{dir}/{bucket}/{object path}`.
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Object storage directory: {}", dir.display());
        Ok(Self { dir })
    }

    pub async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        let meta = self.bucket_dir(bucket)?.join(BUCKET_META);
        Ok(fs::try_exists(meta).await?)
    }

    pub async fn create_bucket(&self, bucket: &str, options: BucketOptions) -> Result<()> {
        if self.bucket_exists(bucket).await? {
            return Err(GatewayError::Duplicate);
        }
        let dir = self.bucket_dir(bucket)?;
        fs::create_dir_all(&dir).await?;
        let meta = serde_json::to_vec(&options).map_err(anyhow::Error::from)?;
        fs::write(dir.join(BUCKET_META), meta).await?;
        info!("Created bucket {} (public: {})", bucket, options.public);
        Ok(())
    }

    pub async fn bucket_options(&self, bucket: &str) -> Result<BucketOptions> {
        let meta = self.bucket_dir(bucket)?.join(BUCKET_META);
        let bytes = match fs::read(&meta).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(GatewayError::NotFound("Bucket"));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes).map_err(anyhow::Error::from)?)
    }

    /// Write a new object. Existing objects are never overwritten.
    pub async fn upload(&self, bucket: &str, path: &str, data: &[u8]) -> Result<()> {
        let options = self.bucket_options(bucket).await?;
        if let Some(limit) = options.file_size_limit {
            if data.len() as u64 > limit {
                return Err(GatewayError::PayloadTooLarge { size: data.len(), limit });
            }
        }

        let target = self.object_path(bucket, path)?;
        if fs::try_exists(&target).await? {
            return Err(GatewayError::Duplicate);
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&target, data).await?;
        info!("Stored {}/{} ({} bytes)", bucket, path, data.len());
        Ok(())
    }

    /// Remove objects; missing objects are skipped.
    pub async fn remove(&self, bucket: &str, paths: &[String]) -> Result<usize> {
        let mut removed = 0;
        for path in paths {
            let target = self.object_path(bucket, path)?;
            match fs::remove_file(&target).await {
                Ok(()) => {
                    info!("Deleted object {}/{}", bucket, path);
                    removed += 1;
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    warn!("Object {}/{} already gone", bucket, path);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(removed)
    }

    pub async fn object_exists(&self, bucket: &str, path: &str) -> Result<bool> {
        Ok(fs::try_exists(self.object_path(bucket, path)?).await?)
    }

    /// Location of an object on disk. Rejects anything that could escape the bucket.
    pub fn object_path(&self, bucket: &str, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let valid = !path.is_empty()
            && relative.components().all(|c| match c {
                Component::Normal(part) => !part.to_string_lossy().starts_with('.'),
                _ => false,
            });
        if !valid {
            return Err(GatewayError::InvalidInput(format!("invalid object path: {path}")));
        }
        Ok(self.bucket_dir(bucket)?.join(relative))
    }

    fn bucket_dir(&self, bucket: &str) -> Result<PathBuf> {
        let valid = !bucket.is_empty()
            && bucket
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(GatewayError::InvalidInput(format!("invalid bucket name: {bucket}")));
        }
        Ok(self.dir.join(bucket))
    }
}
