use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

use crate::application::ports::{BlobInfo, BlobStore, BlobStoreError};

/// Blob store on the local filesystem, one directory per bucket under
/// `base_path`, keys mapped to relative paths.
pub struct LocalBlobStore {
    base_path: PathBuf,
}

impl LocalBlobStore {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, BlobStoreError> {
        validate_segment(bucket)?;
        if key.is_empty() || key.ends_with('/') {
            return Err(BlobStoreError::InvalidKey(key.to_string()));
        }
        let relative = Path::new(key);
        if !relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
        {
            return Err(BlobStoreError::InvalidKey(key.to_string()));
        }
        Ok(self.base_path.join(bucket).join(relative))
    }
}

fn validate_segment(bucket: &str) -> Result<(), BlobStoreError> {
    if bucket.is_empty() || bucket.contains(['/', '\\']) || bucket == "." || bucket == ".." {
        return Err(BlobStoreError::InvalidKey(format!("bucket {}", bucket)));
    }
    Ok(())
}

fn io_error(key: &str, e: std::io::Error) -> BlobStoreError {
    if e.kind() == ErrorKind::NotFound {
        BlobStoreError::NotFound(key.to_string())
    } else {
        BlobStoreError::Io(format!("{}: {}", key, e))
    }
}

async fn ensure_parent(path: &Path) -> Result<(), BlobStoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| BlobStoreError::Io(e.to_string()))?;
    }
    Ok(())
}

/// Writes through a sibling temp file so readers never see a partial object.
async fn write_atomically(path: &Path, data: &[u8]) -> Result<(), BlobStoreError> {
    ensure_parent(path).await?;
    let mut staging = path.as_os_str().to_owned();
    staging.push(format!(".part-{}", Uuid::new_v4()));
    let staging = PathBuf::from(staging);

    fs::write(&staging, data)
        .await
        .map_err(|e| BlobStoreError::Io(e.to_string()))?;
    if let Err(e) = fs::rename(&staging, path).await {
        let _ = fs::remove_file(&staging).await;
        return Err(BlobStoreError::Io(e.to_string()));
    }
    Ok(())
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: &[u8],
        _content_type: Option<&str>,
    ) -> Result<(), BlobStoreError> {
        let path = self.object_path(bucket, key)?;
        write_atomically(&path, data).await
    }

    async fn stat(&self, bucket: &str, key: &str) -> Result<BlobInfo, BlobStoreError> {
        let path = self.object_path(bucket, key)?;
        let metadata = fs::metadata(&path).await.map_err(|e| io_error(key, e))?;
        if !metadata.is_file() {
            return Err(BlobStoreError::NotFound(key.to_string()));
        }
        Ok(BlobInfo {
            key: key.to_string(),
            size: metadata.len(),
        })
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, BlobStoreError> {
        let path = self.object_path(bucket, key)?;
        fs::read(&path).await.map_err(|e| io_error(key, e))
    }

    async fn copy(&self, bucket: &str, from: &str, to: &str) -> Result<(), BlobStoreError> {
        let source = self.object_path(bucket, from)?;
        let target = self.object_path(bucket, to)?;
        let data = fs::read(&source).await.map_err(|e| io_error(from, e))?;
        write_atomically(&target, &data).await
    }

    async fn remove(&self, bucket: &str, key: &str) -> Result<(), BlobStoreError> {
        let path = self.object_path(bucket, key)?;
        fs::remove_file(&path).await.map_err(|e| io_error(key, e))
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<BlobInfo>, BlobStoreError> {
        validate_segment(bucket)?;
        let root = self.base_path.join(bucket);
        let mut pending = vec![root.clone()];
        let mut found = Vec::new();

        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(BlobStoreError::Io(e.to_string())),
            };
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| BlobStoreError::Io(e.to_string()))?
            {
                let path = entry.path();
                let metadata = entry
                    .metadata()
                    .await
                    .map_err(|e| BlobStoreError::Io(e.to_string()))?;
                if metadata.is_dir() {
                    pending.push(path);
                    continue;
                }

                let Ok(relative) = path.strip_prefix(&root) else {
                    continue;
                };
                let key = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                if key.contains(".part-") {
                    continue;
                }
                if key.starts_with(prefix) {
                    found.push(BlobInfo {
                        key,
                        size: metadata.len(),
                    });
                }
            }
        }

        found.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(found)
    }
}
