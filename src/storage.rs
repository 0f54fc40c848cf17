use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use uuid::Uuid;

/// Metadata for a stored upload; this is all the document registry ever
/// sees of the file.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub path: String,
    pub size_bytes: i64,
}

#[async_trait]
pub trait FileStore: Send + Sync + 'static {
    async fn save(&self, original_name: &str, bytes: Vec<u8>) -> Result<StoredFile>;
}

/// Local-disk store. Stored names are prefixed with a fresh UUID so
/// repeated uploads of the same filename never collide.
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl FileStore for DiskStore {
    async fn save(&self, original_name: &str, bytes: Vec<u8>) -> Result<StoredFile> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .context("failed to create upload directory")?;

        let stored_name = format!("{}-{}", Uuid::new_v4(), sanitize_filename(original_name));
        let path = self.root.join(&stored_name);
        let size_bytes = bytes.len() as i64;

        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("failed to write upload {stored_name}"))?;

        Ok(StoredFile {
            path: path.to_string_lossy().replace('\\', "/"),
            size_bytes,
        })
    }
}

fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => ch,
        })
        .collect();

    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}
