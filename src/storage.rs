//! Document store for uploaded license documents.
//!
//! Documents are stored content-addressed under the configured root:
//! `<root>/sha256/<aa>/<bb>/<hex digest>`. The returned key
//! (`sha256:<hex digest>`) is what gets recorded on the business license.
//! Writing the same bytes twice is a no-op.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

const KEY_PREFIX: &str = "sha256:";

/// A document persisted in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    pub key: String,
    pub sha256: String,
    pub size: usize,
}

#[derive(Debug, Clone)]
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist `bytes` and return its key and digest.
    pub async fn put(&self, bytes: &[u8]) -> std::io::Result<StoredDocument> {
        let digest = hex::encode(Sha256::digest(bytes));
        let path = self.path_for_digest(&digest);

        if tokio::fs::try_exists(&path).await? {
            tracing::debug!(sha256 = %digest, "document already stored");
        } else {
            if let Some(dir) = path.parent() {
                tokio::fs::create_dir_all(dir).await?;
            }
            // Write to a temporary name first so readers never see a partial file.
            let tmp = path.with_extension(format!("tmp-{}", uuid::Uuid::new_v4()));
            tokio::fs::write(&tmp, bytes).await?;
            tokio::fs::rename(&tmp, &path).await?;
            tracing::info!(sha256 = %digest, size = bytes.len(), "document stored");
        }

        Ok(StoredDocument {
            key: format!("{KEY_PREFIX}{digest}"),
            sha256: digest,
            size: bytes.len(),
        })
    }

    /// Load a document by key. `Ok(None)` when the key is unknown or malformed.
    pub async fn get(&self, key: &str) -> std::io::Result<Option<Vec<u8>>> {
        let Some(digest) = parse_key(key) else {
            return Ok(None);
        };

        match tokio::fs::read(self.path_for_digest(digest)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn path_for_digest(&self, digest: &str) -> PathBuf {
        self.root
            .join("sha256")
            .join(&digest[0..2])
            .join(&digest[2..4])
            .join(digest)
    }
}

/// Extract the hex digest from a key, rejecting anything that is not exactly
/// 64 lowercase hex characters (keeps keys from escaping the store root).
fn parse_key(key: &str) -> Option<&str> {
    let digest = key.strip_prefix(KEY_PREFIX)?;
    let valid = digest.len() == 64
        && digest
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
    valid.then_some(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> DocumentStore {
        DocumentStore::new(std::env::temp_dir().join(format!("doc-store-{}", uuid::Uuid::new_v4())))
    }

    #[tokio::test]
    async fn put_then_get_returns_same_bytes() {
        let store = temp_store();
        let stored = store.put(b"%PDF-1.4 license").await.expect("stored");

        assert_eq!(stored.size, 16);
        assert_eq!(stored.key, format!("sha256:{}", stored.sha256));

        let loaded = store.get(&stored.key).await.expect("read");
        assert_eq!(loaded.as_deref(), Some(&b"%PDF-1.4 license"[..]));

        tokio::fs::remove_dir_all(store.root()).await.ok();
    }

    #[tokio::test]
    async fn identical_documents_share_a_key() {
        let store = temp_store();
        let first = store.put(b"same bytes").await.expect("stored");
        let second = store.put(b"same bytes").await.expect("stored");
        assert_eq!(first, second);

        tokio::fs::remove_dir_all(store.root()).await.ok();
    }

    #[tokio::test]
    async fn unknown_and_malformed_keys_are_absent() {
        let store = temp_store();
        let missing = format!("sha256:{}", "0".repeat(64));
        assert_eq!(store.get(&missing).await.expect("read"), None);
        assert_eq!(store.get("sha256:../../etc/passwd").await.expect("read"), None);
        assert_eq!(store.get("plain-key").await.expect("read"), None);
    }
}
