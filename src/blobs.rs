//! Image storage behind a capability interface, so the mutation service never
//! touches the filesystem directly.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::error::{AppError, AppResult};

pub trait BlobStore: Send + Sync {
    fn put(&self, key: &str, bytes: &[u8]) -> AppResult<()>;
    fn get(&self, key: &str) -> AppResult<Option<Vec<u8>>>;
    /// Deleting a missing blob is not an error.
    fn delete(&self, key: &str) -> AppResult<()>;
}

/// Flat directory of image files.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> AppResult<PathBuf> {
        // Keys are flat file names; anything path-like is rejected.
        if key.is_empty() || key.contains('/') || key.contains('\\') || key.contains("..") {
            return Err(AppError::Storage(format!("invalid blob key: {}", key)));
        }
        Ok(self.root.join(key))
    }
}

impl BlobStore for FsBlobStore {
    fn put(&self, key: &str, bytes: &[u8]) -> AppResult<()> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.root).map_err(|e| AppError::Storage(e.to_string()))?;
        std::fs::write(path, bytes).map_err(|e| AppError::Storage(e.to_string()))
    }

    fn get(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match std::fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Storage(e.to_string())),
        }
    }

    fn delete(&self, key: &str) -> AppResult<()> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(e.to_string())),
        }
    }
}

/// In-memory store for tests.
#[derive(Default)]
pub struct MemBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.blobs.lock().unwrap().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BlobStore for MemBlobStore {
    fn put(&self, key: &str, bytes: &[u8]) -> AppResult<()> {
        self.blobs
            .lock()
            .unwrap()
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        Ok(self.blobs.lock().unwrap().get(key).cloned())
    }

    fn delete(&self, key: &str) -> AppResult<()> {
        self.blobs.lock().unwrap().remove(key);
        Ok(())
    }
}

/// A decoded `data:image/<fmt>;base64,` payload.
#[derive(Debug, PartialEq, Eq)]
pub struct DecodedImage {
    pub format: String,
    pub bytes: Vec<u8>,
}

/// Parse and decode a base64 image data URL. Anything that does not match the
/// `data:image/<fmt>;base64,` framing is a validation failure, not an
/// internal error.
pub fn decode_data_url(input: &str) -> AppResult<DecodedImage> {
    let rest = input
        .strip_prefix("data:image/")
        .ok_or_else(|| AppError::Validation("invalid image data URL".into()))?;
    let (format, data) = rest
        .split_once(";base64,")
        .ok_or_else(|| AppError::Validation("invalid image data URL".into()))?;
    if format.is_empty() || !format.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AppError::Validation("invalid image format".into()));
    }
    let bytes = BASE64
        .decode(data.trim())
        .map_err(|e| AppError::Validation(format!("invalid base64 image data: {}", e)))?;
    Ok(DecodedImage {
        format: format.to_string(),
        bytes,
    })
}

/// Deterministic blob name for a user's avatar.
pub fn avatar_key(username: &str, format: &str) -> String {
    format!("{}.{}", username, format)
}

/// Deterministic blob name for a post image.
pub fn post_image_key(username: &str, post_id: i64, format: &str) -> String {
    format!("{}Post{}.{}", username, post_id, format)
}
