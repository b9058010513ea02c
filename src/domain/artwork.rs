use std::path::PathBuf;
use serde::{Serialize, Deserialize};

/// Exactly one of `path`/`blob` is populated: artwork discovered as a
/// sibling file on disk is referenced by path; artwork extracted from an
/// embedded tag is stored as a blob, deduplicated by `blob_hash`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artwork {
    id: i64,
    path: Option<PathBuf>,
    blob: Option<Vec<u8>>,
    blob_hash: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

impl Artwork {
    pub fn from_path(id: i64, path: PathBuf, width: Option<u32>, height: Option<u32>) -> Self {
        Self { id, path: Some(path), blob: None, blob_hash: None, width, height }
    }

    pub fn from_blob(id: i64, blob: Vec<u8>, blob_hash: String, width: Option<u32>, height: Option<u32>) -> Self {
        Self { id, path: None, blob: Some(blob), blob_hash: Some(blob_hash), width, height }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }

    pub fn blob(&self) -> Option<&[u8]> {
        self.blob.as_deref()
    }

    pub fn blob_hash(&self) -> Option<&str> {
        self.blob_hash.as_deref()
    }

    pub fn width(&self) -> Option<u32> {
        self.width
    }

    pub fn height(&self) -> Option<u32> {
        self.height
    }
}
