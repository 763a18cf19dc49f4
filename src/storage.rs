//! On-disk storage for uploads and colorized results
//!
//! Layout under the storage root:
//! - `uploads/` - original files, `<id>_<name>`
//! - `results/` - colorized PNGs, `<id>.png`

use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use crate::config::LensConfig;
use crate::error::{LensError, Result};

#[derive(Debug, Clone)]
pub struct ResultStore {
    uploads_dir: PathBuf,
    results_dir: PathBuf,
    min_encoded_bytes: usize,
}

impl ResultStore {
    /// Open the store under `config.storage_dir`, creating both directories if needed
    pub fn open(config: &LensConfig) -> Result<Self> {
        let uploads_dir = config.uploads_dir();
        let results_dir = config.results_dir();
        fs::create_dir_all(&uploads_dir)?;
        fs::create_dir_all(&results_dir)?;
        Ok(Self {
            uploads_dir,
            results_dir,
            min_encoded_bytes: config.min_encoded_bytes,
        })
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    /// Store an upload under a fresh id, returning its path
    pub fn save_upload(&self, original_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self
            .uploads_dir
            .join(format!("{}_{}", fresh_id(), sanitize_filename(original_name)));
        fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Store an encoded result under a fresh id, returning the file name
    ///
    /// The written file is checked again on disk so a truncated write is
    /// reported instead of handed out. A file that fails the check is removed.
    pub fn save_result(&self, png: &[u8]) -> Result<String> {
        let filename = format!("{}.png", fresh_id());
        let path = self.results_dir.join(&filename);
        fs::write(&path, png)?;

        let size = fs::metadata(&path)?.len() as usize;
        if size < self.min_encoded_bytes {
            fs::remove_file(&path)?;
            return Err(LensError::EncodeIntegrity {
                size,
                minimum: self.min_encoded_bytes,
            });
        }
        Ok(filename)
    }

    /// Full path of a stored result
    pub fn result_path(&self, filename: &str) -> PathBuf {
        self.results_dir.join(filename)
    }
}

// ============================================================================
// UTILITY FUNCTIONS
// ============================================================================

/// Random 128-bit identifier as 32 lowercase hex characters
pub fn fresh_id() -> String {
    format!("{:032x}", rand::random::<u128>())
}

/// Calculate SHA-256 hash of bytes
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Get current timestamp as ISO 8601 string
pub fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Keep only the last path component and replace separators
fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let safe = base.replace(':', "_");
    if safe.is_empty() || safe == "." || safe == ".." {
        "upload".to_string()
    } else {
        safe
    }
}
