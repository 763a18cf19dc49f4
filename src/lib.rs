//! # colorlens
//!
//! Helps color-vision-deficient viewers in two independent ways:
//! - [`processor::colorize`] enhances saturation and moves the red and green
//!   hue bands to purple and cyan, keeping the image size unchanged.
//! - [`summary::summarize`] clusters an image into its dominant colors and
//!   gives each a readable name and hex code.
//!
//! Both are pure functions of the decoded image. [`ColorLens`] wraps them
//! with upload/result storage and a processing history.

pub mod config;
pub mod db;
pub mod enhance;
pub mod error;
pub mod hsv;
pub mod labeler;
pub mod processor;
pub mod quantizer;
pub mod remap;
pub mod storage;
pub mod summary;

use image::RgbImage;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

pub use config::LensConfig;
pub use db::{HistoryEntry, HistoryStore};
pub use error::{LensError, Result};
pub use labeler::{ColorCategory, LabeledColor};
pub use processor::{colorize, TransformSettings};
pub use storage::ResultStore;
pub use summary::{summarize, summarize_colors, ColorSummary, SummarySettings};

/// Output of both pipelines for one image
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Colorized image, PNG encoded
    pub png: Vec<u8>,
    pub summary: ColorSummary,
}

/// Run the colorize and summary pipelines side by side on one image
pub fn analyze(img: &RgbImage, config: &LensConfig) -> Result<Analysis> {
    let (png, summary) = rayon::join(
        || processor::colorize_to_png(img, &config.transform, config.min_encoded_bytes),
        || summary::summarize(img, &config.summary),
    );
    Ok(Analysis {
        png: png?,
        summary: summary?,
    })
}

/// Upload processing with stored results and history
#[derive(Clone)]
pub struct ColorLens {
    config: Arc<LensConfig>,
    results: ResultStore,
    history: HistoryStore,
}

impl ColorLens {
    pub fn new(config: LensConfig) -> Result<Self> {
        config.validate()?;

        let results = ResultStore::open(&config)?;
        let history = match &config.database {
            Some(path) => HistoryStore::new(path)?,
            None => HistoryStore::in_memory()?,
        };

        Ok(Self {
            config: Arc::new(config),
            results,
            history,
        })
    }

    pub fn config(&self) -> &LensConfig {
        &self.config
    }

    /// Where the colorized image of a history entry is stored
    pub fn result_path(&self, entry: &HistoryEntry) -> PathBuf {
        self.results.result_path(&entry.result_file)
    }

    /// Decode, colorize, summarize and record one uploaded image
    pub async fn process_upload(&self, filename: String, bytes: Vec<u8>) -> Result<HistoryEntry> {
        let lens = self.clone();

        tokio::task::spawn_blocking(move || lens.process_upload_blocking(&filename, &bytes))
            .await
            .map_err(|e| LensError::Processing(format!("Task join error: {}", e)))?
    }

    /// Colorize uploaded bytes without storing anything
    pub async fn colorize_bytes(&self, bytes: Vec<u8>) -> Result<Vec<u8>> {
        let config = self.config.clone();

        tokio::task::spawn_blocking(move || {
            let img = processor::decode_image(&bytes)?;
            processor::colorize_to_png(&img, &config.transform, config.min_encoded_bytes)
        })
        .await
        .map_err(|e| LensError::Processing(format!("Task join error: {}", e)))?
    }

    /// Summarize uploaded bytes without storing anything
    pub async fn summarize_bytes(&self, bytes: Vec<u8>) -> Result<ColorSummary> {
        let config = self.config.clone();

        tokio::task::spawn_blocking(move || {
            let img = processor::decode_image(&bytes)?;
            summary::summarize(&img, &config.summary)
        })
        .await
        .map_err(|e| LensError::Processing(format!("Task join error: {}", e)))?
    }

    /// Processed uploads, newest first
    pub async fn history(&self) -> Result<Vec<HistoryEntry>> {
        let history = self.history.clone();

        tokio::task::spawn_blocking(move || history.list_entries())
            .await
            .map_err(|e| LensError::Processing(format!("Task join error: {}", e)))?
    }

    fn process_upload_blocking(&self, filename: &str, bytes: &[u8]) -> Result<HistoryEntry> {
        let started = Instant::now();

        // Reject undecodable uploads before anything is written
        let img = processor::decode_image(bytes)?;
        self.results.save_upload(filename, bytes)?;

        let analysis = analyze(&img, &self.config)?;
        let result_file = self.results.save_result(&analysis.png)?;

        let entry = HistoryEntry {
            id: storage::fresh_id(),
            original_filename: filename.to_string(),
            result_file,
            source_hash: storage::hash_bytes(bytes),
            created_at: storage::now_iso(),
            colors: analysis.summary.colors,
            degenerate: analysis.summary.degenerate,
        };
        self.history.add_entry(&entry)?;

        tracing::info!(
            id = %entry.id,
            file = %filename,
            width = img.width(),
            height = img.height(),
            colors = entry.colors.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "processed upload"
        );
        Ok(entry)
    }
}
