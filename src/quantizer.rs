//! Dominant color clustering
//!
//! The image is first resampled to a small fixed grid (120x120 by default),
//! trading exact coverage statistics for speed; it can shift how much weight
//! a thin feature gets, but not which colors dominate. k-means then runs
//! `n_init` times from seeded k-means++ starts and the run with the lowest
//! inertia is kept. Cluster order is whatever the winning run produced.

use image::imageops::{self, FilterType};
use image::RgbImage;
use kmeans_colors::{get_kmeans, Calculate, Kmeans};
use palette::Srgb;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use crate::error::{LensError, Result};

/// Largest `k` supported; cluster indices are stored as `u8`
pub const MAX_CLUSTERS: usize = 255;

// ============================================================================
// SETTINGS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resample {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<Resample> for FilterType {
    fn from(value: Resample) -> Self {
        match value {
            Resample::Nearest => FilterType::Nearest,
            Resample::Triangle => FilterType::Triangle,
            Resample::CatmullRom => FilterType::CatmullRom,
            Resample::Gaussian => FilterType::Gaussian,
            Resample::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuantizerSettings {
    /// Width of the sampling grid (default: 120)
    pub sample_width: u32,
    /// Height of the sampling grid (default: 120)
    pub sample_height: u32,
    /// Resampling filter used to build the grid (default: catmullrom)
    pub resample: Resample,
    /// Number of k-means restarts (default: 10)
    pub n_init: usize,
    /// Iteration cap per restart (default: 300)
    pub max_iter: usize,
    /// Convergence threshold on centroid movement (default: 1e-4)
    pub converge: f32,
    /// Seed of the first restart; restart `i` uses `seed + i` (default: 0)
    pub seed: u64,
}

impl Default for QuantizerSettings {
    fn default() -> Self {
        Self {
            sample_width: 120,
            sample_height: 120,
            resample: Resample::CatmullRom,
            n_init: 10,
            max_iter: 300,
            converge: 1e-4,
            seed: 0,
        }
    }
}

impl QuantizerSettings {
    pub fn validate(&self) -> Result<()> {
        if self.sample_width == 0 || self.sample_height == 0 {
            return Err(LensError::InvalidParameter(format!(
                "sample grid must be non-empty, got {}x{}",
                self.sample_width, self.sample_height
            )));
        }
        if self.n_init == 0 {
            return Err(LensError::InvalidParameter("n_init must be at least 1".to_string()));
        }
        if self.max_iter == 0 {
            return Err(LensError::InvalidParameter("max_iter must be at least 1".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// RESULTS
// ============================================================================

/// One cluster center, channels truncated to integers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColorCluster {
    pub centroid: [i32; 3],
    /// Sampled pixels assigned to this cluster
    pub pixel_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Quantization {
    pub clusters: Vec<ColorCluster>,
    /// Clusters asked for
    pub requested: usize,
    /// Distinct colors found in the sampled grid
    pub unique_colors: usize,
}

impl Quantization {
    /// Fewer distinct colors than requested clusters
    pub fn is_degenerate(&self) -> bool {
        self.unique_colors < self.requested
    }
}

// ============================================================================
// CLUSTERING
// ============================================================================

/// Resample an image onto the clustering grid
pub fn downsample(img: &RgbImage, settings: &QuantizerSettings) -> RgbImage {
    imageops::resize(
        img,
        settings.sample_width,
        settings.sample_height,
        settings.resample.into(),
    )
}

/// Distinct colors with their counts, in first-seen order
fn unique_colors(img: &RgbImage) -> Vec<([u8; 3], usize)> {
    let mut order: Vec<([u8; 3], usize)> = Vec::new();
    let mut index: HashMap<[u8; 3], usize> = HashMap::new();
    for px in img.pixels() {
        match index.get(&px.0) {
            Some(&i) => order[i].1 += 1,
            None => {
                index.insert(px.0, order.len());
                order.push((px.0, 1));
            }
        }
    }
    order
}

fn to_channel(v: f32) -> i32 {
    // Truncates toward zero like an integer cast of the centroid
    (v * 255.0) as i32
}

/// Cluster an image into `k` representative colors
pub fn cluster(img: &RgbImage, k: usize, settings: &QuantizerSettings) -> Result<Quantization> {
    if k == 0 || k > MAX_CLUSTERS {
        return Err(LensError::InvalidParameter(format!(
            "k must be between 1 and {}, got {}",
            MAX_CLUSTERS, k
        )));
    }
    settings.validate()?;
    if img.width() == 0 || img.height() == 0 {
        return Err(LensError::InvalidParameter("cannot cluster an empty image".to_string()));
    }

    let sample = downsample(img, settings);
    let distinct = unique_colors(&sample);

    if distinct.len() <= k {
        if distinct.len() < k {
            tracing::warn!(
                unique = distinct.len(),
                requested = k,
                "fewer unique colors than clusters requested"
            );
        }
        let clusters = distinct
            .iter()
            .map(|&(rgb, count)| ColorCluster {
                centroid: rgb.map(i32::from),
                pixel_count: count,
            })
            .collect();
        return Ok(Quantization {
            clusters,
            requested: k,
            unique_colors: distinct.len(),
        });
    }

    let buf = to_srgb(&sample);
    let best = best_run(&buf, k, settings)?;

    tracing::debug!(run = best.index, inertia = best.inertia, k, "k-means finished");

    let mut counts = vec![0usize; best.kmeans.centroids.len()];
    for &i in &best.kmeans.indices {
        if let Some(count) = counts.get_mut(i as usize) {
            *count += 1;
        }
    }

    let clusters = best
        .kmeans
        .centroids
        .iter()
        .zip(counts)
        .map(|(c, pixel_count)| ColorCluster {
            centroid: [to_channel(c.red), to_channel(c.green), to_channel(c.blue)],
            pixel_count,
        })
        .collect();

    Ok(Quantization {
        clusters,
        requested: k,
        unique_colors: distinct.len(),
    })
}

fn to_srgb(img: &RgbImage) -> Vec<Srgb> {
    img.pixels()
        .map(|px| Srgb::<u8>::new(px[0], px[1], px[2]).into_format())
        .collect()
}

/// One seeded k-means restart
struct Run {
    index: usize,
    /// Sum of squared distances from every pixel to its assigned centroid
    inertia: f64,
    kmeans: Kmeans<Srgb>,
}

/// Within-cluster sum of squares of a finished k-means run
fn inertia(buf: &[Srgb], kmeans: &Kmeans<Srgb>) -> f64 {
    buf.iter()
        .zip(&kmeans.indices)
        .filter_map(|(px, &i)| kmeans.centroids.get(i as usize).map(|c| <Srgb as Calculate>::difference(px, c) as f64))
        .sum()
}

/// Run every restart and keep the one with the lowest inertia
///
/// `Kmeans::score` only measures how far the centroids moved in the last
/// iteration, so runs are ranked by inertia computed here instead.
fn best_run(buf: &[Srgb], k: usize, settings: &QuantizerSettings) -> Result<Run> {
    (0..settings.n_init)
        .into_par_iter()
        .map(|index| {
            let seed = settings.seed.wrapping_add(index as u64);
            let kmeans = get_kmeans(k, settings.max_iter, settings.converge, false, buf, seed);
            Run {
                index,
                inertia: inertia(buf, &kmeans),
                kmeans,
            }
        })
        .reduce_with(pick_better)
        .ok_or_else(|| LensError::Processing("k-means produced no runs".to_string()))
}

/// Lower inertia wins; ties go to the earlier run so the choice is reproducible
fn pick_better(a: Run, b: Run) -> Run {
    match a.inertia.total_cmp(&b.inertia) {
        Ordering::Less => a,
        Ordering::Greater => b,
        Ordering::Equal => {
            if a.index <= b.index {
                a
            } else {
                b
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
