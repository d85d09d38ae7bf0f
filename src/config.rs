//! YAML configuration for the gallery.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

use crate::layout::{CYLINDER_HEIGHT, INSTANCE_COUNT, LayoutParams, RADIUS, RING_SPACING};
use crate::scroll::{IDLE_DRIFT, SMOOTHING};

/// Top-level configuration, kebab-case keys, every field defaulted.
///
/// At least one of `photo-library-path` / `image-paths` must be set; the
/// library directory is scanned first, explicit paths are appended after
/// it in listed order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Configuration {
    /// Directory scanned recursively for images.
    pub photo_library_path: Option<PathBuf>,
    /// Explicit ordered list of image files.
    pub image_paths: Vec<PathBuf>,

    /// Total repeated instances on the cylinder.
    pub instance_count: usize,
    /// Cylinder extent along its axis, world units.
    pub cylinder_height: f32,
    /// Vertical distance between rings, world units.
    pub ring_spacing: f32,
    /// Cylinder radius, world units.
    pub radius: f32,

    /// Idle auto-scroll per frame, world units.
    pub idle_drift: f32,
    /// Per-frame exponential smoothing factor, in (0, 1].
    pub smoothing: f32,

    /// Seed for the randomized instance layout; unseeded when absent.
    pub layout_seed: Option<u64>,

    /// Reference camera depth; sizes the centered-view projection.
    pub camera_z: f32,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            photo_library_path: None,
            image_paths: Vec::new(),
            instance_count: INSTANCE_COUNT,
            cylinder_height: CYLINDER_HEIGHT,
            ring_spacing: RING_SPACING,
            radius: RADIUS,
            idle_drift: IDLE_DRIFT,
            smoothing: SMOOTHING,
            layout_seed: None,
            camera_z: 5.0,
        }
    }
}

impl Configuration {
    /// Validate runtime invariants that cannot be expressed via serde
    /// defaults alone.
    pub fn validated(self) -> Result<Self> {
        ensure!(self.instance_count > 0, "instance-count must be positive");
        ensure!(self.cylinder_height > 0.0, "cylinder-height must be positive");
        ensure!(self.ring_spacing > 0.0, "ring-spacing must be positive");
        ensure!(
            self.cylinder_height >= self.ring_spacing,
            "cylinder-height must be at least one ring-spacing"
        );
        ensure!(self.radius > 0.0, "radius must be positive");
        ensure!(
            self.smoothing > 0.0 && self.smoothing <= 1.0,
            "smoothing must be in (0, 1]"
        );
        ensure!(self.camera_z > 0.0, "camera-z must be positive");
        ensure!(
            self.photo_library_path.is_some() || !self.image_paths.is_empty(),
            "configure photo-library-path or image-paths"
        );
        Ok(self)
    }

    #[must_use]
    pub const fn layout_params(&self) -> LayoutParams {
        LayoutParams {
            instance_count: self.instance_count,
            radius: self.radius,
            cylinder_height: self.cylinder_height,
            ring_spacing: self.ring_spacing,
        }
    }
}

/// Load a [`Configuration`] from a YAML file.
pub fn from_yaml_file(path: &Path) -> Result<Configuration> {
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_yaml::from_str(&s).with_context(|| format!("parsing {}", path.display()))
}
