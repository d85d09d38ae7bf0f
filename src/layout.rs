//! Instance layout generator: distributes the loaded images over a fixed
//! number of repeated instances arranged on a cylinder, packed as flat
//! per-instance records ready for vertex-buffer upload.

use bytemuck::{Pod, Zeroable};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::atlas::ImageInfo;

pub const INSTANCE_COUNT: usize = 600;
pub const RADIUS: f32 = 6.0;
pub const CYLINDER_HEIGHT: f32 = 120.0;
pub const RING_SPACING: f32 = 3.0;

/// Geometry knobs for the generated layout.
#[derive(Debug, Clone, Copy)]
pub struct LayoutParams {
    pub instance_count: usize,
    pub radius: f32,
    pub cylinder_height: f32,
    pub ring_spacing: f32,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            instance_count: INSTANCE_COUNT,
            radius: RADIUS,
            cylinder_height: CYLINDER_HEIGHT,
            ring_spacing: RING_SPACING,
        }
    }
}

impl LayoutParams {
    /// Number of rings stacked along the cylinder axis.
    #[must_use]
    pub fn ring_count(&self) -> usize {
        ((self.cylinder_height / self.ring_spacing) as usize).max(1)
    }
}

/// One instance slot as uploaded to the GPU.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct InstanceRaw {
    /// angle, height, radius, ring speed
    pub placement: [f32; 4],
    /// aspect ratio, image width, image height, unused
    pub image: [f32; 4],
    /// x_start, x_end, y_start, y_end into the atlas
    pub uv_rect: [f32; 4],
}

impl InstanceRaw {
    #[must_use]
    pub const fn angle(&self) -> f32 {
        self.placement[0]
    }
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.placement[1]
    }
    #[must_use]
    pub const fn ring_speed(&self) -> f32 {
        self.placement[3]
    }
}

/// The generated per-instance arrays plus bookkeeping kept for inspection.
#[derive(Debug, Clone)]
pub struct InstanceLayout {
    pub instances: Vec<InstanceRaw>,
    /// Which image each instance was assigned; indexes the ImageInfo
    /// sequence the layout was built from.
    pub image_indices: Vec<usize>,
    pub ring_count: usize,
}

/// Build the layout for a non-empty image sequence; `None` when `images`
/// is empty (downstream surface creation must then be suppressed).
///
/// Angles and heights are deterministic in the instance index; image
/// assignment and per-ring drift speeds are random per build, seedable for
/// reproducible layouts. Instances in the same ring (same
/// `i % ring_count`) share a height and a drift speed.
#[must_use]
pub fn generate(
    params: &LayoutParams,
    images: &[ImageInfo],
    seed: Option<u64>,
) -> Option<InstanceLayout> {
    if images.is_empty() {
        return None;
    }

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let count = params.instance_count;
    let ring_count = params.ring_count();
    let ring_height = params.cylinder_height / ring_count as f32;

    let ring_speeds: Vec<f32> = (0..ring_count)
        .map(|_| rng.random_range(0.8..1.0_f32))
        .collect();

    let mut instances = Vec::with_capacity(count);
    let mut image_indices = Vec::with_capacity(count);
    for i in 0..count {
        let angle = i as f32 / count as f32 * std::f32::consts::TAU;
        let ring = i % ring_count;
        let height = ring as f32 * ring_height - params.cylinder_height / 2.0;

        let image_index = rng.random_range(0..images.len());
        let info = &images[image_index];

        instances.push(InstanceRaw {
            placement: [angle, height, params.radius, ring_speeds[ring]],
            image: [info.aspect_ratio, info.width as f32, info.height as f32, 0.0],
            uv_rect: info.uvs.to_array(),
        });
        image_indices.push(image_index);
    }

    Some(InstanceLayout {
        instances,
        image_indices,
        ring_count,
    })
}
