//! Gallery controller: owns the scroll state, the loaded image table and
//! the per-frame parameter records consumed by the two render surfaces.
//!
//! Everything here is plain data and runs headlessly; the wgpu layer only
//! reads the published records.

use crate::atlas::{ImageInfo, UvRect};
use crate::layout::{self, InstanceLayout, LayoutParams};
use crate::scroll::ScrollState;

/// Per-frame parameters of the instanced cylinder surface.
#[derive(Debug, Clone, Copy)]
pub struct CylinderParams {
    pub time: f32,
    pub scroll: f32,
    pub speed: f32,
    pub direction: f32,
    pub z_range: f32,
    pub max_z: f32,
}

/// Per-frame parameters of the single centered surface.
#[derive(Debug, Clone, Copy)]
pub struct CenterParams {
    pub uv: UvRect,
}

/// One owned gallery instance; no ambient or static state.
#[derive(Debug)]
pub struct Gallery {
    images: Vec<ImageInfo>,
    scroll: ScrollState,
    layout_params: LayoutParams,
    layout_seed: Option<u64>,
    layout: Option<InstanceLayout>,
    cylinder: Option<CylinderParams>,
    center: Option<CenterParams>,
    center_index: usize,
}

impl Gallery {
    #[must_use]
    pub fn new(layout_params: LayoutParams, layout_seed: Option<u64>, scroll: ScrollState) -> Self {
        Self {
            images: Vec::new(),
            scroll,
            layout_params,
            layout_seed,
            layout: None,
            cylinder: None,
            center: None,
            center_index: 0,
        }
    }

    /// Accept the atlas builder's output. With a non-empty image sequence
    /// this generates the instance layout and creates both parameter
    /// records; with an empty one, surface creation stays suppressed and
    /// the gallery remains a valid no-op.
    ///
    /// Runs its side effects at most once per gallery instance.
    pub fn install_atlas(&mut self, images: Vec<ImageInfo>) {
        if self.layout.is_some() {
            return;
        }
        self.images = images;
        let Some(layout) = layout::generate(&self.layout_params, &self.images, self.layout_seed)
        else {
            return;
        };
        self.layout = Some(layout);
        self.cylinder = Some(CylinderParams {
            time: 0.0,
            scroll: 0.0,
            speed: 0.0,
            direction: self.scroll.direction,
            z_range: self.layout_params.cylinder_height,
            max_z: self.layout_params.cylinder_height * 0.5,
        });
        self.center = Some(CenterParams {
            uv: self.images[self.center_index].uvs,
        });
    }

    /// Feed one normalized scroll delta from the input glue. Safe to call
    /// before the atlas is ready.
    pub fn update_scroll(&mut self, delta: f32, direction: f32) {
        self.scroll.update_scroll(delta, direction);
    }

    /// Per-frame update: advance the simulator, reselect the centered
    /// image and republish both parameter records. A guarded no-op until
    /// `install_atlas` has created the surfaces; never fails.
    pub fn render(&mut self, time: f32) {
        let (Some(cylinder), Some(center)) = (self.cylinder.as_mut(), self.center.as_mut()) else {
            return;
        };

        self.scroll.advance();

        self.center_index = self.scroll.center_index(self.images.len());
        center.uv = self.images[self.center_index].uvs;

        cylinder.time = time;
        cylinder.scroll = self.scroll.current;
        cylinder.speed = self.scroll.speed_current;
        cylinder.direction = self.scroll.direction;
    }

    #[must_use]
    pub fn images(&self) -> &[ImageInfo] {
        &self.images
    }

    #[must_use]
    pub fn layout(&self) -> Option<&InstanceLayout> {
        self.layout.as_ref()
    }

    #[must_use]
    pub fn cylinder_params(&self) -> Option<&CylinderParams> {
        self.cylinder.as_ref()
    }

    #[must_use]
    pub fn center_params(&self) -> Option<&CenterParams> {
        self.center.as_ref()
    }

    #[must_use]
    pub const fn center_index(&self) -> usize {
        self.center_index
    }

    #[must_use]
    pub const fn scroll_state(&self) -> &ScrollState {
        &self.scroll
    }
}
