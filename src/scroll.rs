//! Scroll simulator: accumulates input deltas and smooths the visible
//! position toward them once per rendered frame.
//!
//! The smoothing factor is applied per frame, not per elapsed second, so the
//! feel of the gallery is frame-rate dependent. That is the contract: the
//! filter must not be rescaled by delta time.

/// Amount added to both targets every frame so the gallery keeps drifting
/// with no input.
pub const IDLE_DRIFT: f32 = 0.015;

/// Exponential smoothing factor applied once per frame.
pub const SMOOTHING: f32 = 0.1;

/// Cumulative scroll state shared by the instanced cylinder and the
/// centered viewer.
///
/// `target`/`current` drive the cylinder's scroll position. The secondary
/// `speed_target`/`speed_current` pair accumulates identically but is only
/// used to select which image sits in the centered view. `direction` is the
/// sign of the most recent nonzero input and persists across zero-delta
/// events.
#[derive(Debug, Clone)]
pub struct ScrollState {
    pub speed_target: f32,
    pub speed_current: f32,
    pub target: f32,
    pub current: f32,
    pub direction: f32,
    idle_drift: f32,
    smoothing: f32,
}

impl Default for ScrollState {
    fn default() -> Self {
        Self::new(IDLE_DRIFT, SMOOTHING)
    }
}

impl ScrollState {
    #[must_use]
    pub const fn new(idle_drift: f32, smoothing: f32) -> Self {
        Self {
            speed_target: 0.0,
            speed_current: 0.0,
            target: 0.0,
            current: 0.0,
            direction: 1.0,
            idle_drift,
            smoothing,
        }
    }

    /// Feed one input delta. Callable any number of times between frames;
    /// deltas are purely additive, direction is last-call-wins.
    pub fn update_scroll(&mut self, delta: f32, direction: f32) {
        self.direction = direction;
        self.speed_target += delta;
        self.target += delta;
    }

    /// Per-frame step: idle drift on both targets, then one smoothing step
    /// of `current` and `speed_current` toward their targets.
    ///
    /// For a constant target the distance shrinks monotonically and the
    /// sign of `target - current` never flips.
    pub fn advance(&mut self) {
        let drift = self.idle_drift * self.direction;
        self.target += drift;
        self.speed_target += drift;

        self.current += (self.target - self.current) * self.smoothing;
        self.speed_current += (self.speed_target - self.speed_current) * self.smoothing;
    }

    /// Index of the image shown in the centered view.
    ///
    /// Uses `image_count - 1` as the modulus, so the last image is only
    /// reached through the wraparound of the signed modulo and is visited
    /// less often than the rest. That asymmetry is intentional and kept.
    /// With fewer than two images the modulus degenerates; index 0 is
    /// returned instead of propagating a NaN.
    #[must_use]
    pub fn center_index(&self, image_count: usize) -> usize {
        if image_count < 2 {
            return 0;
        }
        let modulus = (image_count - 1) as f32;
        // f32 `%` truncates toward zero, matching the source convention.
        (self.speed_target % modulus).floor().abs() as usize
    }
}
