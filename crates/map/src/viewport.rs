use foundation::bounds::Aabb2;
use layers::ViewTransform;

/// Camera over the map: owns the visible geographic bounds.
///
/// Mutators report whether the visible bounds changed instead of calling
/// back; the owner forwards a `ViewportEvent::Change` to the coordinator.
pub trait Viewport {
    /// Geographic bounds currently visible.
    fn bounds(&self) -> Aabb2;
    /// Sets the content bounds that [`Viewport::reset`] fits to. The visible
    /// bounds do not move.
    fn set_bounds(&mut self, content: Aabb2);
    /// Fits the camera to the content bounds. Returns true when a change
    /// notification is due (always when `force` is set).
    fn reset(&mut self, force: bool) -> bool;
    fn transform(&self) -> ViewTransform;
}

/// Pixel viewport with fit-to-content, pan and zoom.
#[derive(Debug, Clone, PartialEq)]
pub struct MapExtent {
    width_px: f64,
    height_px: f64,
    content: Option<Aabb2>,
    center: [f64; 2],
    /// Coordinate units per pixel.
    resolution: f64,
    /// Fraction of the view left empty around fitted content, per side.
    margin: f64,
}

impl MapExtent {
    pub fn new(width_px: f64, height_px: f64) -> Self {
        let width_px = width_px.max(1.0);
        let height_px = height_px.max(1.0);
        Self {
            width_px,
            height_px,
            content: None,
            center: [width_px * 0.5, height_px * 0.5],
            resolution: 1.0,
            margin: 0.0,
        }
    }

    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin.clamp(0.0, 0.45);
        self
    }

    pub fn size_px(&self) -> [f64; 2] {
        [self.width_px, self.height_px]
    }

    pub fn content_bounds(&self) -> Option<Aabb2> {
        self.content
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Moves the view by a pixel offset (drag direction: content follows the
    /// pointer). Returns true when the bounds changed.
    pub fn pan(&mut self, dx_px: f64, dy_px: f64) -> bool {
        if dx_px == 0.0 && dy_px == 0.0 {
            return false;
        }
        self.center[0] -= dx_px * self.resolution;
        self.center[1] += dy_px * self.resolution;
        true
    }

    /// Zooms by `factor` (> 1 zooms in) keeping the geographic point under
    /// pixel `anchor_px` fixed, or the centre when no anchor is given.
    pub fn zoom_by(&mut self, factor: f64, anchor_px: Option<[f64; 2]>) -> bool {
        if !(factor.is_finite() && factor > 0.0) || factor == 1.0 {
            return false;
        }
        let anchor_px = anchor_px.unwrap_or([self.width_px * 0.5, self.height_px * 0.5]);
        let anchor = self.transform().to_geo(anchor_px);
        self.resolution /= factor;
        self.center = [
            anchor[0] + (self.center[0] - anchor[0]) / factor,
            anchor[1] + (self.center[1] - anchor[1]) / factor,
        ];
        true
    }

    pub fn resize(&mut self, width_px: f64, height_px: f64) -> bool {
        let size = [width_px.max(1.0), height_px.max(1.0)];
        if size == self.size_px() {
            return false;
        }
        self.width_px = size[0];
        self.height_px = size[1];
        true
    }

    fn fitted(&self, content: &Aabb2) -> ([f64; 2], f64) {
        let usable = 1.0 - 2.0 * self.margin;
        let res = (content.width() / (self.width_px * usable))
            .max(content.height() / (self.height_px * usable));
        // A single point keeps the current scale.
        let res = if res > 0.0 && res.is_finite() {
            res
        } else {
            self.resolution
        };
        (content.center(), res)
    }
}

impl Viewport for MapExtent {
    fn bounds(&self) -> Aabb2 {
        let hw = self.width_px * 0.5 * self.resolution;
        let hh = self.height_px * 0.5 * self.resolution;
        Aabb2::new(
            [self.center[0] - hw, self.center[1] - hh],
            [self.center[0] + hw, self.center[1] + hh],
        )
    }

    fn set_bounds(&mut self, content: Aabb2) {
        self.content = Some(content);
    }

    fn reset(&mut self, force: bool) -> bool {
        let Some(content) = self.content else {
            return force;
        };
        let (center, resolution) = self.fitted(&content);
        let changed = center != self.center || resolution != self.resolution;
        self.center = center;
        self.resolution = resolution;
        changed || force
    }

    fn transform(&self) -> ViewTransform {
        let b = self.bounds();
        ViewTransform::new(1.0 / self.resolution, [b.min[0], b.max[1]])
    }
}
