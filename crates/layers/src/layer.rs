use foundation::bounds::Aabb2;
use foundation::ids::{GroupId, LayerId};
use model::DatasetHandle;

use crate::symbology::Style;

/// Geo → pixel mapping of the current viewport.
///
/// Pixel `y` grows downward; `origin` is the geographic point drawn at pixel
/// `(0, 0)` (the top-left corner of the view).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewTransform {
    /// Pixels per coordinate unit.
    pub scale: f64,
    pub origin: [f64; 2],
}

impl ViewTransform {
    pub fn new(scale: f64, origin: [f64; 2]) -> Self {
        Self { scale, origin }
    }

    pub fn to_px(&self, p: [f64; 2]) -> [f64; 2] {
        [
            (p[0] - self.origin[0]) * self.scale,
            (self.origin[1] - p[1]) * self.scale,
        ]
    }

    pub fn to_geo(&self, px: [f64; 2]) -> [f64; 2] {
        [
            self.origin[0] + px[0] / self.scale,
            self.origin[1] - px[1] / self.scale,
        ]
    }
}

/// Options fixed when a group is created.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct GroupOptions {
    /// Skip simplification filtering and draw full-detail arcs.
    pub no_filtering: bool,
}

impl GroupOptions {
    pub fn no_filtering() -> Self {
        Self { no_filtering: true }
    }
}

/// What the group last put on screen.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum GroupVisibility {
    #[default]
    Hidden,
    Structure,
    Shapes,
}

/// One dataset's unit of map representation.
///
/// A group shows at most one layer of its dataset and caches that layer's
/// bounds; the cache is refreshed by `show_layer` and `updated`.
pub trait RenderGroup {
    fn dataset(&self) -> &DatasetHandle;
    fn layer(&self) -> Option<LayerId>;
    fn options(&self) -> GroupOptions;
    fn visibility(&self) -> GroupVisibility;

    fn show_layer(&mut self, layer: LayerId);
    fn bounds(&self) -> Option<Aabb2>;

    /// Full pass over every shape of the shown layer.
    fn draw_shapes(&mut self, style: &Style, view: &ViewTransform);
    /// Light pass over the dataset's structure (arcs, point dots).
    fn draw_structure(&mut self, style: &Style, view: &ViewTransform);
    fn hide(&mut self);

    /// Releases drawing resources. The group is not drawn again.
    fn remove(&mut self);
    /// Invalidates caches derived from the dataset's geometry.
    fn updated(&mut self);
    fn set_retained_pct(&mut self, pct: f64);
}

/// The map's root drawing surface.
pub trait Surface {
    type Group: RenderGroup;

    fn create_group(&mut self, dataset: DatasetHandle, options: GroupOptions) -> Self::Group;
    /// Stacks the group's element on top of the surface.
    fn attach(&mut self, id: GroupId);
    fn detach(&mut self, id: GroupId);
}
