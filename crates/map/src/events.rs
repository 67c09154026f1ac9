use foundation::ids::LayerId;
use model::DatasetHandle;
use serde::Deserialize;

/// What an editing command changed about a dataset's geometry.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpdateFlags {
    /// Simplification thresholds were (re)computed.
    pub presimplify: bool,
    /// An explicit simplify command ran.
    pub simplify: bool,
    /// The dataset was reprojected.
    pub proj: bool,
    /// The arc topology changed (arcs added, removed or split).
    pub arc_count: bool,
}

impl UpdateFlags {
    pub fn proj() -> Self {
        Self {
            proj: true,
            ..Self::default()
        }
    }

    /// True when derived geometry (bounds, filtered arcs) must be recomputed.
    pub fn geometry_changed(&self) -> bool {
        self.presimplify || self.simplify || self.proj || self.arc_count
    }
}

/// Notifications from the application model.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelEvent {
    /// A dataset was removed from the model.
    Delete { dataset: DatasetHandle },
    /// The user selected a different layer.
    Select,
    /// `layer` of `dataset` became (or stays) the active layer.
    Update {
        dataset: DatasetHandle,
        layer: LayerId,
        flags: UpdateFlags,
    },
}

/// Notification from the pointer hit-testing service.
#[derive(Debug, Clone, PartialEq)]
pub struct HitEvent {
    pub dataset: DatasetHandle,
    pub layer: LayerId,
    /// Held by a deliberate action rather than transient pointer movement.
    pub pinned: bool,
}

/// Notification from the viewport.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ViewportEvent {
    /// The visible bounds changed (zoom, pan or programmatic).
    Change,
}

/// Union of every source the coordinator subscribes to.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    Model(ModelEvent),
    Hit(HitEvent),
    Viewport(ViewportEvent),
}

impl From<ModelEvent> for MapEvent {
    fn from(e: ModelEvent) -> Self {
        MapEvent::Model(e)
    }
}

impl From<HitEvent> for MapEvent {
    fn from(e: HitEvent) -> Self {
        MapEvent::Hit(e)
    }
}

impl From<ViewportEvent> for MapEvent {
    fn from(e: ViewportEvent) -> Self {
        MapEvent::Viewport(e)
    }
}
