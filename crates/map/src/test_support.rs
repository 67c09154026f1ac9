use foundation::ids::{DatasetId, LayerId};
use layers::DrawSurface;
use model::{ArcCollection, ArcRef, Dataset, DatasetHandle, GeometryKind, Layer, Shape};

use crate::config::MapConfig;
use crate::coordinator::MapCoordinator;
use crate::events::{HitEvent, MapEvent, ModelEvent, UpdateFlags};
use crate::viewport::MapExtent;

/// Coordinator over the in-memory surface and a 100 x 100 px extent.
pub struct Fixture {
    pub map: MapCoordinator<DrawSurface, MapExtent>,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            map: MapCoordinator::new(
                DrawSurface::new(),
                MapExtent::new(100.0, 100.0),
                MapConfig::default(),
            ),
        }
    }
}

/// Dataset with three layers:
/// 1: polygon covering `extent` (one ring arc with thresholds),
/// 2: three points inside it,
/// 3: data-only layer without geometry.
pub fn square_dataset(id: u64, extent: [f64; 4]) -> DatasetHandle {
    let [x0, y0, x1, y1] = extent;
    let (mx, my) = ((x0 + x1) * 0.5, (y0 + y1) * 0.5);
    let mut arcs = ArcCollection::new(vec![vec![
        [x0, y0],
        [x0, my],
        [x0, y1],
        [x1, y1],
        [x1, y0],
        [x0, y0],
    ]]);
    arcs.set_thresholds(vec![vec![f64::INFINITY, 1.0, 5.0, 5.0, 5.0, f64::INFINITY]]);

    let layers = vec![
        Layer::new(
            LayerId(1),
            Some(GeometryKind::Polygon),
            vec![Shape::Paths(vec![vec![ArcRef::forward(0)]])],
        )
        .with_name("squares"),
        Layer::new(
            LayerId(2),
            Some(GeometryKind::Point),
            vec![
                Shape::Points(vec![[mx, my]]),
                Shape::Points(vec![[x0, y0], [x1, y1]]),
            ],
        )
        .with_name("dots"),
        Layer::new(LayerId(3), None, Vec::new()).with_name("table"),
    ];
    DatasetHandle::new(Dataset::new(DatasetId(id), layers, Some(arcs)))
}

/// Update making layer 1 of `ds` active.
pub fn active_update(ds: &DatasetHandle, flags: UpdateFlags) -> MapEvent {
    ModelEvent::Update {
        dataset: ds.clone(),
        layer: LayerId(1),
        flags,
    }
    .into()
}

pub fn hit(ds: &DatasetHandle, layer: LayerId, pinned: bool) -> MapEvent {
    HitEvent {
        dataset: ds.clone(),
        layer,
        pinned,
    }
    .into()
}
