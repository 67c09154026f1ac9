use foundation::bounds::Aabb2;
use foundation::ids::LayerId;
use serde::{Deserialize, Serialize};

use crate::arcs::{ArcCollection, ArcRef, count_arcs_in_paths};

/// Geometry kind shared by every shape of a layer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryKind {
    Polygon,
    Polyline,
    Point,
}

impl GeometryKind {
    pub fn has_paths(self) -> bool {
        matches!(self, GeometryKind::Polygon | GeometryKind::Polyline)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GeometryKind::Polygon => "polygon",
            GeometryKind::Polyline => "polyline",
            GeometryKind::Point => "point",
        }
    }
}

/// One feature's geometry.
///
/// Paths are sequences of arc references: polygon rings for polygon layers,
/// polyline parts for polyline layers.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Empty,
    Points(Vec<[f64; 2]>),
    Paths(Vec<Vec<ArcRef>>),
}

impl Shape {
    pub fn point_count(&self) -> usize {
        match self {
            Shape::Points(points) => points.len(),
            _ => 0,
        }
    }

    pub fn paths(&self) -> &[Vec<ArcRef>] {
        match self {
            Shape::Paths(paths) => paths,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub id: LayerId,
    pub name: Option<String>,
    /// `None` for data-only layers.
    pub geometry: Option<GeometryKind>,
    pub shapes: Vec<Shape>,
}

impl Layer {
    pub fn new(id: LayerId, geometry: Option<GeometryKind>, shapes: Vec<Shape>) -> Self {
        Self {
            id,
            name: None,
            geometry,
            shapes,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn point_count(&self) -> usize {
        self.shapes.iter().map(Shape::point_count).sum()
    }

    /// True when the layer is a polygon or polyline layer with at least one path.
    pub fn has_paths(&self) -> bool {
        self.geometry.is_some_and(GeometryKind::has_paths)
            && self.shapes.iter().any(|s| !s.paths().is_empty())
    }

    /// Per-arc usage counts of this layer, one byte per arc of `arcs`.
    pub fn arc_usage(&self, arcs: &ArcCollection) -> Vec<u8> {
        let mut counts = vec![0u8; arcs.len()];
        count_arcs_in_paths(
            self.shapes
                .iter()
                .flat_map(|s| s.paths().iter().map(Vec::as_slice)),
            &mut counts,
        );
        counts
    }

    /// Bounds of all geometry in the layer, computed from full-detail arcs.
    pub fn bounds(&self, arcs: Option<&ArcCollection>) -> Option<Aabb2> {
        let mut out: Option<Aabb2> = None;
        let mut add = |b: Aabb2| {
            out = Some(match out {
                Some(acc) => acc.union(&b),
                None => b,
            });
        };

        for shape in &self.shapes {
            match shape {
                Shape::Empty => {}
                Shape::Points(points) => {
                    if let Some(b) = Aabb2::from_points(points.iter().copied()) {
                        add(b);
                    }
                }
                Shape::Paths(paths) => {
                    let Some(arcs) = arcs else { continue };
                    for r in paths.iter().flatten() {
                        if let Some(b) = arcs.arc_bounds(r.index) {
                            add(b);
                        }
                    }
                }
            }
        }
        out
    }
}
