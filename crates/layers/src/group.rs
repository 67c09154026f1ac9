use earcutr::earcut;
use foundation::bounds::Aabb2;
use foundation::ids::{GroupId, LayerId};
use model::{ArcCollection, ArcRef, DatasetHandle, GeometryKind, Layer, Shape};

use crate::layer::{GroupOptions, GroupVisibility, RenderGroup, Surface, ViewTransform};
use crate::symbology::{Color, Style};

/// Pixel-space draw command produced by a pass.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Flat triangle list (3 vertices per triangle).
    Fill {
        triangles: Vec<[f64; 2]>,
        color: Color,
    },
    Stroke {
        arc: usize,
        points: Vec<[f64; 2]>,
        color: Color,
        width: f32,
    },
    Dot {
        at: [f64; 2],
        color: Color,
        size: f32,
    },
}

/// Layer group backed by an in-memory command list.
///
/// Each pass replaces the previous command list; pass counters let callers
/// observe which groups were redrawn.
#[derive(Debug)]
pub struct LayerGroup {
    dataset: DatasetHandle,
    options: GroupOptions,
    layer: Option<LayerId>,
    bounds: Option<Aabb2>,
    visibility: GroupVisibility,
    commands: Vec<DrawCommand>,
    shape_passes: u32,
    structure_passes: u32,
    removed: bool,
}

impl LayerGroup {
    pub fn new(dataset: DatasetHandle, options: GroupOptions) -> Self {
        Self {
            dataset,
            options,
            layer: None,
            bounds: None,
            visibility: GroupVisibility::Hidden,
            commands: Vec::new(),
            shape_passes: 0,
            structure_passes: 0,
            removed: false,
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn shape_passes(&self) -> u32 {
        self.shape_passes
    }

    pub fn structure_passes(&self) -> u32 {
        self.structure_passes
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    fn refresh_bounds(&mut self) {
        let ds = self.dataset.borrow();
        self.bounds = self
            .layer
            .and_then(|id| ds.layer(id))
            .and_then(|lyr| lyr.bounds(ds.arcs.as_ref()));
    }

    fn begin_pass(&mut self, visibility: GroupVisibility) -> bool {
        if self.removed {
            return false;
        }
        self.visibility = visibility;
        self.commands.clear();
        true
    }
}

impl RenderGroup for LayerGroup {
    fn dataset(&self) -> &DatasetHandle {
        &self.dataset
    }

    fn layer(&self) -> Option<LayerId> {
        self.layer
    }

    fn options(&self) -> GroupOptions {
        self.options
    }

    fn visibility(&self) -> GroupVisibility {
        self.visibility
    }

    fn show_layer(&mut self, layer: LayerId) {
        self.layer = Some(layer);
        self.refresh_bounds();
    }

    fn bounds(&self) -> Option<Aabb2> {
        self.bounds
    }

    fn draw_shapes(&mut self, style: &Style, view: &ViewTransform) {
        if !self.begin_pass(GroupVisibility::Shapes) {
            return;
        }
        self.shape_passes += 1;

        let ds = self.dataset.borrow();
        let Some(lyr) = self.layer.and_then(|id| ds.layer(id)) else {
            return;
        };
        let pen = Pen {
            arcs: ds.arcs.as_ref(),
            filtered: !self.options.no_filtering,
            style,
            view,
        };
        self.commands = pen.shapes(lyr);
    }

    fn draw_structure(&mut self, style: &Style, view: &ViewTransform) {
        if !self.begin_pass(GroupVisibility::Structure) {
            return;
        }
        self.structure_passes += 1;

        let ds = self.dataset.borrow();
        let Some(lyr) = self.layer.and_then(|id| ds.layer(id)) else {
            return;
        };
        let pen = Pen {
            arcs: ds.arcs.as_ref(),
            filtered: !self.options.no_filtering,
            style,
            view,
        };
        self.commands = pen.structure(lyr);
    }

    fn hide(&mut self) {
        self.visibility = GroupVisibility::Hidden;
        self.commands.clear();
    }

    fn remove(&mut self) {
        self.hide();
        self.removed = true;
    }

    fn updated(&mut self) {
        self.refresh_bounds();
    }

    fn set_retained_pct(&mut self, pct: f64) {
        if let Some(arcs) = self.dataset.borrow_mut().arcs.as_mut() {
            arcs.set_retained_pct(pct);
        }
    }
}

/// Borrowed drawing context for one pass.
struct Pen<'a> {
    arcs: Option<&'a ArcCollection>,
    filtered: bool,
    style: &'a Style,
    view: &'a ViewTransform,
}

impl Pen<'_> {
    fn shapes(&self, lyr: &Layer) -> Vec<DrawCommand> {
        let mut out = Vec::new();
        for shape in &lyr.shapes {
            match (lyr.geometry, shape) {
                (Some(GeometryKind::Polygon), Shape::Paths(rings)) => {
                    if let Some(color) = self.style.fill_color {
                        self.fill_rings(rings, color, &mut out);
                    }
                    self.stroke_paths(rings, &mut out);
                }
                (Some(GeometryKind::Polyline), Shape::Paths(parts)) => {
                    self.stroke_paths(parts, &mut out);
                }
                (Some(GeometryKind::Point), Shape::Points(points)) => {
                    self.dots(points, &mut out);
                }
                _ => {}
            }
        }
        out
    }

    fn structure(&self, lyr: &Layer) -> Vec<DrawCommand> {
        let mut out = Vec::new();
        match lyr.geometry {
            Some(kind) if kind.has_paths() => {
                let (Some(arcs), Some(stroke)) = (self.arcs, self.style.stroke_color.as_ref())
                else {
                    return out;
                };
                let width = self.style.stroke_width_or_default();
                for i in 0..arcs.len() {
                    out.push(DrawCommand::Stroke {
                        arc: i,
                        points: self.arc_px(ArcRef::forward(i)),
                        color: stroke.color(i),
                        width,
                    });
                }
            }
            Some(GeometryKind::Point) => {
                for shape in &lyr.shapes {
                    if let Shape::Points(points) = shape {
                        self.dots(points, &mut out);
                    }
                }
            }
            _ => {}
        }
        out
    }

    fn stroke_paths(&self, paths: &[Vec<ArcRef>], out: &mut Vec<DrawCommand>) {
        let Some(stroke) = self.style.stroke_color.as_ref() else {
            return;
        };
        let width = self.style.stroke_width_or_default();
        for r in paths.iter().flatten() {
            out.push(DrawCommand::Stroke {
                arc: r.index,
                points: self.arc_px(*r),
                color: stroke.color(r.index),
                width,
            });
        }
    }

    fn dots(&self, points: &[[f64; 2]], out: &mut Vec<DrawCommand>) {
        let Some(color) = self.style.dot_color else {
            return;
        };
        let size = self.style.dot_size_or_default();
        out.extend(points.iter().map(|p| DrawCommand::Dot {
            at: self.view.to_px(*p),
            color,
            size,
        }));
    }

    fn fill_rings(&self, rings: &[Vec<ArcRef>], color: Color, out: &mut Vec<DrawCommand>) {
        let mut triangles = Vec::new();
        for polygon in group_rings(rings.iter().map(|r| self.ring_geo(r)).collect()) {
            triangles.extend(triangulate(&polygon));
        }
        if triangles.is_empty() {
            return;
        }
        let triangles = triangles.into_iter().map(|p| self.view.to_px(p)).collect();
        out.push(DrawCommand::Fill { triangles, color });
    }

    fn arc_geo(&self, r: ArcRef) -> Vec<[f64; 2]> {
        let Some(arcs) = self.arcs else {
            return Vec::new();
        };
        let mut points = if self.filtered {
            arcs.filtered_arc(r.index)
        } else {
            arcs.arc(r.index).map(<[_]>::to_vec).unwrap_or_default()
        };
        if r.reversed {
            points.reverse();
        }
        points
    }

    fn arc_px(&self, r: ArcRef) -> Vec<[f64; 2]> {
        self.arc_geo(r)
            .into_iter()
            .map(|p| self.view.to_px(p))
            .collect()
    }

    fn ring_geo(&self, ring: &[ArcRef]) -> Vec<[f64; 2]> {
        let mut out: Vec<[f64; 2]> = Vec::new();
        for r in ring {
            let pts = self.arc_geo(*r);
            // Consecutive arcs share their joint vertex.
            let skip = usize::from(!out.is_empty());
            out.extend(pts.into_iter().skip(skip));
        }
        drop_closing_duplicate(&mut out);
        out
    }
}

/// Splits rings into polygons: a ring wound like the first ring starts a new
/// polygon, a ring wound the other way is a hole of the current polygon.
fn group_rings(rings: Vec<Vec<[f64; 2]>>) -> Vec<Vec<Vec<[f64; 2]>>> {
    let mut polygons: Vec<Vec<Vec<[f64; 2]>>> = Vec::new();
    let mut outer_sign = 0.0;
    for ring in rings {
        if ring.len() < 3 {
            continue;
        }
        let sign = signed_area(&ring).signum();
        if polygons.is_empty() || sign == outer_sign {
            outer_sign = sign;
            polygons.push(vec![ring]);
        } else if let Some(current) = polygons.last_mut() {
            current.push(ring);
        }
    }
    polygons
}

fn triangulate(rings: &[Vec<[f64; 2]>]) -> Vec<[f64; 2]> {
    let mut vertices: Vec<[f64; 2]> = Vec::new();
    let mut coords: Vec<f64> = Vec::new();
    let mut hole_indices: Vec<usize> = Vec::new();

    for (i, ring) in rings.iter().enumerate() {
        if i > 0 {
            hole_indices.push(vertices.len());
        }
        for p in ring {
            coords.push(p[0]);
            coords.push(p[1]);
            vertices.push(*p);
        }
    }

    let indices = match earcut(&coords, &hole_indices, 2) {
        Ok(ix) => ix,
        Err(_) => return Vec::new(),
    };
    indices
        .into_iter()
        .filter_map(|idx| vertices.get(idx).copied())
        .collect()
}

fn signed_area(ring: &[[f64; 2]]) -> f64 {
    let n = ring.len();
    let mut sum = 0.0;
    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        sum += a[0] * b[1] - b[0] * a[1];
    }
    sum * 0.5
}

fn drop_closing_duplicate(points: &mut Vec<[f64; 2]>) {
    if points.len() >= 2 && points.first() == points.last() {
        points.pop();
    }
}

/// Root surface holding layer groups in attachment (stacking) order.
#[derive(Debug, Default)]
pub struct DrawSurface {
    stack: Vec<GroupId>,
}

impl DrawSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attached group ids, bottom to top.
    pub fn stack(&self) -> &[GroupId] {
        &self.stack
    }
}

impl Surface for DrawSurface {
    type Group = LayerGroup;

    fn create_group(&mut self, dataset: DatasetHandle, options: GroupOptions) -> LayerGroup {
        LayerGroup::new(dataset, options)
    }

    fn attach(&mut self, id: GroupId) {
        self.stack.retain(|g| *g != id);
        self.stack.push(id);
    }

    fn detach(&mut self, id: GroupId) {
        self.stack.retain(|g| *g != id);
    }
}

#[cfg(test)]
mod tests {
    use super::{DrawCommand, DrawSurface, LayerGroup};
    use crate::layer::{GroupOptions, GroupVisibility, RenderGroup, Surface, ViewTransform};
    use crate::symbology::{Color, Style, StrokeStyle};
    use foundation::bounds::Aabb2;
    use foundation::ids::{DatasetId, GroupId, LayerId};
    use model::{ArcCollection, ArcRef, Dataset, DatasetHandle, GeometryKind, Layer, Shape};

    // Square 0..4 with a square hole 1..3, plus a dangling arc not used by the layer.
    fn square_dataset() -> DatasetHandle {
        let mut arcs = ArcCollection::new(vec![
            vec![[0.0, 0.0], [0.0, 4.0], [4.0, 4.0], [4.0, 0.0], [0.0, 0.0]],
            vec![[1.0, 1.0], [3.0, 1.0], [3.0, 3.0], [1.0, 3.0], [1.0, 1.0]],
            vec![[5.0, 5.0], [5.5, 6.0], [6.0, 5.0]],
        ]);
        arcs.set_thresholds(vec![
            vec![f64::INFINITY, 1.0, 1.0, 1.0, f64::INFINITY],
            vec![f64::INFINITY, 1.0, 1.0, 1.0, f64::INFINITY],
            vec![f64::INFINITY, 0.5, f64::INFINITY],
        ]);
        let polygons = Layer::new(
            LayerId(1),
            Some(GeometryKind::Polygon),
            vec![Shape::Paths(vec![
                vec![ArcRef::forward(0)],
                vec![ArcRef::forward(1)],
            ])],
        );
        let points = Layer::new(
            LayerId(2),
            Some(GeometryKind::Point),
            vec![Shape::Points(vec![[1.0, 1.0], [2.0, 2.0]])],
        );
        DatasetHandle::new(Dataset::new(DatasetId(1), vec![polygons, points], Some(arcs)))
    }

    fn identity() -> ViewTransform {
        ViewTransform::new(1.0, [0.0, 10.0])
    }

    fn polygon_style() -> Style {
        Style {
            stroke_color: Some(StrokeStyle::Constant(Color::BLACK)),
            stroke_width: Some(1.5),
            fill_color: Some(Color::WHITE),
            ..Style::default()
        }
    }

    #[test]
    fn show_layer_caches_bounds() {
        let mut g = LayerGroup::new(square_dataset(), GroupOptions::default());
        assert_eq!(g.bounds(), None);
        g.show_layer(LayerId(1));
        assert_eq!(g.bounds(), Some(Aabb2::from_extent([0.0, 0.0, 4.0, 4.0])));
        g.show_layer(LayerId(99));
        assert_eq!(g.bounds(), None);
    }

    #[test]
    fn updated_recomputes_bounds_after_in_place_edit() {
        let ds = square_dataset();
        let mut g = LayerGroup::new(ds.clone(), GroupOptions::default());
        g.show_layer(LayerId(1));
        if let Some(arcs) = ds.borrow_mut().arcs.as_mut() {
            arcs.transform_points(|[x, y]| [x * 2.0, y * 2.0]);
        }
        assert_eq!(g.bounds(), Some(Aabb2::from_extent([0.0, 0.0, 4.0, 4.0])));
        g.updated();
        assert_eq!(g.bounds(), Some(Aabb2::from_extent([0.0, 0.0, 8.0, 8.0])));
    }

    #[test]
    fn shapes_pass_fills_polygon_with_hole() {
        let mut g = LayerGroup::new(square_dataset(), GroupOptions::default());
        g.show_layer(LayerId(1));
        g.draw_shapes(&polygon_style(), &identity());

        assert_eq!(g.visibility(), GroupVisibility::Shapes);
        assert_eq!(g.shape_passes(), 1);
        let fills: Vec<&DrawCommand> = g
            .commands()
            .iter()
            .filter(|c| matches!(c, DrawCommand::Fill { .. }))
            .collect();
        assert_eq!(fills.len(), 1);
        if let DrawCommand::Fill { triangles, .. } = fills[0] {
            // 8 vertices, 1 hole -> 8 triangles.
            assert_eq!(triangles.len(), 8 * 3);
        }
        let strokes = g
            .commands()
            .iter()
            .filter(|c| matches!(c, DrawCommand::Stroke { .. }))
            .count();
        assert_eq!(strokes, 2);
    }

    #[test]
    fn structure_pass_colours_every_arc_and_filters() {
        let ds = square_dataset();
        let mut g = LayerGroup::new(ds.clone(), GroupOptions::default());
        g.show_layer(LayerId(1));
        g.set_retained_pct(0.0);
        let style = Style {
            stroke_color: Some(StrokeStyle::per_arc(vec![1, 1, 0], Color::BLACK, Color::WHITE)),
            ..Style::default()
        };
        g.draw_structure(&style, &identity());

        assert_eq!(g.visibility(), GroupVisibility::Structure);
        let strokes: Vec<(usize, usize, Color)> = g
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Stroke {
                    arc, points, color, ..
                } => Some((*arc, points.len(), *color)),
                _ => None,
            })
            .collect();
        assert_eq!(
            strokes,
            vec![(0, 2, Color::BLACK), (1, 2, Color::BLACK), (2, 2, Color::WHITE)]
        );
    }

    #[test]
    fn no_filtering_groups_draw_full_detail() {
        let ds = square_dataset();
        let mut g = LayerGroup::new(ds, GroupOptions::no_filtering());
        g.show_layer(LayerId(1));
        g.set_retained_pct(0.0);
        g.draw_shapes(&polygon_style(), &identity());
        let first = g.commands().iter().find_map(|c| match c {
            DrawCommand::Stroke { points, .. } => Some(points.len()),
            _ => None,
        });
        assert_eq!(first, Some(5));
    }

    #[test]
    fn point_layer_draws_dots_in_pixels() {
        let mut g = LayerGroup::new(square_dataset(), GroupOptions::default());
        g.show_layer(LayerId(2));
        let style = Style {
            dot_color: Some(Color::BLACK),
            dot_size: Some(8.0),
            ..Style::default()
        };
        g.draw_structure(&style, &identity());
        assert_eq!(
            g.commands(),
            &[
                DrawCommand::Dot {
                    at: [1.0, 9.0],
                    color: Color::BLACK,
                    size: 8.0
                },
                DrawCommand::Dot {
                    at: [2.0, 8.0],
                    color: Color::BLACK,
                    size: 8.0
                },
            ]
        );
    }

    #[test]
    fn removed_group_ignores_draws() {
        let mut g = LayerGroup::new(square_dataset(), GroupOptions::default());
        g.show_layer(LayerId(1));
        g.remove();
        g.draw_shapes(&polygon_style(), &identity());
        assert!(g.is_removed());
        assert_eq!(g.visibility(), GroupVisibility::Hidden);
        assert_eq!(g.shape_passes(), 0);
        assert!(g.commands().is_empty());
    }

    #[test]
    fn surface_keeps_stacking_order() {
        let mut s = DrawSurface::new();
        s.attach(GroupId(1));
        s.attach(GroupId(2));
        s.attach(GroupId(1));
        assert_eq!(s.stack(), &[GroupId(2), GroupId(1)]);
        s.detach(GroupId(2));
        assert_eq!(s.stack(), &[GroupId(1)]);
        let g = s.create_group(square_dataset(), GroupOptions::no_filtering());
        assert!(g.options().no_filtering);
    }
}
