use layers::{Color, StrokeStyle, Style};
use model::{Dataset, GeometryKind};
use serde::Deserialize;

/// One style per geometry kind.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KindStyles {
    pub polygon: Style,
    pub point: Style,
    pub polyline: Style,
}

impl KindStyles {
    pub fn for_kind(&self, kind: GeometryKind) -> &Style {
        match kind {
            GeometryKind::Polygon => &self.polygon,
            GeometryKind::Point => &self.point,
            GeometryKind::Polyline => &self.polyline,
        }
    }
}

/// Point marker size as a function of how many points a layer has.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DotSizeRule {
    pub few_below: usize,
    pub some_below: usize,
    pub few: f32,
    pub some: f32,
    pub many: f32,
}

impl Default for DotSizeRule {
    fn default() -> Self {
        Self {
            few_below: 20,
            some_below: 500,
            few: 5.0,
            some: 4.0,
            many: 3.0,
        }
    }
}

impl DotSizeRule {
    pub fn size_for(&self, point_count: usize) -> f32 {
        if point_count < self.few_below {
            self.few
        } else if point_count < self.some_below {
            self.some
        } else {
            self.many
        }
    }
}

/// Colours and base styles for every role.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Palette {
    /// Stroke for arcs used by the styled layer.
    pub dark_stroke: Color,
    /// Stroke for every other arc, and for layers without paths.
    pub light_stroke: Color,
    pub active: Style,
    pub highlight: Style,
    pub hover: KindStyles,
    pub pinned: KindStyles,
}

impl Default for Palette {
    fn default() -> Self {
        let hex = |r: u8, g: u8, b: u8| Color::rgba(r, g, b, 1.0);
        let dark_stroke = hex(0x33, 0x33, 0x44);
        let orange = hex(0xf4, 0x64, 0x03);
        Self {
            dark_stroke,
            light_stroke: Color::rgba(222, 88, 249, 0.3),
            active: Style {
                stroke_color: Some(StrokeStyle::Constant(dark_stroke)),
                stroke_width: Some(0.7),
                dot_color: Some(hex(0x22, 0x22, 0x33)),
                ..Style::default()
            },
            highlight: Style {
                dot_color: Some(hex(0xf2, 0x44, 0x00)),
                ..Style::default()
            },
            hover: KindStyles {
                polygon: Style {
                    fill_color: Some(hex(0xff, 0xff, 0xcc)),
                    stroke_color: Some(StrokeStyle::Constant(Color::BLACK)),
                    stroke_width: Some(1.5),
                    ..Style::default()
                },
                point: Style {
                    dot_color: Some(Color::BLACK),
                    dot_size: Some(8.0),
                    ..Style::default()
                },
                polyline: Style {
                    stroke_color: Some(StrokeStyle::Constant(Color::BLACK)),
                    stroke_width: Some(3.0),
                    ..Style::default()
                },
            },
            pinned: KindStyles {
                polygon: Style {
                    fill_color: Some(hex(0xff, 0xd8, 0x5c)),
                    stroke_color: Some(StrokeStyle::Constant(Color::BLACK)),
                    stroke_width: Some(1.5),
                    ..Style::default()
                },
                point: Style {
                    dot_color: Some(orange),
                    dot_size: Some(8.0),
                    ..Style::default()
                },
                polyline: Style {
                    stroke_color: Some(StrokeStyle::Constant(orange)),
                    stroke_width: Some(4.0),
                    ..Style::default()
                },
            },
        }
    }
}

impl Palette {
    /// Hover style for a layer kind. Layers without geometry have none.
    pub fn hover_style(&self, kind: Option<GeometryKind>, pinned: bool) -> Option<Style> {
        let set = if pinned { &self.pinned } else { &self.hover };
        kind.map(|k| set.for_kind(k).clone())
    }

    /// Stroke for `layer`: per-arc usage against the dataset's arcs for path
    /// layers, the light stroke otherwise.
    pub fn layer_stroke(&self, dataset: &Dataset, layer: &model::Layer) -> StrokeStyle {
        match dataset.arcs.as_ref() {
            Some(arcs) if layer.has_paths() => {
                StrokeStyle::per_arc(layer.arc_usage(arcs), self.dark_stroke, self.light_stroke)
            }
            _ => StrokeStyle::Constant(self.light_stroke),
        }
    }
}

/// Builds the style for an active or highlighted layer from its base style:
/// marker size from the point count, stroke from arc usage.
///
/// An unknown layer leaves the base style untouched.
pub fn layer_role_style(
    base: &Style,
    palette: &Palette,
    dots: &DotSizeRule,
    dataset: &Dataset,
    layer: Option<&model::Layer>,
) -> Style {
    let mut style = base.clone();
    if let Some(lyr) = layer {
        style.dot_size = Some(dots.size_for(lyr.point_count()));
        style.stroke_color = Some(palette.layer_stroke(dataset, lyr));
    }
    style
}

#[cfg(test)]
mod tests {
    use super::{DotSizeRule, Palette, layer_role_style};
    use foundation::ids::{DatasetId, LayerId};
    use layers::{Color, StrokeStyle};
    use model::{ArcCollection, ArcRef, Dataset, GeometryKind, Layer, Shape};
    use pretty_assertions::assert_eq;

    fn dataset() -> Dataset {
        let arcs = ArcCollection::new(vec![
            vec![[0.0, 0.0], [1.0, 0.0]],
            vec![[1.0, 0.0], [2.0, 0.0]],
        ]);
        let lines = Layer::new(
            LayerId(1),
            Some(GeometryKind::Polyline),
            vec![Shape::Paths(vec![vec![ArcRef::reversed(1)]])],
        );
        let points = Layer::new(
            LayerId(2),
            Some(GeometryKind::Point),
            vec![Shape::Points(vec![[0.0, 0.0]; 25])],
        );
        Dataset::new(DatasetId(1), vec![lines, points], Some(arcs))
    }

    #[test]
    fn dot_size_thresholds() {
        let rule = DotSizeRule::default();
        assert_eq!(rule.size_for(0), 5.0);
        assert_eq!(rule.size_for(19), 5.0);
        assert_eq!(rule.size_for(20), 4.0);
        assert_eq!(rule.size_for(499), 4.0);
        assert_eq!(rule.size_for(500), 3.0);
    }

    #[test]
    fn path_layer_gets_per_arc_stroke() {
        let palette = Palette::default();
        let ds = dataset();
        let style = layer_role_style(
            &palette.active,
            &palette,
            &DotSizeRule::default(),
            &ds,
            ds.layer(LayerId(1)),
        );
        assert_eq!(
            style.stroke_color,
            Some(StrokeStyle::per_arc(
                vec![0, 1],
                palette.dark_stroke,
                palette.light_stroke
            ))
        );
        assert_eq!(style.dot_size, Some(5.0));
        assert_eq!(style.stroke_width, Some(0.7));
    }

    #[test]
    fn point_layer_gets_light_stroke_and_sized_dots() {
        let palette = Palette::default();
        let ds = dataset();
        let style = layer_role_style(
            &palette.highlight,
            &palette,
            &DotSizeRule::default(),
            &ds,
            ds.layer(LayerId(2)),
        );
        assert_eq!(
            style.stroke_color,
            Some(StrokeStyle::Constant(palette.light_stroke))
        );
        assert_eq!(style.dot_size, Some(4.0));
        assert_eq!(style.dot_color, Some(Color::rgba(0xf2, 0x44, 0x00, 1.0)));
    }

    #[test]
    fn hover_styles_by_kind() {
        let palette = Palette::default();
        let pinned = palette
            .hover_style(Some(GeometryKind::Polyline), true)
            .expect("style");
        assert_eq!(pinned.stroke_width, Some(4.0));
        let hover = palette
            .hover_style(Some(GeometryKind::Polyline), false)
            .expect("style");
        assert_eq!(hover.stroke_width, Some(3.0));
        assert_eq!(palette.hover_style(None, false), None);
    }

    #[test]
    fn default_palette_matches_css() {
        let palette = Palette::default();
        assert_eq!(Color::parse("#334"), Ok(palette.dark_stroke));
        assert_eq!(
            Color::parse("rgba(222, 88, 249, 0.3)"),
            Ok(palette.light_stroke)
        );
        assert_eq!(
            Color::parse("#FFD85C").ok(),
            palette.pinned.polygon.fill_color
        );
    }
}
