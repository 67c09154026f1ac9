use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use foundation::ids::{DatasetId, LayerId};
use layers::{DrawSurface, GroupVisibility, RenderGroup};
use map::{
    HitEvent, MapConfig, MapCoordinator, MapExtent, ModelEvent, UpdateFlags, ViewAction,
    ViewportEvent,
};
use model::{ArcCollection, ArcRef, Dataset, DatasetHandle, GeometryKind, Layer, Shape};
use serde::Deserialize;
use tracing::debug;

/// Replay script: datasets plus the events to feed the coordinator.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    #[serde(default)]
    pub viewport: ViewportSpec,
    pub datasets: Vec<DatasetSpec>,
    #[serde(default)]
    pub events: Vec<EventSpec>,
}

#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewportSpec {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
}

impl Default for ViewportSpec {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            margin: 0.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetSpec {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arcs: Vec<Vec<[f64; 2]>>,
    #[serde(default)]
    pub thresholds: Option<Vec<Vec<f64>>>,
    pub layers: Vec<LayerSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerSpec {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub geometry: Option<GeometryKind>,
    /// `null` entries are empty shapes.
    #[serde(default)]
    pub shapes: Vec<Option<ShapeSpec>>,
}

/// Paths hold arc ids; `-1 - n` (`!n`) walks arc `n` backwards.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeSpec {
    Paths(Vec<Vec<i64>>),
    Points(Vec<[f64; 2]>),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventSpec {
    Update {
        dataset: u64,
        layer: u64,
        #[serde(default)]
        flags: UpdateFlags,
    },
    Hit {
        dataset: u64,
        layer: u64,
        #[serde(default)]
        pinned: bool,
    },
    Select,
    Delete {
        dataset: u64,
    },
    Highlight {
        dataset: u64,
        #[serde(default)]
        layer: Option<u64>,
    },
    /// Scales and offsets every coordinate of a dataset, then reports the
    /// layer as reprojected.
    Reproject {
        dataset: u64,
        layer: u64,
        scale: f64,
        #[serde(default)]
        offset: [f64; 2],
    },
    Simplify {
        pct: f64,
    },
    Pan {
        dx: f64,
        dy: f64,
    },
    Zoom {
        factor: f64,
        #[serde(default)]
        at: Option<[f64; 2]>,
    },
    Refresh,
}

impl EventSpec {
    pub fn label(&self) -> String {
        match self {
            EventSpec::Update { dataset, layer, .. } => {
                format!("update {} {}", DatasetId(*dataset), LayerId(*layer))
            }
            EventSpec::Hit {
                dataset,
                layer,
                pinned,
            } => {
                let verb = if *pinned { "pin" } else { "hover" };
                format!("{verb} {} {}", DatasetId(*dataset), LayerId(*layer))
            }
            EventSpec::Select => "select".to_string(),
            EventSpec::Delete { dataset } => format!("delete {}", DatasetId(*dataset)),
            EventSpec::Highlight {
                dataset,
                layer: Some(layer),
            } => format!("highlight {} {}", DatasetId(*dataset), LayerId(*layer)),
            EventSpec::Highlight { .. } => "highlight none".to_string(),
            EventSpec::Reproject { dataset, layer, .. } => {
                format!("reproject {} {}", DatasetId(*dataset), LayerId(*layer))
            }
            EventSpec::Simplify { pct } => format!("simplify {pct}"),
            EventSpec::Pan { dx, dy } => format!("pan {dx},{dy}"),
            EventSpec::Zoom { factor, .. } => format!("zoom {factor}"),
            EventSpec::Refresh => "refresh".to_string(),
        }
    }
}

#[derive(Debug)]
pub enum ScriptError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    DuplicateDataset(u64),
    UnknownDataset(u64),
    ArcOutOfRange { dataset: u64, layer: u64, arc: i64 },
    AtEvent { index: usize, source: Box<ScriptError> },
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::Io(e) => write!(f, "reading script: {e}"),
            ScriptError::Parse(e) => write!(f, "parsing script: {e}"),
            ScriptError::DuplicateDataset(id) => write!(f, "dataset {id} defined twice"),
            ScriptError::UnknownDataset(id) => write!(f, "no dataset {id}"),
            ScriptError::ArcOutOfRange {
                dataset,
                layer,
                arc,
            } => write!(f, "dataset {dataset} layer {layer}: arc {arc} out of range"),
            ScriptError::AtEvent { index, source } => write!(f, "event #{index}: {source}"),
        }
    }
}

impl std::error::Error for ScriptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScriptError::Io(e) => Some(e),
            ScriptError::Parse(e) => Some(e),
            ScriptError::AtEvent { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl Script {
    pub fn from_json_str(s: &str) -> Result<Self, ScriptError> {
        serde_json::from_str(s).map_err(ScriptError::Parse)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScriptError> {
        let text = std::fs::read_to_string(path).map_err(ScriptError::Io)?;
        Self::from_json_str(&text)
    }
}

impl DatasetSpec {
    fn build(&self) -> Result<Dataset, ScriptError> {
        let arcs = if self.arcs.is_empty() {
            None
        } else {
            let mut arcs = ArcCollection::new(self.arcs.clone());
            if let Some(thresholds) = &self.thresholds {
                arcs.set_thresholds(thresholds.clone());
            }
            Some(arcs)
        };
        let layers = self
            .layers
            .iter()
            .map(|l| l.build(self.id, self.arcs.len()))
            .collect::<Result<Vec<_>, _>>()?;
        let mut dataset = Dataset::new(DatasetId(self.id), layers, arcs);
        dataset.name = self.name.clone();
        Ok(dataset)
    }
}

impl LayerSpec {
    fn build(&self, dataset: u64, arc_count: usize) -> Result<Layer, ScriptError> {
        let arc_ref = |n: i64| {
            let r = ArcRef::from_encoded(n);
            if r.index < arc_count {
                Ok(r)
            } else {
                Err(ScriptError::ArcOutOfRange {
                    dataset,
                    layer: self.id,
                    arc: n,
                })
            }
        };

        let mut shapes = Vec::with_capacity(self.shapes.len());
        for shape in &self.shapes {
            shapes.push(match shape {
                None => Shape::Empty,
                Some(ShapeSpec::Points(points)) => Shape::Points(points.clone()),
                Some(ShapeSpec::Paths(paths)) => Shape::Paths(
                    paths
                        .iter()
                        .map(|path| path.iter().copied().map(&arc_ref).collect())
                        .collect::<Result<Vec<Vec<ArcRef>>, _>>()?,
                ),
            });
        }

        let mut layer = Layer::new(LayerId(self.id), self.geometry, shapes);
        layer.name = self.name.clone();
        Ok(layer)
    }
}

/// Drives a coordinator over the in-memory surface from script events.
pub struct Replay {
    map: MapCoordinator<DrawSurface, MapExtent>,
    datasets: BTreeMap<DatasetId, DatasetHandle>,
}

impl Replay {
    pub fn new(script: &Script, config: MapConfig) -> Result<Self, ScriptError> {
        let mut datasets = BTreeMap::new();
        for spec in &script.datasets {
            let handle = DatasetHandle::new(spec.build()?);
            if datasets.insert(handle.id(), handle).is_some() {
                return Err(ScriptError::DuplicateDataset(spec.id));
            }
        }
        let vp = script.viewport;
        let extent = MapExtent::new(vp.width, vp.height).with_margin(vp.margin);
        Ok(Self {
            map: MapCoordinator::new(DrawSurface::new(), extent, config),
            datasets,
        })
    }

    pub fn map(&self) -> &MapCoordinator<DrawSurface, MapExtent> {
        &self.map
    }

    /// Applies every event and returns one report line per event.
    pub fn run(&mut self, events: &[EventSpec]) -> Result<Vec<String>, ScriptError> {
        let mut lines = Vec::with_capacity(events.len());
        for (i, event) in events.iter().enumerate() {
            let index = i + 1;
            let action = self.apply(event).map_err(|e| ScriptError::AtEvent {
                index,
                source: Box::new(e),
            })?;
            lines.push(self.report(index, event, action));
        }
        Ok(lines)
    }

    pub fn apply(&mut self, event: &EventSpec) -> Result<Option<ViewAction>, ScriptError> {
        debug!(event = %event.label(), "applying");
        let action = match *event {
            EventSpec::Update {
                dataset,
                layer,
                flags,
            } => {
                let dataset = self.dataset(dataset)?;
                self.map.dispatch(
                    ModelEvent::Update {
                        dataset,
                        layer: LayerId(layer),
                        flags,
                    }
                    .into(),
                )
            }
            EventSpec::Hit {
                dataset,
                layer,
                pinned,
            } => {
                let dataset = self.dataset(dataset)?;
                self.map.dispatch(
                    HitEvent {
                        dataset,
                        layer: LayerId(layer),
                        pinned,
                    }
                    .into(),
                )
            }
            EventSpec::Select => self.map.dispatch(ModelEvent::Select.into()),
            EventSpec::Delete { dataset } => {
                let dataset = self
                    .datasets
                    .remove(&DatasetId(dataset))
                    .ok_or(ScriptError::UnknownDataset(dataset))?;
                self.map.dispatch(ModelEvent::Delete { dataset }.into())
            }
            EventSpec::Highlight { dataset, layer } => {
                let dataset = self.dataset(dataset)?;
                self.map.set_highlight_layer(layer.map(LayerId), &dataset);
                None
            }
            EventSpec::Reproject {
                dataset,
                layer,
                scale,
                offset,
            } => {
                let dataset = self.dataset(dataset)?;
                reproject(&dataset, scale, offset);
                self.map.dispatch(
                    ModelEvent::Update {
                        dataset,
                        layer: LayerId(layer),
                        flags: UpdateFlags::proj(),
                    }
                    .into(),
                )
            }
            EventSpec::Simplify { pct } => {
                self.map.set_simplify_pct(pct);
                None
            }
            EventSpec::Pan { dx, dy } => {
                if self.map.extent_mut().pan(dx, dy) {
                    self.map.dispatch(ViewportEvent::Change.into());
                }
                None
            }
            EventSpec::Zoom { factor, at } => {
                if self.map.extent_mut().zoom_by(factor, at) {
                    self.map.dispatch(ViewportEvent::Change.into());
                }
                None
            }
            EventSpec::Refresh => {
                self.map.refresh();
                None
            }
        };
        Ok(action)
    }

    fn dataset(&self, id: u64) -> Result<DatasetHandle, ScriptError> {
        self.datasets
            .get(&DatasetId(id))
            .cloned()
            .ok_or(ScriptError::UnknownDataset(id))
    }

    fn report(&self, index: usize, event: &EventSpec, action: Option<ViewAction>) -> String {
        let mut line = format!("#{index} {}", event.label());
        match action {
            Some(ViewAction::Reset) => line.push_str(" -> reset"),
            Some(ViewAction::Refresh) => line.push_str(" -> refresh"),
            None => {}
        }
        for (id, group) in self.map.groups().iter() {
            let layer = group.layer().map_or("-".to_string(), |l| l.to_string());
            let role = self.map.role_of(id).map_or("-".to_string(), |r| r.to_string());
            let visibility = match group.visibility() {
                GroupVisibility::Hidden => "hidden",
                GroupVisibility::Structure => "structure",
                GroupVisibility::Shapes => "shapes",
            };
            line.push_str(&format!(
                " | {id} {} {layer} {role} {visibility}",
                group.dataset().id()
            ));
        }
        line
    }
}

fn reproject(dataset: &DatasetHandle, scale: f64, offset: [f64; 2]) {
    let f = |[x, y]: [f64; 2]| [x * scale + offset[0], y * scale + offset[1]];
    let mut guard = dataset.borrow_mut();
    let ds = &mut *guard;
    if let Some(arcs) = ds.arcs.as_mut() {
        arcs.transform_points(f);
    }
    for layer in &mut ds.layers {
        for shape in &mut layer.shapes {
            if let Shape::Points(points) = shape {
                for p in points.iter_mut() {
                    *p = f(*p);
                }
            }
        }
    }
}
