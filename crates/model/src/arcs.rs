use foundation::bounds::Aabb2;

/// Reference from a path to an arc of the dataset's arc collection.
///
/// Encoded on the wire as a signed integer: `n >= 0` is arc `n` in stored
/// direction, `n < 0` is arc `!n` (i.e. `-n - 1`) reversed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ArcRef {
    pub index: usize,
    pub reversed: bool,
}

impl ArcRef {
    pub fn forward(index: usize) -> Self {
        Self {
            index,
            reversed: false,
        }
    }

    pub fn reversed(index: usize) -> Self {
        Self {
            index,
            reversed: true,
        }
    }

    pub fn from_encoded(n: i64) -> Self {
        if n < 0 {
            Self::reversed(!n as usize)
        } else {
            Self::forward(n as usize)
        }
    }
}

/// Shared polyline segments of a dataset's topology.
///
/// Optional per-vertex thresholds (computed by a presimplify step) drive
/// filtered access: with a retained percentage below 1, interior vertices
/// whose threshold falls under the derived cutoff are skipped. Arc endpoints
/// are always kept.
#[derive(Debug, Clone, PartialEq)]
pub struct ArcCollection {
    arcs: Vec<Vec<[f64; 2]>>,
    thresholds: Option<Vec<Vec<f64>>>,
    retained_pct: f64,
    cutoff: f64,
}

impl ArcCollection {
    pub fn new(arcs: Vec<Vec<[f64; 2]>>) -> Self {
        Self {
            arcs,
            thresholds: None,
            retained_pct: 1.0,
            cutoff: f64::NEG_INFINITY,
        }
    }

    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    /// All vertices of arc `i`, in stored direction.
    pub fn arc(&self, i: usize) -> Option<&[[f64; 2]]> {
        self.arcs.get(i).map(Vec::as_slice)
    }

    pub fn arc_bounds(&self, i: usize) -> Option<Aabb2> {
        Aabb2::from_points(self.arc(i)?.iter().copied())
    }

    pub fn bounds(&self) -> Option<Aabb2> {
        Aabb2::from_points(self.arcs.iter().flatten().copied())
    }

    pub fn has_thresholds(&self) -> bool {
        self.thresholds.is_some()
    }

    /// Installs per-vertex simplification thresholds.
    ///
    /// Arcs whose threshold list does not match their vertex count keep every
    /// vertex.
    pub fn set_thresholds(&mut self, thresholds: Vec<Vec<f64>>) {
        self.thresholds = Some(thresholds);
        self.update_cutoff();
    }

    pub fn retained_pct(&self) -> f64 {
        self.retained_pct
    }

    /// Sets the share of removable vertices to keep, clamped to `[0, 1]`.
    pub fn set_retained_pct(&mut self, pct: f64) {
        self.retained_pct = if pct.is_nan() { 1.0 } else { pct.clamp(0.0, 1.0) };
        self.update_cutoff();
    }

    /// Vertices of arc `i` that survive the current simplification level.
    pub fn filtered_arc(&self, i: usize) -> Vec<[f64; 2]> {
        let Some(arc) = self.arcs.get(i) else {
            return Vec::new();
        };
        let Some(zz) = self.thresholds.as_ref().and_then(|t| t.get(i)) else {
            return arc.clone();
        };
        if zz.len() != arc.len() || self.cutoff == f64::NEG_INFINITY {
            return arc.clone();
        }
        let last = arc.len().saturating_sub(1);
        arc.iter()
            .zip(zz)
            .enumerate()
            .filter(|(idx, (_, z))| *idx == 0 || *idx == last || **z >= self.cutoff)
            .map(|(_, (p, _))| *p)
            .collect()
    }

    /// Rewrites every vertex in place, e.g. after a projection change.
    ///
    /// Thresholds are expressed in the old coordinate units and are dropped.
    pub fn transform_points<F>(&mut self, mut f: F)
    where
        F: FnMut([f64; 2]) -> [f64; 2],
    {
        for p in self.arcs.iter_mut().flatten() {
            *p = f(*p);
        }
        self.thresholds = None;
        self.update_cutoff();
    }

    fn update_cutoff(&mut self) {
        self.cutoff = f64::NEG_INFINITY;
        let Some(thresholds) = self.thresholds.as_ref() else {
            return;
        };
        if self.retained_pct >= 1.0 {
            return;
        }

        let mut interior: Vec<f64> = Vec::new();
        for (arc, zz) in self.arcs.iter().zip(thresholds) {
            if zz.len() != arc.len() || zz.len() < 3 {
                continue;
            }
            interior.extend_from_slice(&zz[1..zz.len() - 1]);
        }
        if interior.is_empty() {
            return;
        }

        interior.sort_by(|a, b| b.total_cmp(a));
        let keep = (self.retained_pct * interior.len() as f64).round() as usize;
        self.cutoff = if keep == 0 {
            f64::INFINITY
        } else if keep >= interior.len() {
            f64::NEG_INFINITY
        } else {
            interior[keep - 1]
        };
    }
}

/// Adds one to `counts[i]` for every arc referenced by `paths`.
///
/// Counts saturate at `u8::MAX`; callers only test for `> 0`. References past
/// the end of `counts` are ignored.
pub fn count_arcs_in_paths<'a, I>(paths: I, counts: &mut [u8])
where
    I: IntoIterator<Item = &'a [ArcRef]>,
{
    for path in paths {
        for r in path {
            if let Some(c) = counts.get_mut(r.index) {
                *c = c.saturating_add(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ArcCollection, ArcRef, count_arcs_in_paths};
    use foundation::bounds::Aabb2;

    fn zigzag() -> ArcCollection {
        let mut arcs = ArcCollection::new(vec![
            vec![[0.0, 0.0], [1.0, 1.0], [2.0, 0.0], [3.0, 1.0], [4.0, 0.0]],
            vec![[4.0, 0.0], [4.0, 4.0]],
        ]);
        arcs.set_thresholds(vec![
            vec![f64::INFINITY, 3.0, 1.0, 2.0, f64::INFINITY],
            vec![f64::INFINITY, f64::INFINITY],
        ]);
        arcs
    }

    #[test]
    fn decodes_reversed_refs() {
        assert_eq!(ArcRef::from_encoded(3), ArcRef::forward(3));
        assert_eq!(ArcRef::from_encoded(-1), ArcRef::reversed(0));
        assert_eq!(ArcRef::from_encoded(-4), ArcRef::reversed(3));
    }

    #[test]
    fn full_retention_keeps_every_vertex() {
        let arcs = zigzag();
        assert_eq!(arcs.filtered_arc(0).len(), 5);
    }

    #[test]
    fn partial_retention_drops_low_thresholds() {
        let mut arcs = zigzag();
        arcs.set_retained_pct(1.0 / 3.0);
        assert_eq!(
            arcs.filtered_arc(0),
            vec![[0.0, 0.0], [1.0, 1.0], [4.0, 0.0]]
        );

        arcs.set_retained_pct(0.0);
        assert_eq!(arcs.filtered_arc(0), vec![[0.0, 0.0], [4.0, 0.0]]);
        assert_eq!(arcs.filtered_arc(1).len(), 2);
    }

    #[test]
    fn retained_pct_is_clamped() {
        let mut arcs = zigzag();
        arcs.set_retained_pct(7.0);
        assert_eq!(arcs.retained_pct(), 1.0);
        arcs.set_retained_pct(-1.0);
        assert_eq!(arcs.retained_pct(), 0.0);
    }

    #[test]
    fn transform_moves_bounds_and_drops_thresholds() {
        let mut arcs = zigzag();
        arcs.set_retained_pct(0.0);
        arcs.transform_points(|[x, y]| [x * 10.0, y * 10.0]);
        assert!(!arcs.has_thresholds());
        assert_eq!(arcs.filtered_arc(0).len(), 5);
        assert_eq!(arcs.bounds(), Some(Aabb2::from_extent([0.0, 0.0, 40.0, 40.0])));
    }

    #[test]
    fn arc_counts_saturate() {
        let path = vec![ArcRef::forward(1); 300];
        let mut counts = vec![0u8; 3];
        count_arcs_in_paths([path.as_slice(), [ArcRef::reversed(0)].as_slice()], &mut counts);
        assert_eq!(counts, vec![1, 255, 0]);
    }
}
