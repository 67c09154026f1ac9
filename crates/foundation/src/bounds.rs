/// Axis-aligned geographic bounding rectangle.
///
/// `min` is the lower-left corner and `max` the upper-right corner, in the
/// dataset's planar coordinate units (projected or lon/lat).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb2 {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Aabb2 {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Aabb2 { min, max }
    }

    /// Builds a rectangle from `[xmin, ymin, xmax, ymax]`.
    pub fn from_extent(e: [f64; 4]) -> Self {
        Aabb2::new([e[0], e[1]], [e[2], e[3]])
    }

    /// Smallest rectangle containing every point, or `None` for an empty input.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = [f64; 2]>,
    {
        let mut out: Option<Aabb2> = None;
        for p in points {
            match out.as_mut() {
                Some(b) => b.expand_to(p),
                None => out = Some(Aabb2::new(p, p)),
            }
        }
        out
    }

    pub fn width(&self) -> f64 {
        self.max[0] - self.min[0]
    }

    pub fn height(&self) -> f64 {
        self.max[1] - self.min[1]
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn center(&self) -> [f64; 2] {
        [
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
        ]
    }

    /// Inclusive overlap test; rectangles sharing only an edge intersect.
    pub fn intersects(&self, other: &Aabb2) -> bool {
        self.min[0] <= other.max[0]
            && self.max[0] >= other.min[0]
            && self.min[1] <= other.max[1]
            && self.max[1] >= other.min[1]
    }

    pub fn contains_point(&self, p: [f64; 2]) -> bool {
        p[0] >= self.min[0] && p[0] <= self.max[0] && p[1] >= self.min[1] && p[1] <= self.max[1]
    }

    pub fn expand_to(&mut self, p: [f64; 2]) {
        self.min[0] = self.min[0].min(p[0]);
        self.min[1] = self.min[1].min(p[1]);
        self.max[0] = self.max[0].max(p[0]);
        self.max[1] = self.max[1].max(p[1]);
    }

    pub fn union(&self, other: &Aabb2) -> Aabb2 {
        let mut out = *self;
        out.expand_to(other.min);
        out.expand_to(other.max);
        out
    }
}
