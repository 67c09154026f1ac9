use foundation::bounds::Aabb2;
use serde::Deserialize;

/// Judges whether the camera must be re-framed after the active layer changed.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResetPolicy {
    /// Smallest acceptable `smaller / larger` area ratio between the active
    /// layer and the current view before the camera is re-framed.
    pub min_area_ratio: f64,
}

impl Default for ResetPolicy {
    fn default() -> Self {
        Self {
            min_area_ratio: 0.5,
        }
    }
}

impl ResetPolicy {
    /// Decision rules, in order:
    /// - unchanged layer extent: never reset;
    /// - layer entirely out of view: reset;
    /// - otherwise reset when the area ratio (normalised to `(0, 1]`) is
    ///   below `min_area_ratio`.
    ///
    /// Degenerate areas follow IEEE arithmetic: an infinite ratio inverts to
    /// zero (reset), a NaN ratio never resets.
    pub fn needs_reset(&self, new: &Aabb2, prev: Option<&Aabb2>, view: &Aabb2) -> bool {
        if prev.is_some_and(|p| p == new) {
            return false;
        }
        if !new.intersects(view) {
            return true;
        }
        let mut ratio = new.area() / view.area();
        if ratio > 1.0 {
            ratio = 1.0 / ratio;
        }
        ratio < self.min_area_ratio
    }
}

/// [`ResetPolicy::needs_reset`] with the default threshold.
pub fn map_needs_reset(new: &Aabb2, prev: Option<&Aabb2>, view: &Aabb2) -> bool {
    ResetPolicy::default().needs_reset(new, prev, view)
}
