//! Print head position records.

use nozzle_wipe_math::{xy_distance, Point2, Tolerance, Vec2};
use serde::{Deserialize, Serialize};

use crate::error::{Result, WipeError};

/// Snapshot of the print head at one instant of the G-code stream.
///
/// `x`/`y` are machine coordinates. The `offset_*` fields are the same
/// position expressed in the program's own coordinate system (after any
/// `G92` origin shift); absolute-mode output must use those.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WipePosition {
    /// Machine X (mm).
    pub x: f64,
    /// Machine Y (mm).
    pub y: f64,
    /// X in program coordinates (mm).
    pub offset_x: f64,
    /// Y in program coordinates (mm).
    pub offset_y: f64,
    /// E in program coordinates (mm of filament).
    pub offset_e: f64,
    /// The move that produced this position extruded filament.
    pub is_extruding: bool,
    /// The move that produced this position started a new layer.
    pub is_layer_change: bool,
    /// The move that produced this position changed X or Y.
    pub has_xy_position_changed: bool,
    /// XY axes are in relative mode (G91).
    pub is_xy_relative: bool,
    /// Extruder is in relative mode (M83).
    pub is_extruder_relative: bool,
}

impl WipePosition {
    /// Machine XY as a point.
    pub fn xy(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }

    /// Program-coordinate XY as a point.
    pub fn offset_xy(&self) -> Point2 {
        Point2::new(self.offset_x, self.offset_y)
    }

    /// XY distance to another position.
    pub fn distance_to(&self, other: &WipePosition) -> f64 {
        xy_distance(self.x, self.y, other.x, other.y)
    }

    /// Whether this position continues a wipeable trail: an extruding XY
    /// move that does not begin a new layer.
    pub fn is_wipeable(&self) -> bool {
        !self.is_layer_change && self.has_xy_position_changed && self.is_extruding
    }

    /// Copy of this position moved to a new machine XY.
    ///
    /// Program coordinates shift by the same amount so the origin offset
    /// is preserved.
    pub fn moved_to(&self, xy: Point2) -> WipePosition {
        let delta: Vec2 = xy - self.xy();
        WipePosition {
            x: xy.x,
            y: xy.y,
            offset_x: self.offset_x + delta.x,
            offset_y: self.offset_y + delta.y,
            ..*self
        }
    }
}

/// Shorten the segment `from → to` by `excess_distance`, measured from the
/// `to` end.
///
/// Returns a new `to` position lying on the original segment; neither
/// input is modified.
pub fn clip_segment(
    excess_distance: f64,
    from: &WipePosition,
    to: &WipePosition,
    tolerance: &Tolerance,
) -> Result<WipePosition> {
    let length = from.distance_to(to);
    if tolerance.is_zero(length) {
        return Err(WipeError::DegenerateGeometry(format!(
            "cannot clip {excess_distance} mm from a zero-length segment at ({}, {})",
            from.x, from.y
        )));
    }
    let kept_ratio = (length - excess_distance) / length;
    let clipped = nozzle_wipe_math::lerp(&from.xy(), &to.xy(), kept_ratio);
    Ok(to.moved_to(clipped))
}
