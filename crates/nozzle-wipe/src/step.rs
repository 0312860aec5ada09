//! Motion commands produced by the wipe planner.

use serde::{Deserialize, Serialize};

/// One linear move of a planned wipe.
///
/// `x`/`y` are relative deltas or absolute program coordinates, matching
/// the XY mode of the position that produced the step. `e` is a relative
/// amount or an absolute program-coordinate E value, matching the extruder
/// mode. A `None` feedrate means the previous feedrate carries over.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WipeStep {
    /// X word, if the step moves.
    pub x: Option<f64>,
    /// Y word, if the step moves.
    pub y: Option<f64>,
    /// E word, if the step retracts.
    pub e: Option<f64>,
    /// Feedrate in mm/min, if it changes.
    pub feedrate: Option<f64>,
}

impl WipeStep {
    /// In-place retraction.
    pub fn retract(e: f64, feedrate: Option<f64>) -> Self {
        Self {
            e: Some(e),
            feedrate,
            ..Default::default()
        }
    }

    /// XY move that retracts while it travels.
    pub fn wipe(x: f64, y: f64, e: f64, feedrate: Option<f64>) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            e: Some(e),
            feedrate,
        }
    }

    /// XY move with no extruder motion.
    pub fn travel(x: f64, y: f64, feedrate: Option<f64>) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            e: None,
            feedrate,
        }
    }

    /// The step moves the head in XY.
    pub fn is_move(&self) -> bool {
        self.x.is_some() || self.y.is_some()
    }

    /// The step moves the extruder.
    pub fn is_retraction(&self) -> bool {
        self.e.is_some()
    }
}

/// Net extruder motion of steps produced in relative extruder mode.
pub fn relative_extrusion(steps: &[WipeStep]) -> f64 {
    steps.iter().filter_map(|step| step.e).sum()
}
