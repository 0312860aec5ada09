//! Following the print head through a G-code program.

use nozzle_wipe::WipePosition;
use nozzle_wipe_math::Tolerance;
use serde::{Deserialize, Serialize};

use crate::parser::{Axes, GcodeCommand};

/// Firmware behaviour the tracker has to assume.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerSettings {
    /// `G90`/`G91` also switch the extruder mode (Marlin does this;
    /// `M82`/`M83` still override it afterwards).
    pub g90_influences_extruder: bool,
}

/// A move the tracker followed, with the head state on both ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedMove {
    /// State before the move.
    pub previous: WipePosition,
    /// State after the move.
    pub current: WipePosition,
    /// Change in E over the move (mm of filament).
    pub e_delta: f64,
    /// The move pulled filament back without moving in XY.
    pub is_retraction: bool,
}

/// Machine state accumulated from the commands seen so far.
#[derive(Debug, Clone)]
pub struct PositionTracker {
    settings: TrackerSettings,
    tolerance: Tolerance,
    /// Machine coordinates.
    x: f64,
    y: f64,
    z: f64,
    e: f64,
    /// `G92` origin, so program coordinate = machine - origin.
    origin: [f64; 4],
    xy_relative: bool,
    extruder_relative: bool,
    feedrate: Option<f64>,
    last_extrusion_z: Option<f64>,
    current: WipePosition,
}

impl Default for PositionTracker {
    fn default() -> Self {
        Self::new(TrackerSettings::default())
    }
}

impl PositionTracker {
    /// Start at the origin in absolute mode, as firmware does after reset.
    pub fn new(settings: TrackerSettings) -> Self {
        Self {
            settings,
            tolerance: Tolerance::DEFAULT,
            x: 0.0,
            y: 0.0,
            z: 0.0,
            e: 0.0,
            origin: [0.0; 4],
            xy_relative: false,
            extruder_relative: false,
            feedrate: None,
            last_extrusion_z: None,
            current: WipePosition::default(),
        }
    }

    /// Most recent head state.
    pub fn position(&self) -> &WipePosition {
        &self.current
    }

    /// Last `F` value seen, if any.
    pub fn feedrate(&self) -> Option<f64> {
        self.feedrate
    }

    /// Machine Z.
    pub fn z(&self) -> f64 {
        self.z
    }

    /// XY axes are relative.
    pub fn is_xy_relative(&self) -> bool {
        self.xy_relative
    }

    /// Extruder is relative.
    pub fn is_extruder_relative(&self) -> bool {
        self.extruder_relative
    }

    /// Apply one command. Returns the move it caused, if any.
    pub fn apply(&mut self, command: &GcodeCommand) -> Option<TrackedMove> {
        match command {
            GcodeCommand::Move { axes, feedrate } => {
                if feedrate.is_some() {
                    self.feedrate = *feedrate;
                }
                Some(self.linear_move(axes))
            }
            GcodeCommand::Home { axes } => Some(self.home(axes)),
            GcodeCommand::AbsolutePositioning => {
                self.xy_relative = false;
                if self.settings.g90_influences_extruder {
                    self.extruder_relative = false;
                }
                self.refresh_modes();
                None
            }
            GcodeCommand::RelativePositioning => {
                self.xy_relative = true;
                if self.settings.g90_influences_extruder {
                    self.extruder_relative = true;
                }
                self.refresh_modes();
                None
            }
            GcodeCommand::AbsoluteExtrusion => {
                self.extruder_relative = false;
                self.refresh_modes();
                None
            }
            GcodeCommand::RelativeExtrusion => {
                self.extruder_relative = true;
                self.refresh_modes();
                None
            }
            GcodeCommand::SetPosition(axes) => {
                let machine = [self.x, self.y, self.z, self.e];
                for (i, value) in [axes.x, axes.y, axes.z, axes.e].into_iter().enumerate() {
                    if let Some(value) = value {
                        self.origin[i] = machine[i] - value;
                    }
                }
                // a bare G92 resets every axis
                if axes.is_empty() {
                    self.origin = machine;
                }
                self.current = self.snapshot(false, false, false);
                None
            }
            GcodeCommand::Other(_) => None,
        }
    }

    fn target(&self, axis: usize, current: f64, word: Option<f64>, relative: bool) -> f64 {
        match word {
            Some(value) if relative => current + value,
            Some(value) => value + self.origin[axis],
            None => current,
        }
    }

    fn linear_move(&mut self, axes: &Axes) -> TrackedMove {
        let previous = self.current;
        let x = self.target(0, self.x, axes.x, self.xy_relative);
        let y = self.target(1, self.y, axes.y, self.xy_relative);
        let z = self.target(2, self.z, axes.z, self.xy_relative);
        let e = self.target(3, self.e, axes.e, self.extruder_relative);

        let e_delta = e - self.e;
        let has_xy_position_changed =
            !self.tolerance.equal(x, self.x) || !self.tolerance.equal(y, self.y);
        let is_extruding = self.tolerance.greater_than(e_delta, 0.0);

        self.x = x;
        self.y = y;
        self.z = z;
        self.e = e;

        let mut is_layer_change = false;
        if is_extruding {
            is_layer_change = match self.last_extrusion_z {
                Some(last) => self.tolerance.greater_than(z, last),
                None => true,
            };
            self.last_extrusion_z = Some(z);
        }

        self.current = self.snapshot(is_extruding, is_layer_change, has_xy_position_changed);
        TrackedMove {
            previous,
            current: self.current,
            e_delta,
            is_retraction: self.tolerance.less_than(e_delta, 0.0) && !has_xy_position_changed,
        }
    }

    fn home(&mut self, axes: &Axes) -> TrackedMove {
        let previous = self.current;
        let all = axes.x.is_none() && axes.y.is_none() && axes.z.is_none();
        let old_xy = (self.x, self.y);
        if all || axes.x.is_some() {
            self.x = 0.0;
            self.origin[0] = 0.0;
        }
        if all || axes.y.is_some() {
            self.y = 0.0;
            self.origin[1] = 0.0;
        }
        if all || axes.z.is_some() {
            self.z = 0.0;
            self.origin[2] = 0.0;
        }
        let moved = !self.tolerance.equal(old_xy.0, self.x) || !self.tolerance.equal(old_xy.1, self.y);
        self.current = self.snapshot(false, false, moved);
        TrackedMove {
            previous,
            current: self.current,
            e_delta: 0.0,
            is_retraction: false,
        }
    }

    fn refresh_modes(&mut self) {
        self.current.is_xy_relative = self.xy_relative;
        self.current.is_extruder_relative = self.extruder_relative;
    }

    fn snapshot(
        &self,
        is_extruding: bool,
        is_layer_change: bool,
        has_xy_position_changed: bool,
    ) -> WipePosition {
        WipePosition {
            x: self.x,
            y: self.y,
            offset_x: self.x - self.origin[0],
            offset_y: self.y - self.origin[1],
            offset_e: self.e - self.origin[3],
            is_extruding,
            is_layer_change,
            has_xy_position_changed,
            is_xy_relative: self.xy_relative,
            is_extruder_relative: self.extruder_relative,
        }
    }
}
