//! Rendering wipe steps as G-code.

use nozzle_wipe::WipeStep;
use serde::{Deserialize, Serialize};

/// Number formatting for emitted G-code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GcodeWriter {
    /// Decimal places for X/Y.
    pub coordinate_precision: usize,
    /// Decimal places for E.
    pub extrusion_precision: usize,
}

impl Default for GcodeWriter {
    fn default() -> Self {
        Self {
            coordinate_precision: 3,
            extrusion_precision: 5,
        }
    }
}

impl GcodeWriter {
    /// One `G1` line (no trailing newline) with the words the step carries.
    pub fn format_step(&self, step: &WipeStep) -> String {
        let mut line = String::from("G1");
        if let Some(x) = step.x {
            line.push_str(" X");
            line.push_str(&format_coord(x, self.coordinate_precision));
        }
        if let Some(y) = step.y {
            line.push_str(" Y");
            line.push_str(&format_coord(y, self.coordinate_precision));
        }
        if let Some(e) = step.e {
            line.push_str(" E");
            line.push_str(&format_coord(e, self.extrusion_precision));
        }
        if let Some(f) = step.feedrate {
            line.push_str(" F");
            line.push_str(&format_coord(f, 0));
        }
        line
    }

    /// All steps, one line each, newline terminated.
    pub fn write_steps(&self, steps: &[WipeStep]) -> String {
        let mut output = String::new();
        for step in steps {
            output.push_str(&self.format_step(step));
            output.push('\n');
        }
        output
    }

    /// `G92 E<value>` to resynchronise the extruder after a wipe.
    pub fn set_extruder(&self, e: f64) -> String {
        format!("G92 E{}", format_coord(e, self.extrusion_precision))
    }

    /// `G1 F<value>` to restore the program's feedrate after a wipe.
    pub fn set_feedrate(&self, feedrate: f64) -> String {
        format!("G1 F{}", format_coord(feedrate, 0))
    }
}

/// Format a value with fixed precision, never printing a negative zero.
pub fn format_coord(value: f64, precision: usize) -> String {
    let text = format!("{:.prec$}", value, prec = precision);
    if text.starts_with('-') && text[1..].chars().all(|c| c == '0' || c == '.') {
        text[1..].to_string()
    } else {
        text
    }
}
