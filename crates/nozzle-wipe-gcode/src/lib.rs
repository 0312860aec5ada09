#![warn(missing_docs)]

//! G-code front and back end for the nozzle wipe planner.
//!
//! This crate reads G-code into [`nozzle_wipe::WipePosition`] records,
//! feeds them to a [`nozzle_wipe::WipeEngine`], and renders the planned
//! wipes back out as G-code.
//!
//! # Example
//!
//! ```
//! use nozzle_wipe::WipeSettings;
//! use nozzle_wipe_gcode::{GcodeWriter, LineAction, TrackerSettings, WipeProcessor};
//!
//! let gcode = "M83\nG1 Z0.2\nG1 X0 Y0 E0.1\nG1 X10 Y0 E0.5\nG1 E-0.8 F2400\n";
//!
//! let mut processor =
//!     WipeProcessor::new(WipeSettings::default(), TrackerSettings::default(), true)?;
//! let writer = GcodeWriter::default();
//! let mut output = String::new();
//! for line in gcode.lines() {
//!     match processor.process_line(line)? {
//!         LineAction::Keep => {
//!             output.push_str(line);
//!             output.push('\n');
//!         }
//!         LineAction::Wipe(wipe) => output.push_str(&wipe.to_gcode(&writer)),
//!     }
//! }
//!
//! assert!(output.contains("; WIPE_START"));
//! assert!(!output.contains("G1 E-0.8 F2400"));
//! # Ok::<(), nozzle_wipe_gcode::GcodeError>(())
//! ```

pub mod error;
pub mod parser;
pub mod processor;
pub mod tracker;
pub mod writer;

pub use error::{GcodeError, Result};
pub use parser::{parse_line, Axes, GcodeCommand};
pub use processor::{LineAction, PlannedWipe, WipeProcessor};
pub use tracker::{PositionTracker, TrackedMove, TrackerSettings};
pub use writer::{format_coord, GcodeWriter};
