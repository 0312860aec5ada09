#![warn(missing_docs)]

//! Nozzle wipe planning for 3D printer motion streams.
//!
//! The [`WipeEngine`] watches the stream of print head positions and keeps
//! the most recent stretch of extrusion on the current layer. When the
//! caller is about to retract, [`WipeEngine::synthesize_wipe_steps`] turns
//! that stretch into a back-and-forth wipe whose total extruder motion
//! equals the configured retraction length.
//!
//! # Example
//!
//! ```
//! use nozzle_wipe::{WipeEngine, WipePosition, WipeSettings};
//!
//! let mut engine = WipeEngine::with_settings(WipeSettings::default())?;
//!
//! let mut previous = WipePosition::default();
//! for x in 1..=10 {
//!     let current = WipePosition {
//!         x: x as f64,
//!         offset_x: x as f64,
//!         offset_e: x as f64 * 0.05,
//!         is_extruding: true,
//!         has_xy_position_changed: true,
//!         ..Default::default()
//!     };
//!     engine.update(&current, &previous)?;
//!     previous = current;
//! }
//!
//! let steps = engine.synthesize_wipe_steps()?;
//! assert!(!steps.is_empty());
//! # Ok::<(), nozzle_wipe::WipeError>(())
//! ```

pub mod engine;
pub mod error;
pub mod history;
pub mod position;
pub mod settings;
pub mod step;
mod synth;

pub use engine::{UndoOutcome, WipeEngine};
pub use error::{Result, WipeError};
pub use history::PositionHistory;
pub use position::{clip_segment, WipePosition};
pub use settings::{WipeGeometry, WipeSettings};
pub use step::{relative_extrusion, WipeStep};
