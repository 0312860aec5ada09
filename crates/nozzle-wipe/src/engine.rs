//! Online bookkeeping of the wipeable trail.
//!
//! The engine is fed every move of a G-code stream and keeps the most
//! recent stretch of continuous extrusion on the current layer, trimmed
//! to roughly the length a wipe needs. The wipe itself is produced by
//! [`WipeEngine::synthesize_wipe_steps`].

use nozzle_wipe_math::Tolerance;
use tracing::{debug, trace};

use crate::error::{Result, WipeError};
use crate::history::PositionHistory;
use crate::position::WipePosition;
use crate::settings::{WipeGeometry, WipeSettings};

/// What [`WipeEngine::undo`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoOutcome {
    /// The most recent update was reverted.
    Reverted,
    /// No update has happened since the last undo (or ever).
    NothingToUndo,
}

#[derive(Debug, Clone, Copy)]
struct EngineSnapshot {
    starting_position: Option<WipePosition>,
    total_distance: f64,
}

/// Stateful wipe planner for one G-code stream.
#[derive(Debug, Clone)]
pub struct WipeEngine {
    pub(crate) geometry: Option<WipeGeometry>,
    pub(crate) tolerance: Tolerance,
    pub(crate) use_full_wipe: bool,
    pub(crate) total_distance: f64,
    pub(crate) starting_position: Option<WipePosition>,
    pub(crate) history: PositionHistory,
    undo_snapshot: Option<EngineSnapshot>,
}

impl Default for WipeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl WipeEngine {
    /// Create an engine with no settings. Every operation reports
    /// [`WipeError::NotInitialized`] until [`initialize`](Self::initialize) succeeds.
    pub fn new() -> Self {
        Self {
            geometry: None,
            tolerance: Tolerance::DEFAULT,
            use_full_wipe: true,
            total_distance: 0.0,
            starting_position: None,
            history: PositionHistory::new(),
            undo_snapshot: None,
        }
    }

    /// Create and initialize an engine in one go.
    pub fn with_settings(settings: WipeSettings) -> Result<Self> {
        let mut engine = Self::new();
        engine.initialize(settings)?;
        Ok(engine)
    }

    /// Derive the wipe geometry from `settings` and reset all trail state.
    ///
    /// On error the engine keeps its previous configuration.
    pub fn initialize(&mut self, settings: WipeSettings) -> Result<()> {
        let geometry = WipeGeometry::from_settings(&settings, &self.tolerance)?;
        debug!(
            pre = geometry.pre_wipe_retract_length,
            post = geometry.post_wipe_retract_length,
            wipe_distance = geometry.wipe_distance,
            ratio = geometry.distance_to_retraction_ratio,
            "wipe engine initialized"
        );
        self.geometry = Some(geometry);
        self.total_distance = 0.0;
        self.starting_position = None;
        self.history = PositionHistory::new();
        self.undo_snapshot = None;
        Ok(())
    }

    /// Whether [`initialize`](Self::initialize) has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.geometry.is_some()
    }

    /// Derived wipe constants.
    pub fn geometry(&self) -> Result<&WipeGeometry> {
        self.geometry.as_ref().ok_or(WipeError::NotInitialized)
    }

    /// Normalized settings in use.
    pub fn settings(&self) -> Result<&WipeSettings> {
        self.geometry().map(|g| &g.settings)
    }

    /// Wipe over the full distance (out and back, retracting only on the
    /// way out) or over half of it (retracting both ways).
    pub fn set_full_wipe(&mut self, use_full_wipe: bool) {
        self.use_full_wipe = use_full_wipe;
    }

    /// See [`set_full_wipe`](Self::set_full_wipe).
    pub fn is_full_wipe(&self) -> bool {
        self.use_full_wipe
    }

    /// Accumulated XY length of the trail (mm).
    pub fn total_distance(&self) -> f64 {
        self.total_distance
    }

    /// Position immediately before the oldest trail entry.
    pub fn starting_position(&self) -> Option<&WipePosition> {
        self.starting_position.as_ref()
    }

    /// Number of positions in the trail.
    pub fn window_len(&self) -> usize {
        self.history.len()
    }

    /// The trail, oldest first.
    pub fn window(&self) -> &PositionHistory {
        &self.history
    }

    /// Trail length the engine aims to keep.
    pub fn wipe_target(&self) -> Result<f64> {
        let geometry = self.geometry()?;
        Ok(if self.use_full_wipe {
            geometry.wipe_distance
        } else {
            geometry.half_wipe_distance
        })
    }

    /// Retraction the wipe motion cannot absorb because the trail is
    /// shorter than the target. Negative when the trail is long enough.
    pub fn missing_retraction(&self) -> Result<f64> {
        let geometry = self.geometry()?;
        let shortfall = self.wipe_target()? - self.total_distance;
        // a half wipe retracts in both directions
        let passes = if self.use_full_wipe { 1.0 } else { 2.0 };
        Ok(geometry.retraction_for(shortfall * passes))
    }

    /// Trail length beyond the target that synthesis must clip off.
    pub fn extra_distance(&self) -> Result<f64> {
        Ok(self.total_distance - self.wipe_target()?)
    }

    /// Feed one move, `previous → current`, into the trail.
    pub fn update(&mut self, current: &WipePosition, previous: &WipePosition) -> Result<()> {
        if self.geometry.is_none() {
            return Err(WipeError::NotInitialized);
        }
        self.save_undo_data();

        if !current.is_wipeable() {
            if !self.history.is_empty() {
                debug!(
                    layer_change = current.is_layer_change,
                    distance = self.total_distance,
                    "wipe trail invalidated"
                );
            }
            self.total_distance = 0.0;
            self.starting_position = None;
            self.history.clear();
            return Ok(());
        }

        if self.history.is_empty() {
            self.starting_position = Some(*previous);
            self.total_distance = 0.0;
        }
        self.history.push_back(*current);
        self.total_distance += previous.distance_to(current);
        self.prune()
    }

    /// Drop the oldest trail entries while the trail stays at least as long
    /// as the target.
    fn prune(&mut self) -> Result<()> {
        let target = self.wipe_target()?;
        while self.total_distance > target {
            let (Some(anchor), Some(oldest)) = (self.starting_position.as_ref(), self.history.peek())
            else {
                break;
            };
            let removed = anchor.distance_to(oldest);
            let remaining = self.total_distance - removed;
            if self.tolerance.less_than(remaining, target) {
                break;
            }
            trace!(removed, remaining, "pruned wipe trail entry");
            self.starting_position = self.history.remove_oldest();
            self.total_distance = remaining;
        }
        Ok(())
    }

    fn save_undo_data(&mut self) {
        self.undo_snapshot = Some(EngineSnapshot {
            starting_position: self.starting_position,
            total_distance: self.total_distance,
        });
        self.history.save_snapshot();
    }

    /// Revert the most recent [`update`](Self::update).
    ///
    /// Only one level is kept: a second call without an intervening update
    /// returns [`UndoOutcome::NothingToUndo`] and changes nothing.
    pub fn undo(&mut self) -> Result<UndoOutcome> {
        if self.geometry.is_none() {
            return Err(WipeError::NotInitialized);
        }
        let Some(snapshot) = self.undo_snapshot.take() else {
            return Ok(UndoOutcome::NothingToUndo);
        };
        self.starting_position = snapshot.starting_position;
        self.total_distance = snapshot.total_distance;
        self.history.restore_snapshot();
        trace!(distance = self.total_distance, "wipe update undone");
        Ok(UndoOutcome::Reverted)
    }
}
