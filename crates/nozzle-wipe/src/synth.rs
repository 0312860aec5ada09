//! Turning the trail into wipe moves.
//!
//! A wipe retraces the trail from the newest position back to the anchor
//! and then returns to the newest position, so the nozzle only ever moves
//! over plastic it has just laid down:
//!
//! ```text
//!   anchor ── p0 ── p1 ── p2 (newest)
//!
//!   outbound: p2 → p1 → p0 → anchor      (retracting)
//!   return:   anchor → p0 → p1 → p2      (travel for a full wipe,
//!                                         retracting for a half wipe)
//! ```
//!
//! In-place retractions before and after the motion make up the rest of
//! the configured retraction length.

use tracing::debug;

use crate::engine::WipeEngine;
use crate::error::Result;
use nozzle_wipe_math::Tolerance;

use crate::position::{clip_segment, WipePosition};
use crate::settings::WipeGeometry;
use crate::step::WipeStep;

/// Trail seen as a path ending at the anchor.
///
/// `entries` runs from the turn-around entry (the one next to the anchor)
/// to the newest position.
#[derive(Debug, Clone)]
struct WipeTrail {
    anchor: WipePosition,
    entries: Vec<WipePosition>,
}

impl WipeTrail {
    fn new(anchor: WipePosition, entries: Vec<WipePosition>) -> Self {
        Self { anchor, entries }
    }

    /// Shorten the trail by `excess` from the anchor end.
    ///
    /// Whole segments are dropped first (the target can shrink below the
    /// oldest segment after a switch to half wipes), then the remaining
    /// excess is clipped off the new oldest segment.
    fn trim(&mut self, mut excess: f64, tolerance: &Tolerance) -> Result<()> {
        while self.entries.len() > 1 {
            let oldest = self.anchor.distance_to(&self.entries[0]);
            if tolerance.less_than(excess, oldest) {
                break;
            }
            excess -= oldest;
            self.anchor = self.entries.remove(0);
        }
        if tolerance.greater_than(excess, 0.0) {
            self.anchor = clip_segment(excess, self.turn(), &self.anchor, tolerance)?;
        }
        Ok(())
    }

    fn turn(&self) -> &WipePosition {
        &self.entries[0]
    }

    fn newest(&self) -> &WipePosition {
        &self.entries[self.entries.len() - 1]
    }

    /// Segments walked from the newest entry back to the turn-around entry.
    fn outbound(&self) -> impl Iterator<Item = (&WipePosition, &WipePosition)> {
        self.entries.windows(2).rev().map(|pair| (&pair[1], &pair[0]))
    }

    /// Segments walked from the turn-around entry forward to the newest.
    fn inbound(&self) -> impl Iterator<Item = (&WipePosition, &WipePosition)> {
        self.entries.windows(2).map(|pair| (&pair[0], &pair[1]))
    }
}

/// Accumulates steps while tracking extruder position and feedrate.
struct StepBuilder<'a> {
    geometry: &'a WipeGeometry,
    use_full_wipe: bool,
    steps: Vec<WipeStep>,
    /// Program-coordinate E after the last emitted step.
    offset_e: f64,
    /// Feedrate to attach to the next emitted move.
    pending_feedrate: Option<f64>,
}

impl StepBuilder<'_> {
    fn retract(&mut self, length: f64, extruder_relative: bool, feedrate: Option<f64>) {
        self.offset_e -= length;
        let e = if extruder_relative { -length } else { self.offset_e };
        self.push(WipeStep::retract(e, feedrate));
    }

    fn segment(&mut self, from: &WipePosition, to: &WipePosition, is_return: bool) {
        self.segment_with_length(from, to, from.distance_to(to), is_return);
    }

    fn segment_with_length(
        &mut self,
        from: &WipePosition,
        to: &WipePosition,
        length: f64,
        is_return: bool,
    ) {
        let (x, y) = if to.is_xy_relative {
            (to.x - from.x, to.y - from.y)
        } else {
            (to.offset_x, to.offset_y)
        };
        let feedrate = self.pending_feedrate.take();

        if self.use_full_wipe && is_return {
            self.push(WipeStep::travel(x, y, feedrate));
            return;
        }

        let retraction = self.geometry.retraction_for(length);
        self.offset_e -= retraction;
        let e = if to.is_extruder_relative {
            -retraction
        } else {
            self.offset_e
        };
        self.push(WipeStep::wipe(x, y, e, feedrate));
    }

    fn push(&mut self, step: WipeStep) {
        self.steps.push(step);
    }
}

impl WipeEngine {
    /// Plan a wipe over the current trail.
    ///
    /// Returns no steps when there is nothing to wipe over. The engine's
    /// trail is left untouched; clipping happens on copies.
    pub fn synthesize_wipe_steps(&self) -> Result<Vec<WipeStep>> {
        let geometry = self.geometry()?;
        let Some(anchor) = self.starting_position else {
            return Ok(Vec::new());
        };
        if self.history.is_empty() || self.tolerance.is_zero(self.total_distance) {
            return Ok(Vec::new());
        }
        let settings = &geometry.settings;

        let mut post_wipe_retract_length = geometry.post_wipe_retract_length;
        let missing_retraction = self.missing_retraction()?;
        if self.tolerance.greater_than_or_equal(missing_retraction, 0.0) {
            post_wipe_retract_length += missing_retraction.max(0.0);
        }

        // the window is stored oldest first, so the turn-around entry is
        // always at index 0
        let (entries, _) = self.history.all_with_anchor_index();
        let mut trail = WipeTrail::new(anchor, entries);

        let extra_distance = self.extra_distance()?;
        if self.tolerance.greater_than(extra_distance, 0.0) {
            trail.trim(extra_distance, &self.tolerance)?;
        }

        let newest = *trail.newest();
        let mut builder = StepBuilder {
            geometry,
            use_full_wipe: self.use_full_wipe,
            steps: Vec::with_capacity(2 * trail.entries.len() + 4),
            offset_e: newest.offset_e,
            pending_feedrate: Some(settings.wipe_feedrate),
        };

        if self.tolerance.greater_than(geometry.pre_wipe_retract_length, 0.0) {
            builder.retract(
                geometry.pre_wipe_retract_length,
                newest.is_extruder_relative,
                Some(settings.retraction_feedrate),
            );
        }

        for (from, to) in trail.outbound() {
            builder.segment(from, to, false);
        }

        // Out to the anchor and straight back; both legs cover the same
        // (possibly clipped) segment.
        let turn = *trail.turn();
        let bridge_length = turn.distance_to(&trail.anchor);
        builder.segment_with_length(&turn, &trail.anchor, bridge_length, false);
        if self.use_full_wipe {
            builder.pending_feedrate = Some(settings.xy_travel_speed);
        }
        builder.segment_with_length(&trail.anchor, &turn, bridge_length, true);

        for (from, to) in trail.inbound() {
            builder.segment(from, to, true);
        }

        if self.tolerance.greater_than(post_wipe_retract_length, 0.0) {
            let feedrate = (!self
                .tolerance
                .equal(settings.retraction_feedrate, settings.wipe_feedrate))
            .then_some(settings.retraction_feedrate);
            builder.retract(post_wipe_retract_length, newest.is_extruder_relative, feedrate);
        }

        debug!(
            steps = builder.steps.len(),
            trail = trail.entries.len(),
            clipped = extra_distance.max(0.0),
            post_retract = post_wipe_retract_length,
            "synthesized wipe"
        );
        Ok(builder.steps)
    }
}
