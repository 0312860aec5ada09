//! Streaming a G-code program through the tracker and the wipe engine.

use nozzle_wipe::{WipeEngine, WipeSettings, WipeStep};
use nozzle_wipe_math::Tolerance;
use tracing::{debug, trace};

use crate::error::Result;
use crate::parser::parse_line;
use crate::tracker::{PositionTracker, TrackerSettings};
use crate::writer::GcodeWriter;

/// A wipe planned in place of one retraction line.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedWipe {
    /// 1-based line number of the retraction.
    pub line: usize,
    /// Trail entries the wipe covers.
    pub trail_len: usize,
    /// Trail length before clipping (mm).
    pub trail_distance: f64,
    /// The wipe itself.
    pub steps: Vec<WipeStep>,
    /// E value the program expects after its retraction, when the
    /// extruder is in absolute mode.
    pub resync_e: Option<f64>,
    /// Feedrate the program was running at, to restore afterwards.
    pub restore_feedrate: Option<f64>,
}

impl PlannedWipe {
    /// Render the wipe and its trailing resync commands.
    pub fn to_gcode(&self, writer: &GcodeWriter) -> String {
        let mut output = String::from("; WIPE_START\n");
        output.push_str(&writer.write_steps(&self.steps));
        if let Some(e) = self.resync_e {
            output.push_str(&writer.set_extruder(e));
            output.push('\n');
        }
        if let Some(f) = self.restore_feedrate {
            output.push_str(&writer.set_feedrate(f));
            output.push('\n');
        }
        output.push_str("; WIPE_END\n");
        output
    }
}

/// What to do with a line of the input program.
#[derive(Debug, Clone, PartialEq)]
pub enum LineAction {
    /// Emit the line unchanged.
    Keep,
    /// Emit the planned wipe instead of the line.
    Wipe(PlannedWipe),
}

/// Feeds every line of a program to a [`PositionTracker`] and a
/// [`WipeEngine`], planning a wipe at each retraction that follows a
/// wipeable trail.
#[derive(Debug, Clone)]
pub struct WipeProcessor {
    tracker: PositionTracker,
    engine: WipeEngine,
    line: usize,
}

impl WipeProcessor {
    /// Build a processor; fails if the wipe settings are unusable.
    pub fn new(
        settings: WipeSettings,
        tracker_settings: TrackerSettings,
        full_wipe: bool,
    ) -> Result<Self> {
        let mut engine = WipeEngine::with_settings(settings)?;
        engine.set_full_wipe(full_wipe);
        Ok(Self {
            tracker: PositionTracker::new(tracker_settings),
            engine,
            line: 0,
        })
    }

    /// The wipe engine, for inspection.
    pub fn engine(&self) -> &WipeEngine {
        &self.engine
    }

    /// The position tracker, for inspection.
    pub fn tracker(&self) -> &PositionTracker {
        &self.tracker
    }

    /// Process the next line of the program.
    pub fn process_line(&mut self, text: &str) -> Result<LineAction> {
        self.line += 1;
        let Some(command) = parse_line(self.line, text)? else {
            return Ok(LineAction::Keep);
        };
        let Some(tracked) = self.tracker.apply(&command) else {
            return Ok(LineAction::Keep);
        };

        let mut action = LineAction::Keep;
        if tracked.is_retraction && self.engine.window_len() > 0 {
            let mut steps = self.engine.synthesize_wipe_steps()?;
            if !steps.is_empty() {
                pin_post_retraction_feedrate(
                    &mut steps,
                    self.engine.settings()?.retraction_feedrate,
                );
                debug!(
                    line = self.line,
                    steps = steps.len(),
                    trail = self.engine.total_distance(),
                    "planned wipe"
                );
                action = LineAction::Wipe(PlannedWipe {
                    line: self.line,
                    trail_len: self.engine.window_len(),
                    trail_distance: self.engine.total_distance(),
                    steps,
                    resync_e: (!tracked.current.is_extruder_relative)
                        .then_some(tracked.current.offset_e),
                    restore_feedrate: self.tracker.feedrate(),
                });
            }
        }

        self.engine.update(&tracked.current, &tracked.previous)?;
        trace!(line = self.line, trail = self.engine.window_len(), "tracked move");
        Ok(action)
    }
}

/// Give a trailing in-place retraction its own feedrate when it would
/// otherwise inherit a different one from the moves before it (a full wipe
/// ends on a travel move, so the retraction would run at travel speed).
fn pin_post_retraction_feedrate(steps: &mut [WipeStep], retraction_feedrate: f64) {
    let Some((last, earlier)) = steps.split_last_mut() else {
        return;
    };
    if last.is_move() || last.feedrate.is_some() {
        return;
    }
    let inherited = earlier.iter().rev().find_map(|step| step.feedrate);
    if let Some(inherited) = inherited {
        if !Tolerance::DEFAULT.equal(inherited, retraction_feedrate) {
            last.feedrate = Some(retraction_feedrate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processor() -> WipeProcessor {
        WipeProcessor::new(WipeSettings::default(), TrackerSettings::default(), true).unwrap()
    }

    #[test]
    fn test_retraction_without_trail_is_kept() {
        let mut p = processor();
        assert_eq!(p.process_line("G1 E-0.8 F2400").unwrap(), LineAction::Keep);
    }

    #[test]
    fn test_retraction_after_extrusion_becomes_wipe() {
        let mut p = processor();
        for line in ["M83", "G1 Z0.2", "G1 X0 Y0", "G1 X10 E0.5", "G1 X20 E0.5"] {
            assert_eq!(p.process_line(line).unwrap(), LineAction::Keep);
        }
        match p.process_line("G1 E-0.8 F2400").unwrap() {
            LineAction::Wipe(wipe) => {
                assert_eq!(wipe.line, 6);
                assert!(!wipe.steps.is_empty());
                assert_eq!(wipe.resync_e, None);
                assert_eq!(wipe.restore_feedrate, Some(2400.0));
            }
            LineAction::Keep => panic!("expected a wipe"),
        }
        // the retraction itself ends the trail
        assert_eq!(p.engine().window_len(), 0);
    }

    #[test]
    fn test_post_retraction_not_left_at_travel_speed() {
        let settings = WipeSettings {
            wipe_feedrate: 2400.0,
            retraction_feedrate: 2400.0,
            ..Default::default()
        };
        let mut p = WipeProcessor::new(settings, TrackerSettings::default(), true).unwrap();
        for line in ["M83", "G1 Z0.2", "G1 X0 Y0", "G1 X10 E0.5", "G1 X20 E0.5"] {
            p.process_line(line).unwrap();
        }
        let LineAction::Wipe(wipe) = p.process_line("G1 E-0.8").unwrap() else {
            panic!("expected a wipe");
        };
        // travel back at 9000, then the retraction needs 2400 again
        let travel = &wipe.steps[wipe.steps.len() - 2];
        assert_eq!(travel.feedrate, Some(9000.0));
        assert_eq!(wipe.steps.last().unwrap().feedrate, Some(2400.0));
    }

    #[test]
    fn test_pin_post_retraction_feedrate() {
        let mut half = vec![
            WipeStep::retract(-0.1, Some(2400.0)),
            WipeStep::wipe(1.0, 0.0, -0.2, Some(2400.0)),
            WipeStep::retract(-0.1, None),
        ];
        pin_post_retraction_feedrate(&mut half, 2400.0);
        assert_eq!(half[2].feedrate, None);

        let mut full = vec![
            WipeStep::wipe(1.0, 0.0, -0.2, Some(2400.0)),
            WipeStep::travel(2.0, 0.0, Some(9000.0)),
            WipeStep::retract(-0.1, None),
        ];
        pin_post_retraction_feedrate(&mut full, 2400.0);
        assert_eq!(full[2].feedrate, Some(2400.0));

        let mut no_post = vec![WipeStep::travel(2.0, 0.0, Some(9000.0))];
        pin_post_retraction_feedrate(&mut no_post, 2400.0);
        assert_eq!(no_post[0].feedrate, Some(9000.0));
    }

    #[test]
    fn test_to_gcode_brackets_wipe() {
        let wipe = PlannedWipe {
            line: 1,
            trail_len: 1,
            trail_distance: 1.0,
            steps: vec![WipeStep::retract(-0.5, Some(2400.0))],
            resync_e: Some(4.2),
            restore_feedrate: Some(1800.0),
        };
        let text = wipe.to_gcode(&GcodeWriter::default());
        assert_eq!(
            text,
            "; WIPE_START\nG1 E-0.50000 F2400\nG92 E4.20000\nG1 F1800\n; WIPE_END\n"
        );
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let settings = WipeSettings {
            retract_before_wipe_percent: 0.5,
            retract_after_wipe_percent: 0.5,
            ..Default::default()
        };
        assert!(WipeProcessor::new(settings, TrackerSettings::default(), true).is_err());
    }
}
