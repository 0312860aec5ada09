//! End-to-end: G-code in, wipes out.

use approx::assert_relative_eq;
use nozzle_wipe::{relative_extrusion, WipeSettings};
use nozzle_wipe_gcode::{GcodeWriter, LineAction, TrackerSettings, WipeProcessor};

fn run(program: &str, full_wipe: bool) -> (Vec<String>, Vec<nozzle_wipe_gcode::PlannedWipe>) {
    let mut processor =
        WipeProcessor::new(WipeSettings::default(), TrackerSettings::default(), full_wipe)
            .unwrap();
    let writer = GcodeWriter::default();
    let mut output = Vec::new();
    let mut wipes = Vec::new();
    for line in program.lines() {
        match processor.process_line(line).unwrap() {
            LineAction::Keep => output.push(line.to_string()),
            LineAction::Wipe(wipe) => {
                output.extend(wipe.to_gcode(&writer).lines().map(str::to_string));
                wipes.push(wipe);
            }
        }
    }
    (output, wipes)
}

const ABSOLUTE_SQUARE: &str = "\
G90
M82
G92 E0
G1 Z0.2 F600
G1 X10 Y10 F9000
G1 X20 Y10 E0.5 F1800
G1 X20 Y20 E1.0
G1 X10 Y20 E1.5
G1 X10 Y10 E2.0
G1 E1.2 F2400
G1 X50 Y50 F9000
";

#[test]
fn test_absolute_extrusion_square() {
    let (output, wipes) = run(ABSOLUTE_SQUARE, true);
    assert_eq!(wipes.len(), 1);
    assert_eq!(wipes[0].line, 10);

    let start = output.iter().position(|l| l == "; WIPE_START").unwrap();
    let end = output.iter().position(|l| l == "; WIPE_END").unwrap();
    assert_eq!(
        &output[start + 1..end],
        &[
            "G1 E1.84000 F2400",
            "G1 X10.000 Y10.600 E1.36000 F3000",
            "G1 X10.000 Y10.000 F9000",
            "G1 E1.20000 F2400",
            "G92 E1.20000",
            "G1 F2400",
        ]
    );
    // the retraction line itself is gone, the rest is untouched
    assert!(!output.iter().any(|l| l == "G1 E1.2 F2400"));
    assert_eq!(output.last().map(String::as_str), Some("G1 X50 Y50 F9000"));
}

#[test]
fn test_relative_extrusion_retracts_full_length() {
    let program = "\
M83
G1 Z0.3
G1 X0 Y0 E0.1
G1 X0.2 Y0 E0.05
G1 X0.4 Y0 E0.05
G1 X0.6 Y0 E0.05
G1 X0.8 Y0 E0.05
G1 X1.0 Y0 E0.05
G1 E-0.8
";
    for full_wipe in [true, false] {
        let (_, wipes) = run(program, full_wipe);
        assert_eq!(wipes.len(), 1);
        let wipe = &wipes[0];
        assert_eq!(wipe.resync_e, None);
        assert_relative_eq!(relative_extrusion(&wipe.steps), -0.8, epsilon = 1e-9);
        // the head ends where the retraction happened
        let last_move = wipe.steps.iter().rev().find(|s| s.is_move()).unwrap();
        assert_relative_eq!(last_move.x.unwrap(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(last_move.y.unwrap(), 0.0, epsilon = 1e-9);
    }
}

#[test]
fn test_layer_change_and_travel_prevent_wipes() {
    let program = "\
M83
G1 Z0.2
G1 X0 Y0 E0.1
G1 X5 Y0 E0.5
G1 Z0.4
G1 X6 Y0 E0.1
G1 E-0.8
G1 X5 Y5
G1 E-0.8
";
    let (output, wipes) = run(program, true);
    // first move of the new layer restarts the trail, so the first
    // retraction has nothing to wipe over; the second follows a travel
    assert!(wipes.is_empty());
    assert_eq!(output.len(), program.lines().count());
}
