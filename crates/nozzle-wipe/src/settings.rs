//! Wipe settings and the geometry derived from them.

use nozzle_wipe_math::Tolerance;
use serde::{Deserialize, Serialize};

use crate::error::{Result, WipeError};

/// User-facing wipe parameters.
///
/// Feedrates are in mm/min, as they appear in G-code `F` words.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WipeSettings {
    /// Total filament to retract across the whole wipe (mm).
    pub retraction_length: f64,
    /// Fraction of the retraction done in place before wiping.
    pub retract_before_wipe_percent: f64,
    /// Fraction of the retraction done in place after wiping.
    pub retract_after_wipe_percent: f64,
    /// Feedrate while wiping.
    pub wipe_feedrate: f64,
    /// Feedrate for in-place retractions.
    pub retraction_feedrate: f64,
    /// Feedrate for non-retracting travel back over the trail.
    pub xy_travel_speed: f64,
}

impl Default for WipeSettings {
    fn default() -> Self {
        Self {
            retraction_length: 0.8,
            retract_before_wipe_percent: 0.2,
            retract_after_wipe_percent: 0.2,
            wipe_feedrate: 3000.0,
            retraction_feedrate: 2400.0,
            xy_travel_speed: 9000.0,
        }
    }
}

impl WipeSettings {
    /// Copy with the before/after percentages clamped to be non-negative
    /// and scaled down proportionally if together they exceed 100 %.
    pub fn normalized(&self, tolerance: &Tolerance) -> Self {
        let mut settings = *self;
        if tolerance.less_than(settings.retract_before_wipe_percent, 0.0) {
            settings.retract_before_wipe_percent = 0.0;
        }
        if tolerance.less_than(settings.retract_after_wipe_percent, 0.0) {
            settings.retract_after_wipe_percent = 0.0;
        }
        let total = settings.retract_before_wipe_percent + settings.retract_after_wipe_percent;
        if tolerance.greater_than(total, 1.0) {
            let reduction = 1.0 / total;
            settings.retract_before_wipe_percent *= reduction;
            settings.retract_after_wipe_percent *= reduction;
        }
        settings
    }

    /// Reject values that cannot describe a physical wipe.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("retraction_length", self.retraction_length),
            ("retract_before_wipe_percent", self.retract_before_wipe_percent),
            ("retract_after_wipe_percent", self.retract_after_wipe_percent),
            ("wipe_feedrate", self.wipe_feedrate),
            ("retraction_feedrate", self.retraction_feedrate),
            ("xy_travel_speed", self.xy_travel_speed),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(WipeError::InvalidSettings(format!(
                    "{name} must be finite, got {value}"
                )));
            }
        }
        if self.retraction_length <= 0.0 {
            return Err(WipeError::InvalidSettings(
                "retraction_length must be positive".into(),
            ));
        }
        if self.retraction_feedrate <= 0.0 {
            return Err(WipeError::InvalidSettings(
                "retraction_feedrate must be positive".into(),
            ));
        }
        if self.wipe_feedrate <= 0.0 {
            return Err(WipeError::InvalidSettings(
                "wipe_feedrate must be positive".into(),
            ));
        }
        if self.xy_travel_speed <= 0.0 {
            return Err(WipeError::InvalidSettings(
                "xy_travel_speed must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Constants derived once from normalized settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WipeGeometry {
    /// The normalized settings these constants came from.
    pub settings: WipeSettings,
    /// Filament retracted in place before the wipe (mm).
    pub pre_wipe_retract_length: f64,
    /// Filament retracted in place after the wipe (mm).
    pub post_wipe_retract_length: f64,
    /// Filament retracted while moving (mm).
    pub wipe_retraction_length: f64,
    /// `wipe_feedrate / retraction_feedrate`.
    pub speed_ratio: f64,
    /// Path length of a full wipe (mm).
    pub wipe_distance: f64,
    /// Half of `wipe_distance`.
    pub half_wipe_distance: f64,
    /// Filament retracted per mm of wipe travel.
    pub distance_to_retraction_ratio: f64,
}

impl WipeGeometry {
    /// Validate and normalize `settings`, then derive the wipe constants.
    pub fn from_settings(settings: &WipeSettings, tolerance: &Tolerance) -> Result<Self> {
        settings.validate()?;
        let settings = settings.normalized(tolerance);

        let pre_wipe_retract_length =
            settings.retraction_length * settings.retract_before_wipe_percent;
        let post_wipe_retract_length =
            settings.retraction_length * settings.retract_after_wipe_percent;
        let wipe_retraction_length =
            settings.retraction_length - pre_wipe_retract_length - post_wipe_retract_length;
        let speed_ratio = settings.wipe_feedrate / settings.retraction_feedrate;
        let wipe_distance = wipe_retraction_length * speed_ratio;

        if !tolerance.greater_than(wipe_retraction_length, 0.0) {
            return Err(WipeError::InvalidSettings(format!(
                "no retraction left for the wipe itself ({:.1}% before + {:.1}% after)",
                settings.retract_before_wipe_percent * 100.0,
                settings.retract_after_wipe_percent * 100.0
            )));
        }
        if !tolerance.greater_than(wipe_distance, 0.0) || !wipe_distance.is_finite() {
            return Err(WipeError::InvalidSettings(format!(
                "wipe distance must be positive, got {wipe_distance}"
            )));
        }

        Ok(Self {
            settings,
            pre_wipe_retract_length,
            post_wipe_retract_length,
            wipe_retraction_length,
            speed_ratio,
            wipe_distance,
            half_wipe_distance: wipe_distance * 0.5,
            distance_to_retraction_ratio: wipe_retraction_length / wipe_distance,
        })
    }

    /// Filament to retract over `distance` mm of wipe travel.
    pub fn retraction_for(&self, distance: f64) -> f64 {
        distance * self.distance_to_retraction_ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn settings(before: f64, after: f64) -> WipeSettings {
        WipeSettings {
            retraction_length: 2.0,
            retract_before_wipe_percent: before,
            retract_after_wipe_percent: after,
            wipe_feedrate: 3000.0,
            retraction_feedrate: 1500.0,
            xy_travel_speed: 6000.0,
        }
    }

    #[test]
    fn test_derived_constants() {
        let g = WipeGeometry::from_settings(&settings(0.3, 0.3), &Tolerance::DEFAULT).unwrap();
        assert_relative_eq!(g.pre_wipe_retract_length, 0.6, epsilon = 1e-12);
        assert_relative_eq!(g.post_wipe_retract_length, 0.6, epsilon = 1e-12);
        assert_relative_eq!(g.wipe_retraction_length, 0.8, epsilon = 1e-12);
        assert_relative_eq!(g.speed_ratio, 2.0);
        assert_relative_eq!(g.wipe_distance, 1.6, epsilon = 1e-12);
        assert_relative_eq!(g.half_wipe_distance, 0.8, epsilon = 1e-12);
        assert_relative_eq!(g.distance_to_retraction_ratio, 0.5, epsilon = 1e-12);
        assert_relative_eq!(g.retraction_for(1.6), 0.8, epsilon = 1e-12);
    }

    #[test]
    fn test_negative_percents_clamped() {
        let s = settings(-0.5, 0.25).normalized(&Tolerance::DEFAULT);
        assert_eq!(s.retract_before_wipe_percent, 0.0);
        assert_eq!(s.retract_after_wipe_percent, 0.25);
    }

    #[test]
    fn test_percents_rescaled_when_over_one() {
        let s = settings(0.9, 0.6).normalized(&Tolerance::DEFAULT);
        assert_relative_eq!(s.retract_before_wipe_percent, 0.6, epsilon = 1e-12);
        assert_relative_eq!(s.retract_after_wipe_percent, 0.4, epsilon = 1e-12);
        assert!(s.retract_before_wipe_percent + s.retract_after_wipe_percent <= 1.0 + 1e-9);
    }

    #[test]
    fn test_percent_sum_bound_holds_for_many_inputs() {
        let tol = Tolerance::DEFAULT;
        for before in [-1.0, 0.0, 0.1, 0.5, 0.99, 1.0, 3.0] {
            for after in [-0.2, 0.0, 0.4, 0.7, 1.0, 10.0] {
                let s = settings(before, after).normalized(&tol);
                assert!(s.retract_before_wipe_percent >= 0.0);
                assert!(s.retract_after_wipe_percent >= 0.0);
                assert!(s.retract_before_wipe_percent + s.retract_after_wipe_percent <= 1.0 + 1e-6);
            }
        }
    }

    #[test]
    fn test_full_in_place_retraction_rejected() {
        let err = WipeGeometry::from_settings(&settings(0.5, 0.5), &Tolerance::DEFAULT).unwrap_err();
        assert!(matches!(err, WipeError::InvalidSettings(_)));
    }

    #[test]
    fn test_zero_feedrate_rejected() {
        let mut s = settings(0.1, 0.1);
        s.retraction_feedrate = 0.0;
        assert!(WipeGeometry::from_settings(&s, &Tolerance::DEFAULT).is_err());
        let mut s = settings(0.1, 0.1);
        s.wipe_feedrate = 0.0;
        assert!(WipeGeometry::from_settings(&s, &Tolerance::DEFAULT).is_err());
        let mut s = settings(0.1, 0.1);
        s.retraction_length = f64::NAN;
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_settings_from_toml() {
        let s: WipeSettings = toml::from_str(
            "retraction_length = 1.5\nwipe_feedrate = 4000.0\n",
        )
        .unwrap();
        assert_relative_eq!(s.retraction_length, 1.5);
        assert_relative_eq!(s.wipe_feedrate, 4000.0);
        assert_relative_eq!(s.retraction_feedrate, WipeSettings::default().retraction_feedrate);
    }
}
