// Implements the duty-ratio mapping for the bidirectional four-switch bridge.
// A scalar scaling factor (capacitor voltage over motor-bus voltage) selects
// which side of the bridge modulates; the other side runs generally-on. Each
// generalized duty ratio maps to a start/end compare pair for one bridge leg,
// with the capacitor leg phase-shifted by half a period for ripple
// cancellation.

// Licensed under the Apache License, Version 2.0
// Copyright 2024 Anton Khrustalev, creapunk.com

/// Full compare period of the bridge timer, counts.
pub const PERIOD_FULL: u16 = 27_200;
/// Half compare period, counts. The capacitor leg is mirrored around it.
pub const PERIOD_HALF: u16 = PERIOD_FULL / 2;

/// Derating from generalized to narrow duty, leaves switching dead-time margin.
const GENERAL_TO_NARROW_RATIO: f32 = 0.9;

/// Scaling factor ceiling (27 V capacitor bank over a 22 V chassis bus).
pub const FACTOR_MAX: f32 = 1.23;
/// Scaling factor floor (4 V capacitor bank over a 26 V chassis bus).
pub const FACTOR_MIN: f32 = 0.15;

const MOTOR_DUTY_MIN: f32 = 0.15;
const CAP_DUTY_MIN: f32 = 0.5;
const DUTY_MAX: f32 = 1.0;

/// Start/end compare values for one bridge leg.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct ComparePair {
    pub start: u16,
    pub end: u16,
}

/// Compare values for both bridge legs, ready for the timer driver.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct BridgeCompare {
    pub motor: ComparePair,
    pub cap: ComparePair,
}

impl BridgeCompare {
    /// Flattens to the timer channel order (motor start/end, cap start/end).
    pub fn as_channels(&self) -> [u16; 4] {
        [self.motor.start, self.motor.end, self.cap.start, self.cap.end]
    }
}

/// Converter duty state: bounded scaling factor, the generalized duty pair
/// derived from it and the resulting compare values.
pub struct Converter {
    factor: f32,
    duty_motor: f32,
    duty_cap: f32,
    compare: BridgeCompare,
}

impl Converter {
    /// Starts at factor 1.0: both legs generally-on, no net transfer.
    pub fn new() -> Self {
        let mut converter = Self {
            factor: 1.0,
            duty_motor: 1.0,
            duty_cap: 1.0,
            compare: BridgeCompare::default(),
        };
        converter.set_factor(1.0);
        converter
    }

    /// Applies a new scaling factor, recomputing both generalized duties and
    /// their compare pairs. The factor is clamped to the converter's range;
    /// out-of-range commands are never an error.
    pub fn set_factor(&mut self, factor: f32) {
        self.factor = factor.clamp(FACTOR_MIN, FACTOR_MAX);

        if self.factor <= 1.0 {
            // Bucking toward the motor bus: motor leg modulates
            self.duty_motor = self.factor.clamp(MOTOR_DUTY_MIN, DUTY_MAX);
            self.duty_cap = 1.0;
        } else {
            // Boosting from the capacitor side: capacitor leg modulates
            self.duty_motor = 1.0;
            self.duty_cap = (1.0 / self.factor).clamp(CAP_DUTY_MIN, DUTY_MAX);
        }

        self.compare = BridgeCompare {
            motor: Self::motor_leg(self.duty_motor),
            cap: Self::cap_leg(self.duty_cap),
        };
    }

    /// Motor-side leg: symmetric about the period midpoint.
    fn motor_leg(duty: f32) -> ComparePair {
        let duty = duty.clamp(MOTOR_DUTY_MIN, DUTY_MAX);
        let start = (duty * GENERAL_TO_NARROW_RATIO * PERIOD_HALF as f32) as u16;
        ComparePair {
            start,
            end: PERIOD_FULL - start,
        }
    }

    /// Capacitor-side leg: phase-shifted by half a period relative to the
    /// motor leg, mirrored around the half-period point.
    fn cap_leg(duty: f32) -> ComparePair {
        let duty = duty.clamp(CAP_DUTY_MIN, DUTY_MAX);
        let span = (duty * GENERAL_TO_NARROW_RATIO * PERIOD_HALF as f32) as u16;
        ComparePair {
            start: PERIOD_HALF + span,
            end: PERIOD_HALF - span,
        }
    }

    /// Current bounded scaling factor.
    pub fn factor(&self) -> f32 {
        self.factor
    }

    /// Generalized duties as (motor side, capacitor side).
    pub fn duties(&self) -> (f32, f32) {
        (self.duty_motor, self.duty_cap)
    }

    /// Compare values for both legs.
    pub fn compare(&self) -> BridgeCompare {
        self.compare
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unity_factor_runs_both_legs_generally_on() {
        let mut converter = Converter::new();
        converter.set_factor(1.0);
        assert_eq!(converter.duties(), (1.0, 1.0));
    }

    #[test]
    fn factor_is_clamped_to_converter_range() {
        let mut converter = Converter::new();
        converter.set_factor(5.0);
        assert_eq!(converter.factor(), FACTOR_MAX);
        converter.set_factor(-2.0);
        assert_eq!(converter.factor(), FACTOR_MIN);
    }

    #[test]
    fn buck_region_modulates_motor_leg_only() {
        let mut converter = Converter::new();
        converter.set_factor(0.5);
        let (motor, cap) = converter.duties();
        assert_eq!(motor, 0.5);
        assert_eq!(cap, 1.0);
    }

    #[test]
    fn boost_region_modulates_cap_leg_with_reciprocal() {
        let mut converter = Converter::new();
        converter.set_factor(1.2);
        let (motor, cap) = converter.duties();
        assert_eq!(motor, 1.0);
        assert!((cap - 1.0 / 1.2).abs() < 1e-6);
    }

    #[test]
    fn motor_leg_compare_is_symmetric_about_midpoint() {
        let mut converter = Converter::new();
        converter.set_factor(0.5);
        let pair = converter.compare().motor;
        // start = 0.5 * 0.9 * 13600, truncated
        let expected = (0.5f32 * 0.9 * PERIOD_HALF as f32) as u16;
        assert_eq!(pair.start, expected);
        assert_eq!(pair.end, PERIOD_FULL - expected);
    }

    #[test]
    fn cap_leg_is_half_period_shifted() {
        let mut converter = Converter::new();
        converter.set_factor(1.23);
        let pair = converter.compare().cap;
        let span = pair.start - PERIOD_HALF;
        assert_eq!(pair.end, PERIOD_HALF - span);
        // Boost duty 1/1.23 ≈ 0.813: span = 0.813 * 0.9 * 13600
        let expected = ((1.0 / 1.23f32) * 0.9 * PERIOD_HALF as f32) as u16;
        assert_eq!(span, expected);
    }

    #[test]
    fn compare_values_fit_the_timer_period() {
        let mut converter = Converter::new();
        for factor in [0.0, 0.15, 0.33, 0.9999, 1.0, 1.0001, 1.23, 2.0] {
            converter.set_factor(factor);
            for value in converter.compare().as_channels() {
                assert!(value <= PERIOD_FULL);
            }
        }
    }
}
