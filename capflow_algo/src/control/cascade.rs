// Implements the four-loop cascade that turns a requested chassis power into
// a converter scaling factor while holding the capacitor bank inside its
// voltage and current envelope.

// Key Features:
// - Power loop tracks the commanded chassis power.
// - Two voltage-limit loops bound the capacitor state of charge.
// - Min-max override selection: the most restrictive loop wins.
// - Bumpless transfer keeps inactive loops synchronized with the active one.
// - Inner current loop converts the current reference into a duty factor.

// Licensed under the Apache License, Version 2.0
// Copyright 2024 Anton Khrustalev, creapunk.com

use super::pid::IncrementalPid;
use crate::analog::Measurements;
use crate::converter::{FACTOR_MAX, FACTOR_MIN};

/// Commanded chassis power ceiling, W.
pub const TARGET_POWER_MAX: f32 = 200.0;
/// Commanded chassis power floor, W.
pub const TARGET_POWER_MIN: f32 = 15.0;

/// Capacitor bank voltage ceiling, V. Setpoint of the upper limit loop.
pub const CAP_VOLTAGE_MAX: f32 = 26.0;
/// Capacitor bank voltage floor, V. Setpoint of the lower limit loop.
pub const CAP_VOLTAGE_MIN: f32 = 8.0;
/// Capacitor current envelope, A. Output bound of the three outer loops.
pub const CAP_CURRENT_MAX: f32 = 15.0;

/// Four cooperating PID loops with override selection.
pub struct PowerCascade {
    voltage_high: IncrementalPid, // Upper capacitor voltage limit loop
    voltage_low: IncrementalPid,  // Lower capacitor voltage limit loop
    power: IncrementalPid,        // Chassis power loop
    current: IncrementalPid,      // Inner capacitor current loop
}

impl PowerCascade {
    pub fn new() -> Self {
        let mut voltage_high =
            IncrementalPid::new(1.2, 0.15, 0.0, -CAP_CURRENT_MAX, CAP_CURRENT_MAX);
        voltage_high.set_setpoint(CAP_VOLTAGE_MAX);

        let mut voltage_low =
            IncrementalPid::new(1.2, 0.15, 0.0, -CAP_CURRENT_MAX, CAP_CURRENT_MAX);
        voltage_low.set_setpoint(CAP_VOLTAGE_MIN);

        let power = IncrementalPid::new(0.05, 0.012, 0.0, -CAP_CURRENT_MAX, CAP_CURRENT_MAX);

        let current = IncrementalPid::new(0.008, 0.0015, 0.0, FACTOR_MIN, FACTOR_MAX);

        Self {
            voltage_high,
            voltage_low,
            power,
            current,
        }
    }

    /// Runs one cascade step and returns the converter scaling factor.
    ///
    /// `target_power` is the externally requested chassis power; it is
    /// clamped to the commanded power band before entering the power loop.
    pub fn tick(&mut self, target_power: f32, m: &Measurements) -> f32 {
        self.power
            .set_setpoint(target_power.clamp(TARGET_POWER_MIN, TARGET_POWER_MAX));

        let h_out = self.voltage_high.compute(m.cap_voltage);
        let l_out = self.voltage_low.compute(m.cap_voltage);
        let p_out = self.power.compute(m.chassis_power());

        // Override selection: the limit loop with the most restrictive demand
        // takes the current reference; whichever loops lose track the winner
        // so their accumulators carry no stale error.
        let current_ref = if p_out > h_out {
            // Capacitor too full: upper voltage limit dominates
            self.power.force_output(h_out);
            h_out
        } else if p_out < l_out {
            // Capacitor too depleted: lower voltage limit dominates
            self.power.force_output(l_out);
            l_out
        } else {
            self.voltage_high.force_output(p_out);
            self.voltage_low.force_output(p_out);
            p_out
        };

        self.current.set_setpoint(current_ref);
        self.current.compute(m.cap_current)
    }

    /// Zeros the process state of all four loops. Runs once per enable edge.
    pub fn reset(&mut self) {
        self.voltage_high.reset();
        self.voltage_low.reset();
        self.power.reset();
        self.current.reset();
    }

    /// Seeds the inner current loop's accumulator with the soft-start duty
    /// factor so the first enabled tick continues from the measured operating
    /// point instead of slewing from zero.
    pub fn seed_soft_start(&mut self, factor: f32) {
        self.current.force_output(factor);
    }

    /// Clamped setpoint currently applied to the power loop.
    pub fn power_setpoint(&self) -> f32 {
        self.power.setpoint()
    }
}

impl Default for PowerCascade {
    fn default() -> Self {
        Self::new()
    }
}
