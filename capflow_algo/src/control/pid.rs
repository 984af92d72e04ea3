// Implements an incremental (delta-form) PID controller used by the cascade
// control loop. The controller integrates increments into its own output
// instead of recomputing it from scratch each call.

// Key Features:
// - Configurable proportional, integral and derivative gains with output bounds.
// - Delta form: output accumulates kp*(e - e1) + ki*e + kd*(e - 2*e1 + e2).
// - Accumulated output is externally overwritable for bumpless transfer.
// - Reset clears process state while preserving gains, setpoint and bounds.

// Licensed under the Apache License, Version 2.0
// Copyright 2024 Anton Khrustalev, creapunk.com

/// Incremental PID controller with clamped accumulated output.
pub struct IncrementalPid {
    kp: f32, // Proportional gain.
    ki: f32, // Integral gain.
    kd: f32, // Derivative gain.

    setpoint: f32, // Target value for the controlled quantity.
    measured: f32, // Most recent measured value.

    error: f32,       // Error of the current compute call.
    error_prev: f32,  // Error one call back.
    error_prev2: f32, // Error two calls back.

    output: f32,  // Accumulated controller output.
    out_min: f32, // Lower output bound.
    out_max: f32, // Upper output bound.
}

impl IncrementalPid {
    /// Creates a controller with the given gains and output bounds.
    /// All mutable state starts at zero.
    pub fn new(kp: f32, ki: f32, kd: f32, out_min: f32, out_max: f32) -> Self {
        Self {
            kp,
            ki,
            kd,
            setpoint: 0.0,
            measured: 0.0,
            error: 0.0,
            error_prev: 0.0,
            error_prev2: 0.0,
            output: 0.0,
            out_min,
            out_max,
        }
    }

    /// Runs one compute step against the new measurement and returns the
    /// accumulated output, clamped to the configured bounds.
    pub fn compute(&mut self, measured: f32) -> f32 {
        self.measured = measured;
        self.error = self.setpoint - measured;

        // Delta form: each term contributes an increment, not an absolute value
        let p = self.kp * (self.error - self.error_prev);
        let i = self.ki * self.error;
        let d = self.kd * (self.error - 2.0 * self.error_prev + self.error_prev2);

        self.output = (self.output + p + i + d).clamp(self.out_min, self.out_max);

        self.error_prev2 = self.error_prev;
        self.error_prev = self.error;

        self.output
    }

    /// Clears error history and accumulated output. Gains, setpoint and
    /// output bounds are preserved.
    pub fn reset(&mut self) {
        self.measured = 0.0;
        self.error = 0.0;
        self.error_prev = 0.0;
        self.error_prev2 = 0.0;
        self.output = 0.0;
    }

    /// Updates the target value.
    pub fn set_setpoint(&mut self, setpoint: f32) {
        self.setpoint = setpoint;
    }

    /// Retrieves the target value.
    pub fn setpoint(&self) -> f32 {
        self.setpoint
    }

    /// Overwrites the accumulated output directly. This is the bumpless
    /// transfer hook: an inactive loop tracks the active loop's output so it
    /// has no error to catch up on if later selected.
    pub fn force_output(&mut self, output: f32) {
        self.output = output;
    }

    /// Retrieves the accumulated output.
    pub fn output(&self) -> f32 {
        self.output
    }
}
