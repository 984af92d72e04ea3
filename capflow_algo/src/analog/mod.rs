// Implements analog signal conditioning: one moving-average filter per
// measured channel plus the per-board linear calibration that maps raw
// averages to volts and amps.

// Licensed under the Apache License, Version 2.0
// Copyright 2024 Anton Khrustalev, creapunk.com

pub mod calibration;

use crate::filters::mean::MeanFilter;
use calibration::{for_board, BoardCalibration};

/// Filter window for the voltage and capacitor-current channels.
const FILTER_WINDOW: usize = 8;
/// The chassis shunt is noisier and gets a wider window.
const CHASSIS_CURRENT_WINDOW: usize = 32;

/// One measured analog channel.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AnalogChannel {
    CapVoltage,
    CapCurrent,
    MotorVoltage,
    ChassisCurrent,
}

/// Calibrated snapshot of all four channels, taken once per slow tick.
#[derive(Clone, Copy, Debug)]
pub struct Measurements {
    /// Capacitor bank voltage, V.
    pub cap_voltage: f32,
    /// Capacitor bank current, A. Positive charges the bank.
    pub cap_current: f32,
    /// Motor-bus voltage, V.
    pub motor_voltage: f32,
    /// Chassis bus current, A.
    pub chassis_current: f32,
}

impl Measurements {
    /// Chassis power as seen by the control loops, W.
    pub fn chassis_power(&self) -> f32 {
        self.motor_voltage * self.chassis_current
    }
}

/// Filters and calibration for the four analog channels. Raw samples arrive
/// on the fast lane (conversion-complete callbacks); the slow lane reads one
/// calibrated snapshot per control tick.
pub struct AnalogChannels {
    v_cap: MeanFilter,
    i_cap: MeanFilter,
    v_motor: MeanFilter,
    i_chassis: MeanFilter,
    cal: &'static BoardCalibration,
}

impl AnalogChannels {
    /// Builds the channel set for the board identified by `uid`.
    pub fn new(uid: [u32; 3]) -> Self {
        Self {
            v_cap: MeanFilter::new(FILTER_WINDOW),
            i_cap: MeanFilter::new(FILTER_WINDOW),
            v_motor: MeanFilter::new(FILTER_WINDOW),
            i_chassis: MeanFilter::new(CHASSIS_CURRENT_WINDOW),
            cal: for_board(uid),
        }
    }

    /// Routes one raw sample to its channel filter. Fast-lane entry point.
    pub fn update(&mut self, channel: AnalogChannel, raw: u16) {
        match channel {
            AnalogChannel::CapVoltage => self.v_cap.update(raw),
            AnalogChannel::CapCurrent => self.i_cap.update(raw),
            AnalogChannel::MotorVoltage => self.v_motor.update(raw),
            AnalogChannel::ChassisCurrent => self.i_chassis.update(raw),
        }
    }

    /// Calibrated snapshot of all channels.
    pub fn measurements(&self) -> Measurements {
        Measurements {
            cap_voltage: self.cal.cap_voltage.apply(self.v_cap.average()),
            cap_current: self.cal.cap_current.apply(self.i_cap.average()),
            motor_voltage: self.cal.motor_voltage.apply(self.v_motor.average()),
            chassis_current: self.cal.chassis_current.apply(self.i_chassis.average()),
        }
    }
}
