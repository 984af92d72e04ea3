// Power-loss fault detector. The chassis bus dropping out shows up as the
// capacitor bank back-feeding (negative capacitor current) with no chassis
// load, or as the motor-bus voltage leaving its operating window. Either
// signature accumulates a counter; healthy measurements clear it.

use crate::analog::Measurements;

/// Ticks of sustained fault signature before the output is forced off.
pub const TRIP_TICKS: u16 = 1145;

/// Capacitor current at or below this reads as back-feeding, A.
const CAP_BACKFEED_CURRENT: f32 = -0.2;
/// Chassis current at or below this reads as no load, A.
const CHASSIS_IDLE_CURRENT: f32 = 0.2;

/// Motor-bus voltage operating window, V. Outside it the counter ramps fast.
const MOTOR_VOLTAGE_LOW: f32 = 19.0;
const MOTOR_VOLTAGE_HIGH: f32 = 27.0;

/// Saturating power-loss counter. Non-latching: the trip decision is
/// re-evaluated every tick, and one healthy tick resets the counter.
pub struct PowerLossDetector {
    count: u16,
    tripped: bool,
}

impl PowerLossDetector {
    pub fn new() -> Self {
        Self {
            count: 0,
            tripped: false,
        }
    }

    /// Evaluates one slow tick. Returns true while the fault is asserted.
    pub fn tick(&mut self, m: &Measurements) -> bool {
        if m.cap_current <= CAP_BACKFEED_CURRENT && m.chassis_current <= CHASSIS_IDLE_CURRENT {
            self.count = (self.count + 1).min(TRIP_TICKS + 1);
        } else if m.motor_voltage <= MOTOR_VOLTAGE_LOW || m.motor_voltage >= MOTOR_VOLTAGE_HIGH {
            // Bus voltage out of window: ramp ten times faster
            self.count = (self.count + 10).min(TRIP_TICKS + 1);
        } else {
            self.count = 0;
        }

        let tripped = self.count >= TRIP_TICKS;
        #[cfg(feature = "defmt")]
        if tripped != self.tripped {
            if tripped {
                defmt::warn!("power-loss fault asserted");
            } else {
                defmt::info!("power-loss fault cleared");
            }
        }
        self.tripped = tripped;
        tripped
    }

    /// True while the fault is asserted.
    pub fn tripped(&self) -> bool {
        self.tripped
    }
}

impl Default for PowerLossDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backfeed() -> Measurements {
        Measurements {
            cap_voltage: 15.0,
            cap_current: -0.5,
            motor_voltage: 24.0,
            chassis_current: 0.0,
        }
    }

    fn healthy() -> Measurements {
        Measurements {
            cap_voltage: 15.0,
            cap_current: 1.0,
            motor_voltage: 24.0,
            chassis_current: 2.0,
        }
    }

    fn bus_undervoltage() -> Measurements {
        Measurements {
            motor_voltage: 12.0,
            ..healthy()
        }
    }

    #[test]
    fn trips_after_sustained_backfeed() {
        let mut detector = PowerLossDetector::new();
        for _ in 0..TRIP_TICKS - 1 {
            assert!(!detector.tick(&backfeed()));
        }
        assert!(detector.tick(&backfeed()));
    }

    #[test]
    fn counter_saturates_above_threshold() {
        let mut detector = PowerLossDetector::new();
        for _ in 0..TRIP_TICKS * 3 {
            detector.tick(&backfeed());
        }
        assert_eq!(detector.count, TRIP_TICKS + 1);
    }

    #[test]
    fn voltage_excursion_ramps_ten_times_faster() {
        let mut detector = PowerLossDetector::new();
        let ticks_to_trip = TRIP_TICKS / 10 + 1;
        for _ in 0..ticks_to_trip - 1 {
            assert!(!detector.tick(&bus_undervoltage()));
        }
        assert!(detector.tick(&bus_undervoltage()));
    }

    #[test]
    fn one_healthy_tick_clears_the_fault() {
        let mut detector = PowerLossDetector::new();
        for _ in 0..TRIP_TICKS + 50 {
            detector.tick(&backfeed());
        }
        assert!(detector.tripped());
        assert!(!detector.tick(&healthy()));
        assert_eq!(detector.count, 0);
        assert!(!detector.tripped());
    }

    #[test]
    fn saturation_also_bounds_the_fast_ramp() {
        let mut detector = PowerLossDetector::new();
        for _ in 0..500 {
            detector.tick(&bus_undervoltage());
        }
        assert_eq!(detector.count, TRIP_TICKS + 1);
    }
}
