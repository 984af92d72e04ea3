/// Per-channel linear fit: `measured = k * raw_average + b`.
#[derive(Clone, Copy, Debug)]
pub struct LinearCal {
    pub k: f32,
    pub b: f32,
}

impl LinearCal {
    pub fn apply(&self, raw_average: u16) -> f32 {
        self.k * raw_average as f32 + self.b
    }
}

/// Full calibration record for one produced unit, keyed by the 96-bit MCU
/// unique ID. Rows are generated from bench measurements during production.
#[derive(Clone, Copy, Debug)]
pub struct BoardCalibration {
    pub uid: [u32; 3],
    pub motor_voltage: LinearCal,
    pub chassis_current: LinearCal,
    pub cap_voltage: LinearCal,
    pub cap_current: LinearCal,
}

// board calibration insert start
pub static BOARD_CALIBRATIONS: [BoardCalibration; 2] = [
    BoardCalibration {
        uid: [0x0000_0000, 0x0000_0000, 0x0000_0222],
        motor_voltage: LinearCal { k: 0.000_555_450_4, b: 0.0 },
        chassis_current: LinearCal { k: 0.000_499_900_9, b: -16.28 },
        cap_voltage: LinearCal { k: 0.000_554_460_4, b: 0.0 },
        cap_current: LinearCal { k: 0.000_499_645_0, b: -16.35 },
    },
    BoardCalibration {
        uid: [0x0000_0000, 0x0000_0000, 0x0000_0111],
        motor_voltage: LinearCal { k: 0.000_520_450_4, b: -0.272_237_101_5 },
        chassis_current: LinearCal { k: 0.001_005_930_2, b: -0.657_508_228_8 },
        cap_voltage: LinearCal { k: 0.000_998_059_8, b: -32.600_164_291_5 },
        cap_current: LinearCal { k: 0.000_521_086_6, b: -0.240_968_330_3 },
    },
];
// board calibration insert stop

/// Selects the calibration record for the running board. An unknown unique
/// ID falls back to the first table entry.
pub fn for_board(uid: [u32; 3]) -> &'static BoardCalibration {
    BOARD_CALIBRATIONS
        .iter()
        .find(|cal| cal.uid == uid)
        .unwrap_or(&BOARD_CALIBRATIONS[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_uid_selects_its_row() {
        let cal = for_board([0, 0, 0x111]);
        assert_eq!(cal.uid, [0, 0, 0x111]);
    }

    #[test]
    fn unknown_uid_falls_back_to_first_row() {
        let cal = for_board([0xDEAD_BEEF, 1, 2]);
        assert_eq!(cal.uid, BOARD_CALIBRATIONS[0].uid);
    }

    #[test]
    fn linear_map_applies_gain_and_offset() {
        let cal = LinearCal { k: 0.5, b: -2.0 };
        assert_eq!(cal.apply(100), 48.0);
        assert_eq!(cal.apply(0), -2.0);
    }
}
