//! ADC input pins for the four measured channels.
use super::PinDef;
use super::{PinMode, Port};

/// Capacitor bank voltage divider
pub const V_CAP: PinDef = PinDef {
    port: Port::A,
    pin: 5,
    mode: PinMode::Analog,
};

/// Capacitor bank current shunt amplifier
pub const I_CAP: PinDef = PinDef {
    port: Port::B,
    pin: 2,
    mode: PinMode::Analog,
};

/// Chassis bus current shunt amplifier
pub const I_CHASSIS: PinDef = PinDef {
    port: Port::B,
    pin: 12,
    mode: PinMode::Analog,
};

/// Motor bus voltage divider
pub const V_MOTOR: PinDef = PinDef {
    port: Port::B,
    pin: 13,
    mode: PinMode::Analog,
};
