//! Bridge-leg PWM pins on the advanced timer channels.
use super::PinDef;
use super::{PinMode, Port};

/// Motor-side leg, high-side gate (TIM1_CH1)
pub const MOTOR_H: PinDef = PinDef {
    port: Port::A,
    pin: 8,
    mode: PinMode::Alt(6),
};

/// Motor-side leg, low-side gate (TIM1_CH2)
pub const MOTOR_L: PinDef = PinDef {
    port: Port::A,
    pin: 9,
    mode: PinMode::Alt(6),
};

/// Capacitor-side leg, high-side gate (TIM1_CH3)
pub const CAP_H: PinDef = PinDef {
    port: Port::A,
    pin: 10,
    mode: PinMode::Alt(6),
};

/// Capacitor-side leg, low-side gate (TIM1_CH4)
pub const CAP_L: PinDef = PinDef {
    port: Port::A,
    pin: 11,
    mode: PinMode::Alt(11),
};
