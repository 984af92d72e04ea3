//! FDCAN transceiver pins.
use super::PinDef;
use super::{PinMode, Port};

pub const CAN_RX: PinDef = PinDef {
    port: Port::B,
    pin: 8,
    mode: PinMode::Alt(9),
};

pub const CAN_TX: PinDef = PinDef {
    port: Port::B,
    pin: 9,
    mode: PinMode::Alt(9),
};
