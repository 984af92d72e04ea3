use super::PinDef;
use super::{PinMode, Port};

/// Status indicator: asserted while the converter output is off or faulted.
pub const STATUS: PinDef = PinDef {
    port: Port::C,
    pin: 13,
    mode: PinMode::Output,
};
