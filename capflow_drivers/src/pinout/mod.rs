use hal::gpio::{Pin, PinMode, Port};

pub mod analog;
pub mod bridge;
pub mod can;
pub mod led;

/// Compile-time definition of one GPIO pin assignment.
pub struct PinDef {
    /// Port the pin belongs to.
    port: Port,
    /// Pin number within the port.
    pin: u8,
    /// Pin mode: analog input, output, or a timer/bus alternate function.
    mode: PinMode,
}

impl PinDef {
    /// Claims the pin in its configured mode.
    /// # Example
    /// ```
    /// let mut status = led::STATUS.init();
    /// status.set_high();
    /// ```
    pub fn init(&self) -> Pin {
        Pin::new(self.port, self.pin, self.mode)
    }
}
