#![no_std]

pub mod bridge_pwm;
pub mod can_bus;
pub mod pinout;
