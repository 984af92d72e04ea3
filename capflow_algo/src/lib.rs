#![cfg_attr(not(test), no_std)]

// Control core of the CapFlow supercapacitor power buffer. The buffer sits
// between the battery-backed chassis bus and the motor bus and shuttles
// energy through a bidirectional bridge so chassis power stays inside the
// commanded envelope.
//
// Everything here is portable state-machine and loop math: raw samples come
// in through `push_sample`, commands through `ingest_command`, and one call
// to `tick_slow` per control period produces the hardware actions for the
// firmware to apply. No allocation, no blocking, no statics.

pub mod analog;
pub mod control;
pub mod converter;
pub mod fault;
pub mod filters;
pub mod link;
pub mod output_state;

use analog::{AnalogChannel, AnalogChannels, Measurements};
use control::cascade::PowerCascade;
use converter::{BridgeCompare, Converter};
use fault::PowerLossDetector;
use link::{Command, LinkMonitor, Telemetry};
use output_state::{OutputControl, OutputState};

/// Motor-bus voltage window in which the soft-start ratio is plausible, V.
/// Outside it the converter keeps its previous factor for the restart.
const SOFT_START_VOLTAGE_MIN: f32 = 20.0;
const SOFT_START_VOLTAGE_MAX: f32 = 28.0;

/// Hardware actions produced by one slow tick, in application order.
pub struct TickActions {
    /// Compare values for both bridge legs.
    pub compare: BridgeCompare,
    /// Whether the bridge output stage should be on. The free-running
    /// counter is never touched; only the output stage is gated.
    pub output_on: bool,
    /// Status indicator: asserted when the output is off or faulted.
    pub indicator: bool,
    /// Telemetry frame payload for this tick, sent best-effort.
    pub telemetry: [u8; 8],
}

/// The owned controller context: every piece of mutable state in the control
/// core lives here. Constructed once at boot and passed by reference to the
/// tick handlers.
pub struct BufferController {
    analog: AnalogChannels,
    cascade: PowerCascade,
    converter: Converter,
    output: OutputControl,
    fault: PowerLossDetector,
    link: LinkMonitor,
}

impl BufferController {
    /// Builds the controller for the board identified by the 96-bit MCU
    /// unique ID (selects the analog calibration row).
    pub fn new(uid: [u32; 3]) -> Self {
        Self {
            analog: AnalogChannels::new(uid),
            cascade: PowerCascade::new(),
            converter: Converter::new(),
            output: OutputControl::new(),
            fault: PowerLossDetector::new(),
            link: LinkMonitor::new(),
        }
    }

    /// Fast-lane entry point: routes one raw ADC sample to its channel
    /// filter. Called from the conversion-complete handlers.
    pub fn push_sample(&mut self, channel: AnalogChannel, raw: u16) {
        self.analog.update(channel, raw);
    }

    /// Link entry point: ingests a validated command frame payload.
    pub fn ingest_command(&mut self, data: &[u8; 8]) {
        self.link.ingest(data);
    }

    /// Runs one slow control tick.
    ///
    /// Ordering contract: all fast-lane samples for this period must be
    /// pushed before this call; the caller serializes the two lanes (a
    /// shared-resource lock in the firmware).
    pub fn tick_slow(&mut self) -> TickActions {
        self.link.tick();

        let m = self.analog.measurements();
        let faulted = self.fault.tick(&m);
        let command = self.link.command();

        let state = self.output.tick(command.enabled);

        match state {
            OutputState::TransitionToEnabled => self.soft_start(&m),
            OutputState::Enabled => {
                let factor = self.cascade.tick(command.target_power as f32, &m);
                self.converter.set_factor(factor);
            }
            OutputState::TransitionToDisabled | OutputState::Disabled => {}
        }

        // The fault monitor overrides the state machine's output authority;
        // both are re-evaluated every tick.
        let output_on = matches!(
            state,
            OutputState::Enabled | OutputState::TransitionToEnabled
        ) && !faulted;

        let telemetry = Telemetry {
            chassis_power: m.chassis_power(),
            cap_voltage: m.cap_voltage,
            motor_voltage: m.motor_voltage,
            enabled: state == OutputState::Enabled,
        }
        .encode();

        TickActions {
            compare: self.converter.compare(),
            output_on,
            indicator: !output_on,
            telemetry,
        }
    }

    /// Enable-edge work, run on the single transition tick: reset the loop
    /// state and seed the converter at the measured voltage ratio so the
    /// first switching period produces no current step.
    fn soft_start(&mut self, m: &Measurements) {
        self.cascade.reset();
        if (SOFT_START_VOLTAGE_MIN..=SOFT_START_VOLTAGE_MAX).contains(&m.motor_voltage) {
            let factor = m.cap_voltage / m.motor_voltage;
            self.converter.set_factor(factor);
            self.cascade.seed_soft_start(factor);
        }
    }

    /// Current enable state.
    pub fn output_state(&self) -> OutputState {
        self.output.state()
    }

    /// Last validated (or link-loss default) command.
    pub fn link_command(&self) -> Command {
        self.link.command()
    }

    /// True once the command link has timed out.
    pub fn link_lost(&self) -> bool {
        self.link.is_lost()
    }

    /// Current converter scaling factor.
    pub fn converter_factor(&self) -> f32 {
        self.converter.factor()
    }

    /// Clamped setpoint currently applied to the power loop.
    pub fn power_setpoint(&self) -> f32 {
        self.cascade.power_setpoint()
    }

    /// Calibrated snapshot of the analog channels.
    pub fn measurements(&self) -> Measurements {
        self.analog.measurements()
    }
}
