#![no_main]
#![no_std]

use defmt_rtt as _;
use panic_probe as _;

use hal::{
    self,
    adc::{Adc, AdcDevice, Align, InputType, SampleTime},
    clocks::Clocks,
    dma,
    dma::{ChannelCfg, Circular, Dma, DmaChannel, DmaInput, DmaInterrupt, DmaPeriph},
    pac,
    pac::{ADC1, DMA1, TIM6},
    timer::{Timer, TimerInterrupt},
};

// Import the control core and driver shims
use capflow_algo::{analog::AnalogChannel, converter, link, BufferController};
use capflow_drivers::{bridge_pwm::BridgePwm, can_bus::CanBus, pinout};

use cortex_m;

/// Slow control tick rate (2 ms period), Hz.
const CONTROL_TICK_HZ: f32 = 500.0;
/// Bridge switching frequency, Hz.
const BRIDGE_FREQ: u16 = 6250;

const V_CAP_CH: u8 = 5;
const I_CAP_CH: u8 = 12;
const V_MOTOR_CH: u8 = 11;
const I_CHASSIS_CH: u8 = 14;

const SAMPLING_COUNT: usize = 4;
const ADC1_SEQUENCE: [u8; SAMPLING_COUNT] = [V_CAP_CH, I_CAP_CH, V_MOTOR_CH, I_CHASSIS_CH];

// Circular double buffer: the half-complete interrupt reads the first
// sequence, the full-complete interrupt the second.
static mut ADC_READ_BUF: [u16; SAMPLING_COUNT * 2] = [0; SAMPLING_COUNT * 2];

/// 96-bit MCU unique ID, keys the analog calibration table.
fn read_device_uid() -> [u32; 3] {
    const UID_BASE: u32 = 0x1FFF_7590;
    unsafe {
        [
            core::ptr::read_volatile(UID_BASE as *const u32),
            core::ptr::read_volatile((UID_BASE + 4) as *const u32),
            core::ptr::read_volatile((UID_BASE + 8) as *const u32),
        ]
    }
}

#[rtic::app(device = pac, peripherals = true, dispatchers = [TIM7])]
mod app {
    use super::*;

    #[shared]
    struct Shared {
        // Both lanes touch the controller; the resource lock is the
        // serialization point between fast-lane writes and slow-lane reads
        controller: BufferController,
        can: CanBus,
    }

    #[local]
    struct Local {
        bridge: BridgePwm,
        tick_timer: Timer<TIM6>,
        status_led: hal::gpio::Pin,
        adc1: Adc<ADC1>,
        dma1: Dma<DMA1>,
    }

    #[init]
    fn init(ctx: init::Context) -> (Shared, Local) {
        let dp = ctx.device;
        let clock_cfg = Clocks::default();
        clock_cfg.setup().unwrap();
        defmt::debug!(
            "SYSTEM: Clock frequency is {} MHz",
            clock_cfg.sysclk() / 1000000
        );

        // Status LED asserted until the converter is enabled and healthy
        let mut status_led = pinout::led::STATUS.init();
        status_led.set_high();

        pinout::analog::V_CAP.init();
        pinout::analog::I_CAP.init();
        pinout::analog::V_MOTOR.init();
        pinout::analog::I_CHASSIS.init();
        pinout::can::CAN_RX.init();
        pinout::can::CAN_TX.init();

        // Bridge timer: the counter starts here and free-runs from now on;
        // only the output stage is gated at runtime
        let mut bridge = BridgePwm::new(dp.TIM1, &clock_cfg, BRIDGE_FREQ, converter::PERIOD_FULL);
        bridge.begin();

        let can = CanBus::new(dp.FDCAN1);

        let mut tick_timer = Timer::new_tim6(dp.TIM6, CONTROL_TICK_HZ, Default::default(), &clock_cfg);
        tick_timer.enable_interrupt(TimerInterrupt::Update);
        tick_timer.enable();

        let dma1 = Dma::new(dp.DMA1);
        dma::enable_mux1();
        dma::mux(DmaPeriph::Dma1, DmaChannel::C1, DmaInput::Adc1);

        let mut adc1 = Adc::new_adc1(
            dp.ADC1,
            AdcDevice::One,
            Default::default(),
            clock_cfg.systick(),
        );

        for i in 0..SAMPLING_COUNT {
            adc1.set_sequence(ADC1_SEQUENCE[i], i as u8 + 1);
            adc1.set_input_type(ADC1_SEQUENCE[i], InputType::SingleEnded);
            adc1.set_sample_time(ADC1_SEQUENCE[i], SampleTime::T2);
        }
        adc1.set_sequence_len(SAMPLING_COUNT as u8);
        adc1.set_align(Align::Right);

        // Continuous circular conversion; samples land in ADC_READ_BUF and
        // the DMA1_CH1 interrupt routes them to the channel filters
        unsafe {
            adc1.read_dma(
                &mut ADC_READ_BUF,
                &ADC1_SEQUENCE,
                DmaChannel::C1,
                ChannelCfg {
                    circular: Circular::Enabled,
                    ..Default::default()
                },
                DmaPeriph::Dma1,
            )
        };

        let controller = BufferController::new(read_device_uid());

        (
            Shared { controller, can },
            Local {
                bridge,
                tick_timer,
                status_led,
                adc1,
                dma1,
            },
        )
    }

    /// Fast lane: one full ADC sequence per half of the circular buffer.
    /// The ADC and DMA handles live here; the circular transfer set up in
    /// init keeps them busy without further driving.
    #[task(binds = DMA1_CH1, shared = [controller], local = [adc1, dma1], priority = 2)]
    fn adc_samples(mut cx: adc_samples::Context) {
        let (half, full) = unsafe {
            let isr = (*pac::DMA1::ptr()).isr.read();
            (isr.htif1().bit_is_set(), isr.tcif1().bit_is_set())
        };
        if half {
            dma::clear_interrupt(DmaPeriph::Dma1, DmaChannel::C1, DmaInterrupt::HalfTransfer);
        }
        if full {
            dma::clear_interrupt(
                DmaPeriph::Dma1,
                DmaChannel::C1,
                DmaInterrupt::TransferComplete,
            );
        }

        let offset = if full { SAMPLING_COUNT } else { 0 };
        let samples = unsafe { &ADC_READ_BUF[offset..offset + SAMPLING_COUNT] };

        cx.shared.controller.lock(|controller| {
            controller.push_sample(AnalogChannel::CapVoltage, samples[0]);
            controller.push_sample(AnalogChannel::CapCurrent, samples[1]);
            controller.push_sample(AnalogChannel::MotorVoltage, samples[2]);
            controller.push_sample(AnalogChannel::ChassisCurrent, samples[3]);
        });
    }

    /// Slow lane: the 2 ms control tick. Runs the whole control core once,
    /// then applies its hardware actions.
    #[task(binds = TIM6_DACUNDER, shared = [controller, can], local = [tick_timer, bridge, status_led], priority = 1)]
    fn control_tick(mut cx: control_tick::Context) {
        cx.local
            .tick_timer
            .clear_interrupt(TimerInterrupt::Update);

        let actions = cx.shared.controller.lock(|controller| controller.tick_slow());

        cx.local.bridge.apply_compare(actions.compare.as_channels());
        cx.local.bridge.set_output_stage(actions.output_on);

        if actions.indicator {
            cx.local.status_led.set_high();
        } else {
            cx.local.status_led.set_low();
        }

        // Best-effort telemetry: a full TX FIFO drops this tick's frame
        cx.shared
            .can
            .lock(|can| can.send(link::TELEMETRY_FRAME_ID, &actions.telemetry));
    }

    /// Command ingestion straight from the RX FIFO interrupt.
    #[task(binds = FDCAN1_INTR0_IT, shared = [controller, can], priority = 2)]
    fn can_rx(cx: can_rx::Context) {
        (cx.shared.can, cx.shared.controller).lock(|can, controller| {
            can.clear_rx_interrupt();
            while let Some((id, data)) = can.receive() {
                if id == link::COMMAND_FRAME_ID {
                    controller.ingest_command(&data);
                }
            }
        });
    }
}

#[defmt::panic_handler]
fn panic() -> ! {
    cortex_m::asm::udf()
}
