//! Advanced-timer wrapper for the four-switch bridge. The counter free-runs
//! from `begin` onward; enabling and disabling the converter only gates the
//! output stage (BDTR MOE), which avoids restart transients in the legs.

use hal::{
    clocks::Clocks,
    pac,
    pac::TIM1,
    timer::{
        Alignment, CaptureCompareDma, CountDir, OutputCompare, TimChannel, Timer, TimerConfig,
        UpdateReqSrc,
    },
};

use super::pinout;

pub struct BridgePwm {
    tim: Timer<TIM1>,
    /// Full scale of the compare values handed to `apply_compare`.
    compare_scale: u32,
}

impl BridgePwm {
    /// Sets up the bridge timer at the given switching frequency. Compare
    /// values passed to `apply_compare` are expected in `0..=compare_scale`
    /// and are mapped onto the timer's own period.
    pub fn new(tim1: TIM1, clock_cfg: &Clocks, freq: u16, compare_scale: u16) -> Self {
        let mut timer = Timer::new_tim1(
            tim1,
            freq as f32,
            TimerConfig {
                one_pulse_mode: false,
                update_request_source: UpdateReqSrc::Any,
                auto_reload_preload: true,
                alignment: Alignment::Edge,
                capture_compare_dma: CaptureCompareDma::Update,
                direction: CountDir::Up,
            },
            clock_cfg,
        );
        // Start the counter; it is never stopped again
        timer.enable();

        BridgePwm {
            tim: timer,
            compare_scale: compare_scale as u32,
        }
    }

    pub fn get_timer(&mut self) -> &mut Timer<TIM1> {
        &mut self.tim
    }

    /// Routes the four channels to their pins with the output stage off.
    pub fn begin(&mut self) {
        self.tim
            .enable_pwm_output(TimChannel::C1, OutputCompare::Pwm1, 0.0);
        self.tim
            .enable_pwm_output(TimChannel::C2, OutputCompare::Pwm1, 0.0);
        self.tim
            .enable_pwm_output(TimChannel::C3, OutputCompare::Pwm1, 0.0);
        self.tim
            .enable_pwm_output(TimChannel::C4, OutputCompare::Pwm1, 0.0);

        pinout::bridge::MOTOR_H.init();
        pinout::bridge::MOTOR_L.init();
        pinout::bridge::CAP_H.init();
        pinout::bridge::CAP_L.init();

        self.set_output_stage(false);
    }

    /// Writes the compare pairs for both legs: motor start/end on channels
    /// 1/2, capacitor start/end on channels 3/4.
    pub fn apply_compare(&mut self, channels: [u16; 4]) {
        let period = self.tim.get_max_duty();
        self.tim
            .set_duty(TimChannel::C1, self.scale(channels[0], period));
        self.tim
            .set_duty(TimChannel::C2, self.scale(channels[1], period));
        self.tim
            .set_duty(TimChannel::C3, self.scale(channels[2], period));
        self.tim
            .set_duty(TimChannel::C4, self.scale(channels[3], period));
    }

    /// Gates the bridge output stage. The counter keeps running either way.
    pub fn set_output_stage(&mut self, on: bool) {
        unsafe {
            (*pac::TIM1::ptr()).bdtr.modify(|_, w| w.moe().bit(on));
        }
    }

    fn scale(&self, compare: u16, period: u32) -> u32 {
        compare as u32 * period / self.compare_scale
    }
}
