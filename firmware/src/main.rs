#![no_main]
#![no_std]

use cfg_if::cfg_if;

use cortex_m::asm;

use hal::{
    clocks::{Clocks, InputSrc, PllSrc},
    pac,
    timer::{OutputCompare, TimChannel, Timer, TimerConfig, TimerInterrupt},
    usart::Usart,
};

use defmt_rtt as _;
use panic_probe as _;

mod drivers;

use cablecam_core::{Config, Controller, CycleInputs, Mode};
use drivers::{DividedTick, PwmEsc, QuadratureEncoder, SbusRc, UartTelemetry};

/// The control cycle's fixed period, seconds. Matches `CONTROL_RATE`.
const TA: f64 = 1. / CONTROL_RATE as f64;
/// The 50 Hz cadence `spec.md` §5 calls for.
const CONTROL_RATE: f32 = 50.;

#[rtic::app(device = pac, peripherals = true)]
mod app {
    use super::*;

    #[shared]
    struct Shared {}

    #[local]
    struct Local {
        controller: Controller,
        cfg: Config,
        rc: SbusRc,
        encoder: QuadratureEncoder,
        esc: PwmEsc,
        telemetry: UartTelemetry,
        tick_source: DividedTick,
        control_timer: Timer<pac::TIM15>,
        frame_counter: u32,
    }

    #[init]
    fn init(cx: init::Context) -> (Shared, Local) {
        let dp = cx.device;

        cfg_if! {
            if #[cfg(feature = "h7")] {
                let clock_cfg = Clocks {
                    pll_src: PllSrc::Hse(8_000_000),
                    ..Default::default()
                };
            } else {
                let clock_cfg = Clocks {
                    input_src: InputSrc::Pll(PllSrc::Hse(16_000_000)),
                    ..Default::default()
                };
            }
        }
        clock_cfg.setup().unwrap();

        defmt::println!("cablecam firmware init");

        // Encoder channel, quadrature mode. The exact pin alt-functions are
        // board-specific the same way the teacher's `setup_pins` gates on
        // its board features; omitted here since this repo targets no
        // specific board revision.
        let encoder_timer = Timer::new_tim3(dp.TIM3, 1., Default::default(), &clock_cfg);
        let encoder = QuadratureEncoder::new(encoder_timer);

        let mut esc_timer = Timer::new_tim2(dp.TIM2, 50., Default::default(), &clock_cfg);
        esc_timer.enable_pwm_output(TimChannel::C1, OutputCompare::Pwm1, 0.);
        let esc = PwmEsc::new(esc_timer, TimChannel::C1);

        let rc_uart = Usart::new(dp.USART2, 100_000, Default::default(), &clock_cfg);
        let rc = SbusRc::new(rc_uart);

        let telemetry_uart = Usart::new(dp.USART1, 115_200, Default::default(), &clock_cfg);
        let telemetry = UartTelemetry::new(telemetry_uart);

        let mut control_timer =
            Timer::new_tim15(dp.TIM15, CONTROL_RATE, TimerConfig::default(), &clock_cfg);
        control_timer.enable_interrupt(TimerInterrupt::Update);
        control_timer.enable();

        let mut cfg = Config::new(TA as f64);
        cfg.mode = Mode::AbsolutePosition;

        (
            Shared {},
            Local {
                controller: Controller::new(),
                cfg,
                rc,
                encoder,
                esc,
                telemetry,
                tick_source: DividedTick::default(),
                control_timer,
                frame_counter: 0,
            },
        )
    }

    #[idle]
    fn idle(_cx: idle::Context) -> ! {
        loop {
            asm::nop();
        }
    }

    /// The 50 Hz control cycle: read this cycle's consistent snapshot of
    /// R/C, encoder and clock inputs, run one tick, and drive the ESC.
    #[task(
        binds = TIM15,
        local = [
            controller, cfg, rc, encoder, esc, telemetry, tick_source,
            control_timer, frame_counter,
        ],
        priority = 2,
    )]
    fn control_cycle(cx: control_cycle::Context) {
        cx.local.control_timer.clear_interrupt(TimerInterrupt::Update);

        let speed = cx.local.rc.duty(cx.local.cfg.rc_channel_speed);
        let programming = cx.local.rc.duty(cx.local.cfg.rc_channel_programming);
        let endpoint = cx.local.rc.duty(cx.local.cfg.rc_channel_endpoint);
        let encoder_pos = cx.local.encoder.position();

        *cx.local.frame_counter = cx.local.frame_counter.wrapping_add(1);
        let is_1hz = cx.local.tick_source.is_1hz();

        let inputs = CycleInputs {
            speed,
            programming,
            endpoint,
            encoder: encoder_pos,
            frame: *cx.local.frame_counter,
            is_1hz,
        };

        let esc_output = cx
            .local
            .controller
            .tick(cx.local.cfg, inputs, cx.local.telemetry);

        cx.local.esc.command(esc_output);
    }
}

/// Same panicking *behavior* as `panic-probe` but without its own message;
/// avoids the double-print `defmt::panic!` would otherwise cause.
#[defmt::panic_handler]
fn panic() -> ! {
    cortex_m::asm::udf()
}
