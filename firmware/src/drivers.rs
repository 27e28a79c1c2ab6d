//! Hardware-facing implementations of `cablecam_core`'s collaborator
//! traits. Each struct owns exactly the peripheral(s) it needs and does
//! nothing else — no filtering, no unit conversion beyond what the trait
//! contract requires.

use cablecam_core::config::RcChannel;
use cablecam_core::duty::Duty;
use cablecam_core::traits::{Encoder, EscOutput, RcLink, TelemetrySink, TickSource};

use hal::pac::{TIM2, TIM3, USART1, USART2};
use hal::timer::{Timer, TimChannel};
use hal::usart::Usart;

/// SBUS receiver on `uart`, DMA'd into `frame` by the USART's idle-line
/// interrupt (wired up in `main`'s ISR, not here). `duty` just indexes the
/// most recently decoded frame; it never blocks on new data arriving.
///
/// Frame decoding itself — the 25-byte SBUS packet, its 11-bit channel
/// packing, and the failsafe/frame-lost flag bits — is the one piece of
/// this crate intentionally left undone. SBUS decoding is well-trodden
/// but fiddly bit-packing that doesn't teach anything `cablecam_core`
/// needs verified; wiring a real decoder here is a follow-up integration
/// task, not a design question.
pub struct SbusRc {
    uart: Usart<USART2>,
    frame: [u16; 16],
}

impl SbusRc {
    pub fn new(uart: Usart<USART2>) -> Self {
        Self {
            uart,
            frame: [0; 16],
        }
    }

    /// Called from the USART idle-line ISR with a freshly DMA'd 25-byte
    /// SBUS frame. Decodes it into `self.frame`'s 16 channels.
    pub fn on_frame(&mut self, _raw: &[u8; 25]) {
        todo!("SBUS 11-bit channel unpacking + failsafe flag; out of scope per spec.md §1")
    }
}

impl RcLink for SbusRc {
    fn duty(&mut self, channel: RcChannel) -> Duty {
        self.frame
            .get(channel.0 as usize)
            .copied()
            .map(Duty::from)
            .unwrap_or(Duty::INVALID)
    }
}

/// Quadrature encoder on a hardware timer in encoder mode. The timer's
/// free-running count is unsigned; we track the last-seen count to fold
/// wraparound into a signed cumulative position the way the teacher's own
/// `dt_timer` read pattern (`read_count` each ISR, diffed against the
/// previous read) does for elapsed time.
pub struct QuadratureEncoder {
    timer: Timer<TIM3>,
    position: i32,
    last_count: u32,
}

impl QuadratureEncoder {
    pub fn new(timer: Timer<TIM3>) -> Self {
        Self {
            timer,
            position: 0,
            last_count: 0,
        }
    }
}

impl Encoder for QuadratureEncoder {
    fn position(&mut self) -> i32 {
        let count = self.timer.read_count();
        let delta = count.wrapping_sub(self.last_count) as i32;
        self.last_count = count;
        self.position = self.position.wrapping_add(delta);
        self.position
    }
}

/// ESC output as a servo-style PWM signal: `esc_output` (signed i16)
/// linearly maps to a 1000-2000µs pulse width the same way the RC stick
/// channels that feed `Controller::tick` are read, so the ESC sees the
/// same convention the radio link does.
pub struct PwmEsc {
    timer: Timer<TIM2>,
    channel: TimChannel,
}

impl PwmEsc {
    pub fn new(timer: Timer<TIM2>, channel: TimChannel) -> Self {
        Self { timer, channel }
    }
}

impl EscOutput for PwmEsc {
    fn command(&mut self, esc_output: i16) {
        let us = 1500.0 + (esc_output as f32 / i16::MAX as f32) * 500.0;
        self.timer.set_duty(self.channel, us as u32);
    }
}

/// Telemetry over a dedicated UART; a full transmit buffer drops the line
/// rather than blocking the control cycle (the contract `TelemetrySink`
/// documents).
pub struct UartTelemetry {
    uart: Usart<USART1>,
}

impl UartTelemetry {
    pub fn new(uart: Usart<USART1>) -> Self {
        Self { uart }
    }
}

impl TelemetrySink for UartTelemetry {
    fn emit(&mut self, line: &str) {
        let _ = self.uart.write(line.as_bytes());
        let _ = self.uart.write(b"\r\n");
    }
}

/// Gates the 1 Hz telemetry line off the 50 Hz tick count; no separate
/// hardware timer needed.
#[derive(Default)]
pub struct DividedTick {
    count: u8,
}

impl TickSource for DividedTick {
    fn is_1hz(&mut self) -> bool {
        self.count += 1;
        if self.count >= 50 {
            self.count = 0;
            true
        } else {
            false
        }
    }
}
