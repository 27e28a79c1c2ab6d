//! Collaborator traits at the boundary between this crate's control cycle
//! and the hardware it doesn't implement (`spec.md` §1's "treated as
//! external collaborators" list): the SBUS decoder, the encoder driver,
//! the 50 Hz tick source, and the ESC/telemetry outputs.
//!
//! `Controller::tick` itself does not require these — it takes already-read
//! [`crate::duty::Duty`]/`i32`/`bool` values, so the library has zero
//! knowledge of how they were obtained (see `spec.md` §5's "consistent
//! snapshot taken at cycle entry"). They exist here purely so `firmware/`
//! has one shared, closed set of seams to depend on instead of inventing
//! its own — grounded in how the teacher's `drivers` module exposes a
//! small set of driver-facing traits rather than ad hoc function pointers.

use crate::duty::Duty;

/// The serial multiplexed R/C receiver (SBUS or equivalent).
pub trait RcLink {
    fn duty(&mut self, channel: crate::config::RcChannel) -> Duty;
}

/// The position encoder: a signed cumulative count, read-only from the
/// control cycle.
pub trait Encoder {
    fn position(&mut self) -> i32;
}

/// Gates 1 Hz telemetry. `true` on exactly one cycle per second.
pub trait TickSource {
    fn is_1hz(&mut self) -> bool;
}

/// Consumes the per-cycle signed ESC command.
pub trait EscOutput {
    fn command(&mut self, esc_output: i16);
}

/// The telemetry sink: a writer capability passed in by the caller rather
/// than owned by the controller, so the core stays allocation-free and
/// agnostic of whatever UART/USB/log transport `firmware/` wires up.
/// Emission must not block; a sink whose transport is busy should drop the
/// line rather than stall the control cycle.
pub trait TelemetrySink {
    fn emit(&mut self, line: &str);
}

/// A [`TelemetrySink`] that does nothing; the default for callers that
/// don't care about telemetry (e.g. most unit tests).
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl TelemetrySink for NullSink {
    fn emit(&mut self, _line: &str) {}
}
