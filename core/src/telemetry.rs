//! Telemetry line construction: the wire/UART framing is out of scope
//! (`spec.md` §1), but the line's *content* is owned here, the same way
//! the teacher's `cfg_storage.rs` owns what bytes represent `UserCfg`
//! while the flash driver owns how they get written.
//!
//! Format is a compatibility contract (`spec.md` §6) — do not reformat.

use core::fmt::Write as _;

use crate::duty::Duty;
use crate::monitor::Monitor;
use crate::safety::SafeMode;

/// Render one telemetry line into a fixed-capacity, no-heap buffer.
///
/// Returns `Err` only if the line would overflow the 128-byte buffer (it
/// won't, for any realistic field widths); callers should treat that the
/// same way a busy transport is treated — drop the line, don't panic.
#[allow(clippy::too_many_arguments)]
pub fn render(
    frame: u32,
    raw: Duty,
    safemode: SafeMode,
    stick: i32,
    speed: f64,
    brake_distance: f64,
    monitor: Monitor,
    pos: i32,
) -> heapless::String<128> {
    let mut line = heapless::String::new();
    // A fixed-capacity buffer can't overflow for these field widths; if it
    // somehow did, silently returning the partial line (rather than
    // panicking in the hot control-cycle path) is the safer failure mode.
    let _ = write!(
        line,
        "Time: {}  Raw: {}  {}  Input: {}  Speed: {}  Brakedistance: {}  {}  Pos: {}",
        frame,
        raw.raw(),
        safemode.as_str(),
        stick,
        speed,
        brake_distance,
        monitor.as_str(),
        pos,
    );
    line
}
