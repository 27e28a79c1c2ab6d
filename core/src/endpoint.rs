//! Teach-and-learn endpoint programming: rising-edge detection on the
//! endpoint-switch channel while `Programming`, learning `pos_start` and
//! `pos_end` from two successive clicks.

use crate::config::Config;
use crate::duty::Duty;
use crate::safety::SafeMode;

/// Programmer runtime state: the click counter and the previous cycle's
/// raw endpoint-switch duty (needed for edge detection).
#[derive(Clone, Copy, Default, Debug, defmt::Format)]
pub struct EndpointProgrammer {
    clicks: u8,
    last_switch: u16,
}

impl EndpointProgrammer {
    /// Fresh entry into `Programming` resets the click counter, so a new
    /// programming session always starts expecting the first endpoint.
    pub fn reset_clicks(&mut self) {
        self.clicks = 0;
    }

    /// Process one cycle of the endpoint-switch channel.
    ///
    /// Edge detection and the click state machine run only while
    /// `safemode == Programming`; `last_switch` is updated unconditionally
    /// at the end regardless of mode, matching the original's placement of
    /// that assignment at the very end of its per-cycle stick routine.
    ///
    /// After the second click, `clicks` is left at `1` rather than reset to
    /// `0`, so further clicks keep re-partitioning `pos_start`/`pos_end`
    /// around the newest point (the first taught endpoint stays frozen).
    /// This is the source's documented behavior, not a bug — see
    /// `DESIGN.md`.
    pub fn process(&mut self, cfg: &mut Config, safemode: SafeMode, switch: Duty, encoder: i32) {
        if safemode == SafeMode::Programming {
            let rising_edge =
                switch.is_high() && self.last_switch <= Duty::HIGH_THRESHOLD && self.last_switch != 0;

            if rising_edge {
                if self.clicks == 0 {
                    cfg.pos_start = encoder;
                    self.clicks = 1;
                } else if cfg.pos_start < encoder {
                    cfg.pos_end = encoder;
                } else {
                    cfg.pos_end = cfg.pos_start;
                    cfg.pos_start = encoder;
                }
            }
        }

        self.last_switch = switch.raw();
    }
}
