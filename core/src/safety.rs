//! Safe-mode arbitration: `InvalidRc` -> `Programming` <-> `Operational`.
//!
//! Mirrors the teacher's own `safety.rs` in spirit (arming/disarming state
//! driven by switch + signal validity) but for a single two-position
//! programming switch rather than a multi-stage arm sequence.

use crate::config::Config;
use crate::duty::Duty;

/// Operator-facing arming state.
#[derive(Clone, Copy, PartialEq, Eq, Debug, defmt::Format)]
pub enum SafeMode {
    /// No valid R/C input yet, or the stick wasn't neutral at boot. All
    /// motion output is suppressed.
    InvalidRc,
    /// Endpoints are being taught; reduced acceleration/speed limits.
    Programming,
    /// Full limits; learned endpoints enforced.
    Operational,
}

impl Default for SafeMode {
    fn default() -> Self {
        SafeMode::InvalidRc
    }
}

impl SafeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SafeMode::InvalidRc => "INVALID_RC",
            SafeMode::Programming => "PROGRAMMING",
            SafeMode::Operational => "OPERATIONAL",
        }
    }
}

/// Safety-arbiter runtime state: just `safemode` plus the bookkeeping the
/// endpoint programmer needs to detect a fresh entry into `Programming`.
#[derive(Clone, Copy, Debug)]
pub struct SafetyArbiter {
    pub safemode: SafeMode,
}

impl Default for SafetyArbiter {
    fn default() -> Self {
        Self {
            safemode: SafeMode::InvalidRc,
        }
    }
}

impl SafetyArbiter {
    /// Evaluate one cycle's speed-channel and programming-channel duty.
    ///
    /// Returns `true` if the cycle must suppress motion output (the raw
    /// stick should be forced to 0 this tick): either the speed channel is
    /// invalid, or we're still waiting for the boot-time neutral check.
    ///
    /// Returns whether `Programming` was freshly entered this cycle, so
    /// the caller (the endpoint programmer) knows to reset its click
    /// counter.
    pub fn arbitrate(&mut self, cfg: &Config, v: Duty, p: Duty) -> ArbiterOutcome {
        if !v.is_valid() {
            // Stale/absent speed channel: suppress output, leave safemode
            // untouched. The acceleration slew (run on a forced-0 desired
            // value) then guarantees a bounded deceleration to zero.
            return ArbiterOutcome {
                suppress: true,
                entered_programming: false,
            };
        }

        if self.safemode == SafeMode::InvalidRc && !within_neutral(cfg, v) {
            // Stick must start in neutral; not yet observed.
            return ArbiterOutcome {
                suppress: true,
                entered_programming: false,
            };
        }

        let prev = self.safemode;
        self.safemode = if p.is_high() {
            SafeMode::Operational
        } else {
            SafeMode::Programming
        };

        let entered_programming =
            self.safemode == SafeMode::Programming && prev != SafeMode::Programming;

        ArbiterOutcome {
            suppress: false,
            entered_programming,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ArbiterOutcome {
    pub suppress: bool,
    pub entered_programming: bool,
}

fn within_neutral(cfg: &Config, v: Duty) -> bool {
    let v = v.raw() as i32;
    (v - cfg.stick_neutral_pos).abs() <= cfg.stick_neutral_range
}
