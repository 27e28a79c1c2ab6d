//! Stick conditioning: deadband removal, then (outside `Passthrough`) an
//! endpoint-brake override, an acceleration slew, and an absolute clamp.
//!
//! Order is semantically significant (`spec.md` §4.2): deadband, then the
//! passthrough short-circuit, then limit selection, then the endpoint
//! override, then slew, then clamp. Slew-then-clamp in particular must not
//! be reordered, or a flip from full-forward into a stricter mode would
//! snap instantaneously instead of decelerating at the slower rate.

use crate::config::{Config, Mode};
use crate::duty::Duty;
use crate::monitor::Monitor;
use crate::safety::SafeMode;

/// Remove the deadband around `stick_neutral_pos`. Continuous and
/// piecewise-linear: the first unit outside the band maps to +/-1, not to
/// a jump past the band width.
pub fn deadband(cfg: &Config, v: Duty) -> i32 {
    let v = v.raw() as i32 - cfg.stick_neutral_pos;
    if v.abs() <= cfg.stick_neutral_range {
        0
    } else if v > 0 {
        v - cfg.stick_neutral_range
    } else {
        v + cfg.stick_neutral_range
    }
}

struct Limits {
    max_accel: i32,
    max_speed: i32,
}

fn limits_for(cfg: &Config, safemode: SafeMode) -> Limits {
    if safemode == SafeMode::Operational {
        Limits {
            max_accel: cfg.stick_max_accel,
            max_speed: cfg.stick_max_speed,
        }
    } else {
        Limits {
            max_accel: cfg.stick_max_accel_safemode,
            max_speed: cfg.stick_max_speed_safemode,
        }
    }
}

/// Condition one cycle's already-deadbanded stick value into the new
/// `stick_requested_value`.
///
/// `desired` is the value after deadband removal, or `0` if the safety
/// arbiter suppressed the cycle (invalid R/C frame, or still waiting for
/// the boot-time neutral check) — the caller forces it to `0` in that case
/// the same way the original's raw-stick reader returns `0` directly
/// before this stage ever runs, so the slew limiter still shapes a bounded
/// deceleration rather than this stage being skipped outright.
///
/// `pos` and `brake_distance` are the position and predicted stop distance
/// the endpoint-brake override checks against (in `AbsolutePosition` mode,
/// the caller passes the virtual target rather than the measured encoder
/// position — see `spec.md` §4.4). `monitor` is set to `EndpointBrake` if
/// the override fires; otherwise left untouched (the caller has already
/// reset it to `Free` at the top of the cycle).
#[allow(clippy::too_many_arguments)]
pub fn condition(
    cfg: &Config,
    safemode: SafeMode,
    desired: i32,
    stick_requested_value_prev: i32,
    pos: f64,
    brake_distance: f64,
    monitor: &mut Monitor,
) -> i32 {
    let mut desired = desired;

    if cfg.mode == Mode::Passthrough {
        return desired;
    }

    let limits = limits_for(cfg, safemode);

    if cfg.mode != Mode::Limiter {
        let approaching_end = pos + brake_distance >= cfg.pos_end as f64 && desired >= 0;
        let approaching_start = pos - brake_distance <= cfg.pos_start as f64 && desired <= 0;
        if approaching_end || approaching_start {
            desired = 0;
            *monitor = Monitor::EndpointBrake;
        }
    }

    let delta = desired - stick_requested_value_prev;
    if delta > limits.max_accel {
        desired = stick_requested_value_prev + limits.max_accel;
    } else if delta < -limits.max_accel {
        desired = stick_requested_value_prev - limits.max_accel;
    }

    desired.clamp(-limits.max_speed, limits.max_speed)
}
