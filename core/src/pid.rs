//! The absolute-position PID: a discrete, incremental (velocity-form)
//! controller, plus the brake-distance predictor the stick conditioner
//! uses for its endpoint-brake override.
//!
//! Velocity form accumulates `y_k` from `y_{k-1}` rather than recomputing
//! it from scratch each cycle, which keeps it free of integrator wind-up
//! when the output is externally clamped (the ESC saturates at i16
//! range) — see `spec.md` GLOSSARY.

use crate::config::Config;

/// Incremental PID history: `e_{k-1}`, `e_{k-2}`, `y_{k-1}`. Zeroed at
/// construction and whenever the emergency-brake gate trips.
#[derive(Clone, Copy, Default, Debug, defmt::Format)]
pub struct Pid {
    e_prev: f64,
    e_prev2: f64,
    y_prev: f64,
}

#[derive(Clone, Copy, Debug)]
pub struct PidStep {
    /// Raw PID output (or 0.0 on an emergency brake), before the caller
    /// saturates it to the ESC's i16 range.
    pub y: f64,
    pub emergency_brake: bool,
}

impl Pid {
    pub fn reset(&mut self) {
        self.e_prev = 0.0;
        self.e_prev2 = 0.0;
        self.y_prev = 0.0;
    }

    /// Evaluate one cycle of the velocity-form PID against error `e`.
    ///
    /// Per `spec.md` §4.4, the emergency-brake gate fires when
    /// `|e| <= max_position_error` — documented as written in the source
    /// this spec was distilled from, even though its own comment
    /// ("cannot catch up") suggests the opposite comparison was intended.
    /// See `DESIGN.md` for the resolution.
    pub fn step(&mut self, cfg: &Config, e: f64) -> PidStep {
        if e.abs() <= cfg.max_position_error {
            self.reset();
            return PidStep {
                y: 0.0,
                emergency_brake: true,
            };
        }

        let y = self.y_prev + cfg.q0 * e + cfg.q1 * self.e_prev + cfg.q2 * self.e_prev2;
        self.e_prev2 = self.e_prev;
        self.e_prev = e;
        self.y_prev = y;

        PidStep {
            y,
            emergency_brake: false,
        }
    }
}

/// Discrete closed-form stopping distance from `speed_old` to zero at a
/// constant deceleration of `accel` per cycle.
///
/// `accel` must be strictly positive; a non-positive `stick_max_accel` is a
/// configuration error (rejected by [`crate::config::Config::set_stick_limits`]
/// when set through that path). If one slips through anyway, this returns
/// `0.0` rather than dividing by zero — the conservative "brake immediately
/// at the endpoint" reading `spec.md` §4.5 allows.
pub fn brake_distance(cfg: &Config, speed_old: f64) -> f64 {
    let accel = cfg.stick_max_accel as f64 * cfg.stick_speed_factor;
    if accel <= 0.0 {
        return 0.0;
    }
    let s = speed_old.abs();
    s * (s - accel) / (2.0 * accel)
}

/// Saturate a PID/stick output to the ESC's signed 16-bit command range.
/// `as i16` on a float already truncates toward zero and saturates at the
/// type's bounds (stable Rust float-to-int cast semantics since 1.45),
/// which is exactly the truncation contract `spec.md` §4.4 specifies.
pub fn saturate_to_esc(y: f64) -> i16 {
    y as i16
}
