//! Read-mostly controller configuration, updated by an external settings
//! channel (wire format out of scope; see `spec.md` §6). Mutators that
//! touch `p`/`i`/`d` recompute the PID coefficients eagerly, so (I1) holds
//! without the PID step ever having to check for staleness.

/// A channel-table index. Newtype over `u8` rather than a bare integer, the
/// way the teacher wraps hardware indices (`Port`, `TimChannel`) instead of
/// passing raw numbers around.
#[derive(Clone, Copy, PartialEq, Eq, Debug, defmt::Format)]
pub struct RcChannel(pub u8);

/// Output-shaping policy.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, defmt::Format)]
pub enum Mode {
    /// Raw (deadbanded) stick passed straight to the ESC. No limiters, no
    /// endpoint enforcement.
    Passthrough,
    /// Deadband, acceleration slew, and absolute-speed clamp apply; no
    /// endpoint braking or position tracking.
    #[default]
    Limiter,
    /// Full closed loop: endpoint braking, a virtual position target, and
    /// the absolute-position PID.
    AbsolutePosition,
}

/// Configuration error surfaced by a fallible `Config` setter.
///
/// `Controller::tick` itself never returns a `Result` — per `spec.md` §7,
/// the control cycle absorbs all recoverable conditions and surfaces them
/// via `monitor` and telemetry instead. Configuration *mutation* is a
/// different boundary (an external settings channel), and gets the ambient
/// `Result`-returning treatment the teacher gives its own fallible setup
/// calls.
#[derive(Clone, Copy, PartialEq, Eq, Debug, defmt::Format)]
pub enum ConfigError {
    /// `stick_max_accel` or `stick_max_accel_safemode` was <= 0. Accepting
    /// it would make the brake-distance predictor divide by zero.
    NonPositiveAccel,
    /// A directly-supplied endpoint pair had `pos_start > pos_end`. The
    /// teach-and-learn flow (§4.3) can't produce this; it's only reachable
    /// by a settings-channel write that bypasses it.
    InvertedEndpoints,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub mode: Mode,

    pub p: f64,
    pub i: f64,
    pub d: f64,

    pub stick_neutral_pos: i32,
    pub stick_neutral_range: i32,

    pub stick_max_accel: i32,
    pub stick_max_speed: i32,
    pub stick_max_accel_safemode: i32,
    pub stick_max_speed_safemode: i32,

    pub stick_speed_factor: f64,
    pub max_position_error: f64,

    pub pos_start: i32,
    pub pos_end: i32,

    pub rc_channel_speed: RcChannel,
    pub rc_channel_programming: RcChannel,
    pub rc_channel_endpoint: RcChannel,

    // Precomputed PID coefficients (I1): recomputed whenever P, I, or D
    // change, so the PID step never observes a stale set.
    pub(crate) q0: f64,
    pub(crate) q1: f64,
    pub(crate) q2: f64,

    // Control-loop period, seconds. Fixed at construction; the 50 Hz tick
    // source is out of scope, but Ta is needed to compute Q0/Q1/Q2.
    ta: f64,
}

impl Config {
    /// `ta` is the control-loop period in seconds (0.02 for the nominal
    /// 50 Hz cadence).
    pub fn new(ta: f64) -> Self {
        let mut cfg = Self {
            mode: Mode::default(),
            p: 0.0,
            i: 0.0,
            d: 0.0,
            stick_neutral_pos: 1500,
            stick_neutral_range: 10,
            stick_max_accel: 10,
            stick_max_speed: 500,
            stick_max_accel_safemode: 5,
            stick_max_speed_safemode: 250,
            stick_speed_factor: 1.0,
            max_position_error: 100.0,
            pos_start: 0,
            pos_end: 0,
            rc_channel_speed: RcChannel(0),
            rc_channel_programming: RcChannel(1),
            rc_channel_endpoint: RcChannel(2),
            q0: 0.0,
            q1: 0.0,
            q2: 0.0,
            ta,
        };
        cfg.recalc_q();
        cfg
    }

    fn recalc_q(&mut self) {
        self.q0 = self.p + self.i * self.ta + self.d / self.ta;
        self.q1 = -self.p - 2.0 * self.d / self.ta;
        self.q2 = self.d / self.ta;
    }

    pub fn set_p(&mut self, p: f64) {
        self.p = p;
        self.recalc_q();
    }

    pub fn set_i(&mut self, i: f64) {
        self.i = i;
        self.recalc_q();
    }

    pub fn set_d(&mut self, d: f64) {
        self.d = d;
        self.recalc_q();
    }

    pub fn set_pid(&mut self, p: f64, i: f64, d: f64) {
        self.p = p;
        self.i = i;
        self.d = d;
        self.recalc_q();
    }

    /// Set the operational and safemode acceleration/speed limits. Rejects
    /// a non-positive acceleration limit, which would make
    /// [`crate::pid::brake_distance`] divide by zero.
    pub fn set_stick_limits(
        &mut self,
        max_accel: i32,
        max_speed: i32,
        max_accel_safemode: i32,
        max_speed_safemode: i32,
    ) -> Result<(), ConfigError> {
        if max_accel <= 0 || max_accel_safemode <= 0 {
            return Err(ConfigError::NonPositiveAccel);
        }
        self.stick_max_accel = max_accel;
        self.stick_max_speed = max_speed;
        self.stick_max_accel_safemode = max_accel_safemode;
        self.stick_max_speed_safemode = max_speed_safemode;
        Ok(())
    }

    /// Set learned travel endpoints directly (outside the teach-and-learn
    /// flow). Rejects an inverted pair; see (I6).
    pub fn set_endpoints(&mut self, pos_start: i32, pos_end: i32) -> Result<(), ConfigError> {
        if pos_start > pos_end {
            return Err(ConfigError::InvertedEndpoints);
        }
        self.pos_start = pos_start;
        self.pos_end = pos_end;
        Ok(())
    }
}
