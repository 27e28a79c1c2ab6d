//! The top-level per-cycle aggregate: wires the safety arbiter, stick
//! conditioner, endpoint programmer, brake-distance predictor and
//! absolute-position PID into the single `tick()` call the 50 Hz timer
//! invokes (`spec.md` §5's "single-threaded cooperative periodic timer").

use crate::config::{Config, Mode};
use crate::duty::Duty;
use crate::endpoint::EndpointProgrammer;
use crate::monitor::Monitor;
use crate::pid::{self, Pid};
use crate::safety::{SafeMode, SafetyArbiter};
use crate::stick;
use crate::telemetry;
use crate::traits::TelemetrySink;

/// One cycle's external readings, taken as a consistent snapshot at cycle
/// entry (`spec.md` §5) before `tick` runs. `frame` is an opaque,
/// monotonically increasing counter the caller supplies for the telemetry
/// line's `Time:` field — the receiver's own last-valid-frame counter in
/// the source this was distilled from, not reproduced here since frame
/// decoding is out of scope (`spec.md` §1).
#[derive(Clone, Copy, Debug)]
pub struct CycleInputs {
    pub speed: Duty,
    pub programming: Duty,
    pub endpoint: Duty,
    pub encoder: i32,
    pub frame: u32,
    pub is_1hz: bool,
}

/// Runtime state for one control loop. Construct once at startup; `tick`
/// is the only entry point thereafter.
#[derive(Default, Debug)]
pub struct Controller {
    safety: SafetyArbiter,
    endpoint: EndpointProgrammer,
    pid: Pid,
    monitor: Monitor,

    stick_requested_value: i32,
    pos_current_old: i32,
    pos_target: f64,
    pos_target_old: f64,
    speed_old: f64,
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one 50 Hz cycle. Returns the signed ESC command, already
    /// saturated to `i16` (§4.4's truncation/saturation contract). Never
    /// panics and never returns early: every branch below runs to the
    /// saturate-and-return at the bottom, matching `spec.md` §7 ("nothing
    /// propagates upward from the cycle").
    pub fn tick(&mut self, cfg: &mut Config, inputs: CycleInputs, sink: &mut impl TelemetrySink) -> i16 {
        self.monitor = Monitor::Free;

        let outcome = self.safety.arbitrate(cfg, inputs.speed, inputs.programming);
        if outcome.entered_programming {
            self.endpoint.reset_clicks();
        }

        let pos_current = inputs.encoder;
        let pos = pos_current as f64;

        // Predicted stop distance from *last* cycle's speed, before this
        // cycle updates it — the conditioner brakes in anticipation of
        // where the platform is headed, not where it already is.
        let brake_distance = pid::brake_distance(cfg, self.speed_old);

        let desired = if outcome.suppress {
            0
        } else {
            stick::deadband(cfg, inputs.speed)
        };

        // In `AbsolutePosition` mode the endpoint-brake override compares
        // against the virtual target, not the measured position — the
        // platform brakes as it approaches the edge of where it's been
        // told to go, not the edge of where it physically is this instant.
        let pos_for_stick = if cfg.mode == Mode::AbsolutePosition {
            self.pos_target_old
        } else {
            pos
        };

        self.stick_requested_value = stick::condition(
            cfg,
            self.safety.safemode,
            desired,
            self.stick_requested_value,
            pos_for_stick,
            brake_distance,
            &mut self.monitor,
        );

        self.endpoint
            .process(cfg, self.safety.safemode, inputs.endpoint, pos_current);

        let speed_current = (self.pos_current_old - pos_current) as f64;
        let mut esc_output = self.stick_requested_value as f64;

        if cfg.mode == Mode::AbsolutePosition {
            self.pos_target += self.stick_requested_value as f64 * cfg.stick_speed_factor;
            if self.safety.safemode == SafeMode::Operational {
                self.pos_target = self.pos_target.clamp(cfg.pos_start as f64, cfg.pos_end as f64);
            }
            self.speed_old = self.pos_target - self.pos_target_old;
            self.pos_target_old = self.pos_target;

            let e = self.pos_target - pos;
            let step = self.pid.step(cfg, e);
            if step.emergency_brake {
                self.monitor = Monitor::EmergencyBrake;
                esc_output = 0.0;
            } else {
                esc_output = step.y;
            }
        } else {
            // Limiter and Passthrough both track the measured encoder
            // delta instead of a virtual target (`spec.md` §4.4).
            self.speed_old = speed_current;
        }

        self.pos_current_old = pos_current;

        let esc_output = pid::saturate_to_esc(esc_output);

        if inputs.is_1hz {
            let line = telemetry::render(
                inputs.frame,
                inputs.speed,
                self.safety.safemode,
                self.stick_requested_value,
                self.speed_old,
                brake_distance,
                self.monitor,
                pos_current,
            );
            sink.emit(&line);
        }

        esc_output
    }

    pub fn safemode(&self) -> SafeMode {
        self.safety.safemode
    }

    pub fn monitor(&self) -> Monitor {
        self.monitor
    }

    pub fn target_pos(&self) -> f64 {
        self.pos_target
    }

    pub fn speed(&self) -> f64 {
        self.speed_old
    }

    pub fn pos(&self) -> i32 {
        self.pos_current_old
    }

    pub fn stick_requested_value(&self) -> i32 {
        self.stick_requested_value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::NullSink;

    fn cfg_limiter() -> Config {
        let mut cfg = Config::new(0.02);
        cfg.mode = Mode::Limiter;
        cfg
    }

    fn cfg_absolute() -> Config {
        let mut cfg = Config::new(0.02);
        cfg.mode = Mode::AbsolutePosition;
        cfg.set_endpoints(-1000, 1000).unwrap();
        cfg.set_pid(1.0, 0.0, 0.0);
        cfg
    }

    fn inputs(speed: u16, programming: u16, endpoint: u16, encoder: i32) -> CycleInputs {
        CycleInputs {
            speed: Duty(speed),
            programming: Duty(programming),
            endpoint: Duty(endpoint),
            encoder,
            frame: 0,
            is_1hz: false,
        }
    }

    fn warm_up_operational(c: &mut Controller, cfg: &mut Config) {
        // Boot-time neutral check (I5), then high programming channel to
        // reach Operational.
        c.tick(cfg, inputs(1500, 1800, 1000, 0), &mut NullSink);
        c.tick(cfg, inputs(1500, 1800, 1000, 0), &mut NullSink);
    }

    // P1 (I4): an invalid speed channel always suppresses output to 0
    // within the acceleration slew's reach — a single cycle from rest
    // clamps straight to 0.
    #[test]
    fn invalid_rc_suppresses_output() {
        let mut cfg = cfg_limiter();
        let mut c = Controller::new();
        let out = c.tick(&mut cfg, inputs(0, 1800, 1000, 0), &mut NullSink);
        assert_eq!(out, 0);
        assert_eq!(c.safemode(), SafeMode::InvalidRc);
    }

    // I5: safemode never leaves InvalidRc before a neutral reading is
    // observed, even with the programming channel already high.
    #[test]
    fn invalid_rc_requires_neutral_before_leaving() {
        let mut cfg = cfg_limiter();
        let mut c = Controller::new();
        c.tick(&mut cfg, inputs(1900, 1800, 1000, 0), &mut NullSink);
        assert_eq!(c.safemode(), SafeMode::InvalidRc);
        c.tick(&mut cfg, inputs(1500, 1800, 1000, 0), &mut NullSink);
        assert_eq!(c.safemode(), SafeMode::Operational);
    }

    // P2: programming channel low/high selects Programming/Operational
    // once past the InvalidRc gate.
    #[test]
    fn programming_switch_selects_safemode() {
        let mut cfg = cfg_limiter();
        let mut c = Controller::new();
        c.tick(&mut cfg, inputs(1500, 1000, 1000, 0), &mut NullSink);
        assert_eq!(c.safemode(), SafeMode::Programming);
        c.tick(&mut cfg, inputs(1500, 1800, 1000, 0), &mut NullSink);
        assert_eq!(c.safemode(), SafeMode::Operational);
    }

    // P3: deadband removal is continuous across the band edge.
    #[test]
    fn deadband_continuous_at_edge() {
        let cfg = cfg_limiter();
        assert_eq!(stick::deadband(&cfg, Duty(1500)), 0);
        assert_eq!(stick::deadband(&cfg, Duty(1510)), 0);
        assert_eq!(stick::deadband(&cfg, Duty(1511)), 1);
        assert_eq!(stick::deadband(&cfg, Duty(1490)), 0);
        assert_eq!(stick::deadband(&cfg, Duty(1489)), -1);
    }

    // P4: acceleration slew bounds the per-cycle change in
    // stick_requested_value to stick_max_accel regardless of how large
    // the deadbanded input jump is.
    #[test]
    fn slew_bounds_per_cycle_change() {
        let mut cfg = cfg_limiter();
        let mut c = Controller::new();
        warm_up_operational(&mut c, &mut cfg);
        c.tick(&mut cfg, inputs(2000, 1800, 1000, 0), &mut NullSink);
        assert_eq!(c.stick_requested_value(), cfg.stick_max_accel);
        c.tick(&mut cfg, inputs(2000, 1800, 1000, 0), &mut NullSink);
        assert_eq!(c.stick_requested_value(), cfg.stick_max_accel * 2);
    }

    // P5: stick_requested_value never exceeds +/- stick_max_speed, even
    // after many cycles of full-deflection input. stick_max_speed is set
    // below the deadbanded ceiling of `inputs(2000, ...)` (2000 - 1500 - 10
    // = 490) so the absolute clamp is what's actually under test, not the
    // slew limiter converging short of it.
    #[test]
    fn speed_clamp_holds_under_sustained_input() {
        let mut cfg = cfg_limiter();
        cfg.set_stick_limits(10, 300, 5, 250).unwrap();
        let mut c = Controller::new();
        warm_up_operational(&mut c, &mut cfg);
        for _ in 0..200 {
            c.tick(&mut cfg, inputs(2000, 1800, 1000, 0), &mut NullSink);
        }
        assert_eq!(c.stick_requested_value(), cfg.stick_max_speed);
    }

    // P6 / endpoint teach-and-learn: two rising edges on the endpoint
    // switch while Programming learn pos_start then pos_end from the
    // encoder reading at each click.
    #[test]
    fn teach_and_learn_two_clicks() {
        let mut cfg = cfg_limiter();
        let mut c = Controller::new();
        c.tick(&mut cfg, inputs(1500, 1000, 1000, 0), &mut NullSink);
        assert_eq!(c.safemode(), SafeMode::Programming);

        c.tick(&mut cfg, inputs(1500, 1000, 1000, -500), &mut NullSink);
        // rising edge not yet possible: last_switch starts at 0, which the
        // edge detector explicitly excludes (see endpoint.rs) so the very
        // first high reading never counts as a click.
        c.tick(&mut cfg, inputs(1500, 1000, 900, -500), &mut NullSink);
        c.tick(&mut cfg, inputs(1500, 1000, 1500, -500), &mut NullSink);
        assert_eq!(cfg.pos_start, -500);

        c.tick(&mut cfg, inputs(1500, 1000, 900, 700), &mut NullSink);
        c.tick(&mut cfg, inputs(1500, 1000, 1500, 700), &mut NullSink);
        assert_eq!(cfg.pos_start, -500);
        assert_eq!(cfg.pos_end, 700);
    }

    // A third click past the learned pair re-partitions around the new
    // point instead of being ignored (the documented never-reset-to-0
    // behavior of the click counter).
    #[test]
    fn third_click_reprograms_relative_to_first_endpoint() {
        let mut cfg = cfg_limiter();
        let mut c = Controller::new();
        c.tick(&mut cfg, inputs(1500, 1000, 1000, 0), &mut NullSink);
        c.tick(&mut cfg, inputs(1500, 1000, 900, -500), &mut NullSink);
        c.tick(&mut cfg, inputs(1500, 1000, 1500, -500), &mut NullSink);
        c.tick(&mut cfg, inputs(1500, 1000, 900, 700), &mut NullSink);
        c.tick(&mut cfg, inputs(1500, 1000, 1500, 700), &mut NullSink);
        assert_eq!((cfg.pos_start, cfg.pos_end), (-500, 700));

        // Third click below pos_start becomes the new pos_start; the old
        // pos_start becomes pos_end.
        c.tick(&mut cfg, inputs(1500, 1000, 900, -900), &mut NullSink);
        c.tick(&mut cfg, inputs(1500, 1000, 1500, -900), &mut NullSink);
        assert_eq!((cfg.pos_start, cfg.pos_end), (-900, -500));
    }

    // Brake-distance predictor: zero measured speed predicts zero stop
    // distance, so the endpoint override only fires once actually moving.
    #[test]
    fn brake_distance_zero_at_rest() {
        let cfg = cfg_limiter();
        assert_eq!(pid::brake_distance(&cfg, 0.0), 0.0);
    }

    // A non-positive acceleration limit is rejected outright (I6-adjacent
    // config validation) rather than silently dividing by zero downstream.
    #[test]
    fn rejects_non_positive_accel() {
        let mut cfg = Config::new(0.02);
        assert_eq!(
            cfg.set_stick_limits(0, 500, 5, 250),
            Err(crate::config::ConfigError::NonPositiveAccel)
        );
    }

    #[test]
    fn rejects_inverted_endpoints() {
        let mut cfg = Config::new(0.02);
        assert_eq!(
            cfg.set_endpoints(100, -100),
            Err(crate::config::ConfigError::InvertedEndpoints)
        );
    }

    // P7: the absolute-position PID drives esc_output toward zero as the
    // measured position converges on the target, then the emergency-brake
    // gate takes over once within max_position_error.
    #[test]
    fn absolute_position_converges_then_emergency_brakes() {
        let mut cfg = cfg_absolute();
        let mut c = Controller::new();
        warm_up_operational(&mut c, &mut cfg);
        // Drive the virtual target forward, then hold the encoder fixed
        // far from it and confirm the PID pushes a nonzero command.
        for _ in 0..5 {
            c.tick(&mut cfg, inputs(2000, 1800, 1000, 0), &mut NullSink);
        }
        assert!(c.target_pos() > 0.0);
        let out = c.tick(&mut cfg, inputs(1500, 1800, 1000, 0), &mut NullSink);
        assert!(out != 0 || c.monitor() == Monitor::EmergencyBrake);
    }

    // Emergency brake gate: once the measured position is within
    // max_position_error of the target, output and PID history reset.
    #[test]
    fn emergency_brake_zeros_output_near_target() {
        let mut cfg = cfg_absolute();
        let mut c = Controller::new();
        warm_up_operational(&mut c, &mut cfg);
        let out = c.tick(&mut cfg, inputs(1500, 1800, 1000, 0), &mut NullSink);
        assert_eq!(out, 0);
        assert_eq!(c.monitor(), Monitor::EmergencyBrake);
    }

    // P8: the 1 Hz telemetry line matches the compatibility-contract
    // format exactly.
    #[test]
    fn telemetry_line_matches_contract_format() {
        let line = telemetry::render(
            42,
            Duty(1500),
            SafeMode::Operational,
            7,
            3.5,
            12.0,
            Monitor::Free,
            -200,
        );
        assert_eq!(
            line.as_str(),
            "Time: 42  Raw: 1500  OPERATIONAL  Input: 7  Speed: 3.5  Brakedistance: 12  FREE  Pos: -200"
        );
    }

    // Passthrough mode bypasses the slew/clamp/endpoint machinery entirely
    // (desired passes straight through once past InvalidRc).
    #[test]
    fn passthrough_mode_bypasses_conditioning() {
        let mut cfg = cfg_limiter();
        cfg.mode = Mode::Passthrough;
        let mut c = Controller::new();
        warm_up_operational(&mut c, &mut cfg);
        c.tick(&mut cfg, inputs(2000, 1800, 1000, 0), &mut NullSink);
        assert_eq!(c.stick_requested_value(), 500 - cfg.stick_neutral_range);
    }
}
