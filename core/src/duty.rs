//! Raw R/C pulse-width readings, as returned by the (out-of-scope) serial
//! multiplexed R/C decoder.

/// A single channel's pulse width, in microseconds.
///
/// Canonical range is 1000..=2000; `0` is the decoder's convention for
/// "stale or absent" (validity window expired, or the channel was never
/// received). `Duty` carries that convention on the type so call sites
/// don't re-derive it from a bare `u16`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, defmt::Format)]
pub struct Duty(pub u16);

impl Duty {
    pub const INVALID: Duty = Duty(0);

    /// Fixed midpoint of the canonical 1000-2000 µs range; the threshold
    /// the safety arbiter uses to distinguish "high" (operational /
    /// endpoint click) from "low" on a two-position switch channel.
    pub const HIGH_THRESHOLD: u16 = 1200;

    pub fn is_valid(self) -> bool {
        self.0 != 0
    }

    pub fn is_high(self) -> bool {
        self.0 > Self::HIGH_THRESHOLD
    }

    pub fn raw(self) -> u16 {
        self.0
    }
}

impl From<u16> for Duty {
    fn from(v: u16) -> Self {
        Duty(v)
    }
}
