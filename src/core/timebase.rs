// src/core/timebase.rs
//
// Conversions between container time-base units and output sample indices.

use serde::{Deserialize, Serialize};

/// Duration of one timestamp unit, as the rational `num / den` seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeBase {
    pub num: u32,
    pub den: u32,
}

impl TimeBase {
    /// Returns `None` for a zero numerator or denominator.
    pub fn new(num: u32, den: u32) -> Option<Self> {
        if num == 0 || den == 0 {
            None
        } else {
            Some(Self { num, den })
        }
    }

    /// Convert a timestamp to seconds, for display.
    pub fn seconds(&self, ts: i64) -> f64 {
        ts as f64 * self.num as f64 / self.den as f64
    }
}

impl std::fmt::Display for TimeBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// Maps a stream's time base onto a fixed output sample rate.
///
/// Both directions round half away from zero and are computed exactly in
/// 128-bit integers. A round trip through time-base units moves a sample
/// index by at most one as long as one time-base unit is no longer than one
/// sample period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleClock {
    time_base: TimeBase,
    sample_rate: u32,
}

impl SampleClock {
    pub fn new(time_base: TimeBase, sample_rate: u32) -> Self {
        Self {
            time_base,
            sample_rate: sample_rate.max(1),
        }
    }

    pub fn time_base(&self) -> TimeBase {
        self.time_base
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// `round(t * num/den * sample_rate)`
    pub fn samples_from_timebase(&self, t: i64) -> i64 {
        let n = t as i128 * self.time_base.num as i128 * self.sample_rate as i128;
        saturate(round_div(n, self.time_base.den as i128))
    }

    /// `round(s / (num/den) / sample_rate)`
    pub fn timebase_from_samples(&self, s: i64) -> i64 {
        let n = s as i128 * self.time_base.den as i128;
        let d = self.time_base.num as i128 * self.sample_rate as i128;
        saturate(round_div(n, d))
    }
}

/// Integer division rounding half away from zero. `d` must be positive.
fn round_div(n: i128, d: i128) -> i128 {
    if n >= 0 {
        (2 * n + d) / (2 * d)
    } else {
        -((-2 * n + d) / (2 * d))
    }
}

fn saturate(v: i128) -> i64 {
    i64::try_from(v).unwrap_or(if v < 0 { i64::MIN } else { i64::MAX })
}
