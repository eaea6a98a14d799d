//! Seeded random source shared by generation and placement.
//!
//! A single 32-bit xorshift stream (shifts 13/17/5). The whole session is
//! reproducible from the raw state, so save/load only has to persist one
//! integer. The state is never zero: a zero state would make xorshift
//! emit zeros forever.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// 2^32, the divisor that maps a `u32` onto `[0, 1)`.
const U32_RANGE: f64 = 4_294_967_296.0;

/// Deterministic xorshift32 random source.
///
/// Owned by the session and passed by `&mut` to every component that
/// draws from it. Draw order is part of the save format: reordering draws
/// breaks reproducibility of restored sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeededRng {
    state: i32,
}

impl SeededRng {
    /// Create a random source from a caller-supplied seed.
    ///
    /// A zero seed is coerced to 1.
    #[must_use]
    pub fn new(seed: i32) -> Self {
        Self {
            state: non_zero(seed),
        }
    }

    /// Create a random source seeded from the wall clock.
    #[must_use]
    pub fn from_time() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(1);
        // Truncation is intended; only the low bits vary between runs.
        Self::new(millis as i32)
    }

    /// Raw state for persistence.
    #[must_use]
    pub const fn state(&self) -> i32 {
        self.state
    }

    /// Restore a raw state. Zero is coerced to 1.
    pub fn set_state(&mut self, raw: i32) {
        self.state = non_zero(raw);
    }

    /// Advance the stream and return a float in `[0, 1)`.
    pub fn next(&mut self) -> f64 {
        let mut x = self.state as u32;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x as i32;
        f64::from(x) / U32_RANGE
    }

    /// Integer in `[min, max]`, inclusive on both ends.
    ///
    /// Bounds are rounded inward (`min` up, `max` down) before drawing. An
    /// empty range still consumes one draw and returns `min`.
    pub fn random_int(&mut self, min: f64, max: f64) -> i64 {
        let lo = min.ceil() as i64;
        let hi = max.floor() as i64;
        let roll = self.next();
        if hi < lo {
            return lo;
        }
        let span = (hi - lo + 1) as f64;
        lo + (roll * span).floor() as i64
    }

    /// Convenience wrapper for integer bounds.
    pub fn range_i64(&mut self, min: i64, max: i64) -> i64 {
        self.random_int(min as f64, max as f64)
    }

    /// Float in `[lo, hi)`.
    pub fn range_f64(&mut self, lo: f64, hi: f64) -> f64 {
        lo + self.next() * (hi - lo)
    }

    /// Uniform index in `[0, len)`. `len` must be positive.
    pub fn index(&mut self, len: usize) -> usize {
        self.range_i64(0, len as i64 - 1).max(0) as usize
    }

    /// `true` with probability `p`.
    pub fn random_chance(&mut self, p: f64) -> bool {
        self.next() < p
    }
}

impl Default for SeededRng {
    fn default() -> Self {
        Self::new(1)
    }
}

const fn non_zero(raw: i32) -> i32 {
    if raw == 0 {
        1
    } else {
        raw
    }
}
