//! Musical time as exact rational ticks.
//!
//! One tick is the nominal duration of an unscaled note. Time-scale operators
//! multiply by arbitrary positive rationals (`[>>3]`, `[>>1/3]`), so tick
//! counts are kept as exact fractions; conversion to seconds or samples
//! happens only in external renderers.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Sub};

use num_rational::Ratio;
use num_traits::{One, Signed, Zero};
use serde::{Deserialize, Serialize};

/// A point in musical time, or a span of it, measured in rational ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ticks(Ratio<i64>);

impl Ticks {
    pub fn zero() -> Self {
        Ticks(Ratio::zero())
    }

    pub fn one() -> Self {
        Ticks(Ratio::one())
    }

    pub fn from_int(ticks: i64) -> Self {
        Ticks(Ratio::from_integer(ticks))
    }

    /// Exact fraction of a tick. Panics if `denom` is zero.
    pub fn new(numer: i64, denom: i64) -> Self {
        Ticks(Ratio::new(numer, denom))
    }

    pub fn from_ratio(ratio: Ratio<i64>) -> Self {
        Ticks(ratio)
    }

    pub fn ratio(self) -> Ratio<i64> {
        self.0
    }

    pub fn is_positive(self) -> bool {
        self.0.is_positive()
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// Lossy conversion for renderers that schedule in floating point.
    pub fn as_f64(self) -> f64 {
        *self.0.numer() as f64 / *self.0.denom() as f64
    }
}

impl Ord for Ticks {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl PartialOrd for Ticks {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Add for Ticks {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Ticks(self.0 + rhs.0)
    }
}

impl Sub for Ticks {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Ticks(self.0 - rhs.0)
    }
}

impl Mul<Ratio<i64>> for Ticks {
    type Output = Self;

    fn mul(self, rhs: Ratio<i64>) -> Self {
        Ticks(self.0 * rhs)
    }
}

impl fmt::Display for Ticks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_integer() {
            write!(f, "{}", self.0.numer())
        } else {
            write!(f, "{}/{}", self.0.numer(), self.0.denom())
        }
    }
}
