//! Signal Value Type
//!
//! A [`Signal`] is the scalar exchanged between modules on every tick. It is a
//! plain `f32` with a canonical boolean reading: a signal is *high* when its
//! raw value exceeds [`Signal::THRESHOLD`].
//!
//! # Operator Semantics
//!
//! - Arithmetic (`+ - * / %`) works on the raw floats. Division by zero is not
//!   trapped; IEEE infinities and NaN propagate.
//! - Logic (`& | ^ !`) works on the boolean reading and always yields the
//!   canonical [`Signal::HIGH`] or [`Signal::LOW`].
//! - Ordering (`< > <= >=`) compares the raw floats.
//! - Equality is approximate: two signals are equal when their raw values are
//!   within a small relative tolerance of each other.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, BitAnd, BitOr, BitXor, Div, Mul, Not, Rem, Sub};

use serde::{Deserialize, Serialize};

/// A scalar signal with a boolean interpretation.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signal(f32);

impl Signal {
    /// Values strictly above this read as `true`.
    pub const THRESHOLD: f32 = 0.51;

    /// Canonical low signal (`0.0`).
    pub const LOW: Signal = Signal(0.0);

    /// Canonical high signal (`1.0`).
    pub const HIGH: Signal = Signal(1.0);

    /// Create a signal from a raw value.
    pub const fn new(value: f32) -> Self {
        Self(value)
    }

    /// The raw value.
    pub const fn value(self) -> f32 {
        self.0
    }

    /// The boolean reading of this signal.
    pub fn is_high(self) -> bool {
        self.0 > Self::THRESHOLD
    }

    /// Canonical signal for a boolean.
    pub const fn from_bool(value: bool) -> Self {
        if value {
            Self::HIGH
        } else {
            Self::LOW
        }
    }
}

/// Smallest positive subnormal `f32`.
const SUBNORMAL_MIN: f32 = 1.4e-45;

/// Float comparison with a tolerance scaled to the operands' magnitude.
fn approximately(a: f32, b: f32) -> bool {
    (b - a).abs() < f32::max(1e-6 * f32::max(a.abs(), b.abs()), SUBNORMAL_MIN * 8.0)
}

impl From<f32> for Signal {
    fn from(value: f32) -> Self {
        Self(value)
    }
}

impl From<bool> for Signal {
    fn from(value: bool) -> Self {
        Self::from_bool(value)
    }
}

impl From<Signal> for f32 {
    fn from(signal: Signal) -> Self {
        signal.0
    }
}

impl From<Signal> for bool {
    fn from(signal: Signal) -> Self {
        signal.is_high()
    }
}

impl PartialEq for Signal {
    fn eq(&self, other: &Self) -> bool {
        approximately(self.0, other.0)
    }
}

/// Orders by raw value. Two signals can be `==` yet not `Equal` here.
impl PartialOrd for Signal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

macro_rules! arithmetic {
    ($($trait:ident :: $method:ident => $op:tt),* $(,)?) => {
        $(
            impl $trait for Signal {
                type Output = Signal;

                fn $method(self, rhs: Signal) -> Signal {
                    Signal(self.0 $op rhs.0)
                }
            }
        )*
    };
}

arithmetic! {
    Add::add => +,
    Sub::sub => -,
    Mul::mul => *,
    Div::div => /,
    Rem::rem => %,
}

macro_rules! logic {
    ($($trait:ident :: $method:ident => $op:tt),* $(,)?) => {
        $(
            impl $trait for Signal {
                type Output = Signal;

                fn $method(self, rhs: Signal) -> Signal {
                    Signal::from_bool(self.is_high() $op rhs.is_high())
                }
            }
        )*
    };
}

logic! {
    BitAnd::bitand => &,
    BitOr::bitor => |,
    BitXor::bitxor => ^,
}

impl Not for Signal {
    type Output = Signal;

    fn not(self) -> Signal {
        Signal::from_bool(!self.is_high())
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.0, self.is_high())
    }
}
