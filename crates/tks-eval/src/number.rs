//! Numeric semantics: integers stay integers until an operation needs a
//! float (division, negative exponents, overflow).

use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Int(n) => n as f64,
            Self::Float(n) => n,
        }
    }

    pub fn is_truthy(self) -> bool {
        match self {
            Self::Int(n) => n != 0,
            Self::Float(n) => n != 0.0,
        }
    }

    /// Integer value usable as a repeat count. Floats are not counts.
    pub fn as_count(self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(n),
            Self::Float(_) => None,
        }
    }

    /// Integer part, as a native `int()` conversion would produce.
    pub fn truncate(self) -> i64 {
        match self {
            Self::Int(n) => n,
            Self::Float(n) => n.trunc() as i64,
        }
    }

    pub fn add(self, other: Self) -> Self {
        self.integral(other, i64::checked_add, |a, b| a + b)
    }

    pub fn sub(self, other: Self) -> Self {
        self.integral(other, i64::checked_sub, |a, b| a - b)
    }

    pub fn mul(self, other: Self) -> Self {
        self.integral(other, i64::checked_mul, |a, b| a * b)
    }

    /// True division. `None` when dividing by zero.
    pub fn div(self, other: Self) -> Option<Self> {
        if !other.is_truthy() {
            return None;
        }
        Some(Self::Float(self.as_f64() / other.as_f64()))
    }

    /// `None` when zero is raised to a negative power.
    pub fn pow(self, other: Self) -> Option<Self> {
        if !self.is_truthy() && other.as_f64() < 0.0 {
            return None;
        }
        let float = || Self::Float(self.as_f64().powf(other.as_f64()));
        match (self, other) {
            (Self::Int(base), Self::Int(exp)) if exp >= 0 => Some(
                u32::try_from(exp)
                    .ok()
                    .and_then(|exp| base.checked_pow(exp))
                    .map_or_else(float, Self::Int),
            ),
            _ => Some(float()),
        }
    }

    pub fn compare(self, other: Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(&b)),
            _ => self.as_f64().partial_cmp(&other.as_f64()),
        }
    }

    /// `self and other`, as an integer.
    pub fn and(self, other: Self) -> Self {
        let picked = if self.is_truthy() { other } else { self };
        Self::Int(picked.truncate())
    }

    /// `self or other`, as an integer.
    pub fn or(self, other: Self) -> Self {
        let picked = if self.is_truthy() { self } else { other };
        Self::Int(picked.truncate())
    }

    pub fn not(self) -> Self {
        Self::from(!self.is_truthy())
    }

    fn integral(
        self,
        other: Self,
        int_op: fn(i64, i64) -> Option<i64>,
        float_op: fn(f64, f64) -> f64,
    ) -> Self {
        if let (Self::Int(a), Self::Int(b)) = (self, other) {
            if let Some(n) = int_op(a, b) {
                return Self::Int(n);
            }
        }
        Self::Float(float_op(self.as_f64(), other.as_f64()))
    }
}

impl From<bool> for Number {
    fn from(b: bool) -> Self {
        Self::Int(i64::from(b))
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n:?}"),
        }
    }
}
