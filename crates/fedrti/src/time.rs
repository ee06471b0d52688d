// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Logical federation time.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Add;

/// A point on the federation's logical time axis.
///
/// Logical time, not wall time. Values are compared with `f64::total_cmp`
/// so the ordering is total and identical on both ends of a connection;
/// NaN never appears in practice but still has a defined position.
#[derive(Debug, Clone, Copy, Default)]
pub struct FederationTime(f64);

impl FederationTime {
    pub const ZERO: Self = Self(0.0);
    /// Bound used when no federate regulates.
    pub const INFINITY: Self = Self(f64::INFINITY);

    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> f64 {
        self.0
    }

    pub fn is_infinite(self) -> bool {
        self.0.is_infinite() && self.0.is_sign_positive()
    }
}

impl PartialEq for FederationTime {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FederationTime {}

impl PartialOrd for FederationTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FederationTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Add for FederationTime {
    type Output = FederationTime;

    fn add(self, rhs: Self) -> Self::Output {
        FederationTime(self.0 + rhs.0)
    }
}

impl From<f64> for FederationTime {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl fmt::Display for FederationTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_infinite() {
            write!(f, "+inf")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_order() {
        let a = FederationTime::new(1.5);
        let b = FederationTime::new(2.0);
        assert!(a < b);
        assert!(b < FederationTime::INFINITY);
        assert_eq!(a.max(b), b);
        assert_eq!(FederationTime::new(0.0), FederationTime::ZERO);
    }

    #[test]
    fn test_add_lookahead() {
        let t = FederationTime::new(10.0) + FederationTime::new(0.5);
        assert_eq!(t.value(), 10.5);
    }

    #[test]
    fn test_display() {
        assert_eq!(FederationTime::INFINITY.to_string(), "+inf");
        assert_eq!(FederationTime::new(3.0).to_string(), "3");
    }
}
