//! Fee and transfer amounts.
//!
//! All arithmetic happens on integer tinybars. The `hbar` unit exists only
//! for display and for the occasional human-friendly constructor.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tinybars per hbar.
pub const TINYBARS_PER_HBAR: i64 = 100_000_000;

/// An amount expressed in tinybars, the smallest indivisible unit.
///
/// Signed because transfer lists carry debits as negative amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Hbar(i64);

impl Hbar {
    /// Zero tinybars.
    pub const ZERO: Self = Self(0);

    /// Creates an amount from a raw tinybar count.
    pub const fn from_tinybars(tinybars: i64) -> Self {
        Self(tinybars)
    }

    /// Creates an amount from whole hbars. Saturates instead of overflowing.
    pub const fn new(hbars: i64) -> Self {
        Self(hbars.saturating_mul(TINYBARS_PER_HBAR))
    }

    /// Returns the raw tinybar count.
    pub const fn to_tinybars(self) -> i64 {
        self.0
    }

    /// Returns the amount with its sign flipped.
    pub const fn negated(self) -> Self {
        Self(self.0.saturating_neg())
    }

    /// Returns `true` for zero.
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Hbar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % TINYBARS_PER_HBAR == 0 {
            write!(f, "{} ℏ", self.0 / TINYBARS_PER_HBAR)
        } else {
            write!(f, "{} tℏ", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_hbars_convert_to_tinybars() {
        assert_eq!(Hbar::new(2).to_tinybars(), 200_000_000);
        assert_eq!(Hbar::from_tinybars(100_000).to_tinybars(), 100_000);
    }

    #[test]
    fn display_prefers_whole_units() {
        assert_eq!(Hbar::new(2).to_string(), "2 ℏ");
        assert_eq!(Hbar::from_tinybars(100_000).to_string(), "100000 tℏ");
    }

    #[test]
    fn negation_flips_sign() {
        assert_eq!(Hbar::new(1).negated(), Hbar::from_tinybars(-100_000_000));
        assert!(Hbar::ZERO.negated().is_zero());
    }
}
