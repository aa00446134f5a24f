//! Fixed-point money type.
//!
//! All monetary values in this system are integer cents stored as `i64`
//! (exchange prices are cents per contract, account balances are cents).
//! `Cents` wraps the raw integer so contract counts, prices, and cash cannot
//! be mixed silently; ratio fields (percentages) are the only floats.

use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// A monetary amount in integer cents. 1 USD = `Cents(100)`.
///
/// Construct with [`Cents::new`]; there is intentionally no `From<i64>` so a
/// raw integer must be claimed as money explicitly. Serializes as the bare
/// integer.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Cents(i64);

impl Cents {
    pub const ZERO: Cents = Cents(0);

    #[inline]
    pub const fn new(raw: i64) -> Self {
        Cents(raw)
    }

    /// The underlying raw cent count.
    #[inline]
    pub const fn raw(self) -> i64 {
        self.0
    }

    #[inline]
    pub fn saturating_add(self, rhs: Cents) -> Cents {
        Cents(self.0.saturating_add(rhs.0))
    }

    #[inline]
    pub fn saturating_sub(self, rhs: Cents) -> Cents {
        Cents(self.0.saturating_sub(rhs.0))
    }

    /// Absolute value; `i64::MIN` saturates.
    #[inline]
    pub fn abs(self) -> Cents {
        Cents(self.0.saturating_abs())
    }

    /// Multiply a per-contract price by a contract count, clamping at the
    /// `i64` range. Quantities are plain integers, not money.
    #[inline]
    pub fn mul_qty(self, qty: i64) -> Cents {
        let wide = (self.0 as i128) * (qty as i128);
        Cents(clamp_i128(wide))
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// This amount as a float, for ratio math only (never for money sums).
    #[inline]
    pub fn as_f64(self) -> f64 {
        self.0 as f64
    }
}

pub(crate) fn clamp_i128(x: i128) -> i64 {
    if x > i64::MAX as i128 {
        i64::MAX
    } else if x < i64::MIN as i128 {
        i64::MIN
    } else {
        x as i64
    }
}

impl Add for Cents {
    type Output = Cents;
    #[inline]
    fn add(self, rhs: Cents) -> Cents {
        Cents(self.0 + rhs.0)
    }
}

impl Sub for Cents {
    type Output = Cents;
    #[inline]
    fn sub(self, rhs: Cents) -> Cents {
        Cents(self.0 - rhs.0)
    }
}

impl Neg for Cents {
    type Output = Cents;
    #[inline]
    fn neg(self) -> Cents {
        Cents(-self.0)
    }
}

impl AddAssign for Cents {
    #[inline]
    fn add_assign(&mut self, rhs: Cents) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Cents {
    #[inline]
    fn sub_assign(&mut self, rhs: Cents) {
        self.0 -= rhs.0;
    }
}

impl std::fmt::Display for Cents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dollars = self.0 / 100;
        let frac = (self.0 % 100).abs();
        // "-0.75" would lose its sign through integer division; emit it by hand.
        if self.0 < 0 && dollars == 0 {
            write!(f, "-{dollars}.{frac:02}")
        } else {
            write!(f, "{dollars}.{frac:02}")
        }
    }
}
