//! Q16.16 fixed-point scalar used for sub-pixel interpolation.

use std::ops::{Add, AddAssign, Sub};

use serde::{Deserialize, Serialize};

/// Signed Q16.16 fixed-point value stored in an `i32`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fixed(i32);

impl Fixed {
    /// Number of fractional bits.
    pub const FRACTION_BITS: u32 = 16;
    /// Zero.
    pub const ZERO: Self = Self(0);

    /// Wraps an already scaled raw value.
    #[must_use]
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// Scales a whole number into fixed-point.
    #[must_use]
    pub const fn from_int(value: i32) -> Self {
        Self(value << Self::FRACTION_BITS)
    }

    /// Computes `numerator / denominator` with sixteen fractional bits.
    ///
    /// A zero denominator yields zero.
    #[must_use]
    pub fn from_ratio(numerator: i32, denominator: i32) -> Self {
        if denominator == 0 {
            return Self::ZERO;
        }
        let scaled = (i64::from(numerator) << Self::FRACTION_BITS) / i64::from(denominator);
        Self(saturate(scaled))
    }

    /// Underlying scaled value.
    #[must_use]
    pub const fn raw(&self) -> i32 {
        self.0
    }

    /// Largest whole number not greater than the value.
    #[must_use]
    pub const fn floor(&self) -> i32 {
        self.0 >> Self::FRACTION_BITS
    }

    /// Half of the value, truncated toward zero.
    #[must_use]
    pub const fn halve(&self) -> Self {
        Self(self.0 / 2)
    }

    /// Value multiplied by a whole factor, saturating at the `i32` range.
    #[must_use]
    pub fn scaled(&self, factor: i32) -> Self {
        Self(saturate(i64::from(self.0) * i64::from(factor)))
    }
}

impl Add for Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.wrapping_add(rhs.0))
    }
}

impl AddAssign for Fixed {
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.wrapping_add(rhs.0);
    }
}

impl Sub for Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.wrapping_sub(rhs.0))
    }
}

fn saturate(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
}

#[cfg(test)]
mod tests {
    use super::Fixed;

    #[test]
    fn ratio_keeps_sixteen_fraction_bits() {
        let delta = Fixed::from_ratio(128, 16);
        assert_eq!(delta, Fixed::from_int(8));
        assert_eq!(Fixed::from_ratio(1, 2).raw(), 1 << 15);
    }

    #[test]
    fn floor_rounds_toward_negative_infinity() {
        assert_eq!(Fixed::from_ratio(-1, 2).floor(), -1);
        assert_eq!(Fixed::from_ratio(3, 2).floor(), 1);
    }

    #[test]
    fn zero_denominator_produces_zero() {
        assert_eq!(Fixed::from_ratio(40, 0), Fixed::ZERO);
    }

    #[test]
    fn scaled_saturates_instead_of_wrapping() {
        assert_eq!(Fixed::from_int(30_000).scaled(4).raw(), i32::MAX);
    }
}
