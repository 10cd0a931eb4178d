//! Fixed-Point Coordinates
//!
//! The shaping engine works in a 24.8 fixed-point space: one device pixel
//! is 256 engine units. Every conversion between the two spaces goes
//! through [`to_device_units`] and [`to_fixed_units`].

use std::ops::{Add, Neg, Sub};

/// 24.8 fixed-point engine position (32-bit total)
///
/// - 24 bits for integer part
/// - 8 bits for fractional part: precision of 1/256 pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Fixed(i32);

impl Fixed {
    pub const FRAC_BITS: i32 = 8;
    pub const SCALE: i32 = 1 << Self::FRAC_BITS;

    pub const ZERO: Fixed = Fixed(0);
    pub const ONE: Fixed = Fixed(Self::SCALE);

    /// Create from raw engine units
    #[inline]
    pub const fn from_bits(bits: i32) -> Self {
        Self(bits)
    }

    /// Get raw engine units
    #[inline]
    pub const fn to_bits(self) -> i32 {
        self.0
    }

    /// Create from device pixels (truncates toward zero, saturates)
    #[inline]
    pub fn from_f32(value: f32) -> Self {
        Self((value * Self::SCALE as f32) as i32)
    }

    /// Convert to device pixels
    #[inline]
    pub fn to_f32(self) -> f32 {
        self.0 as f32 / Self::SCALE as f32
    }
}

impl Add for Fixed {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Fixed {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Neg for Fixed {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self(self.0.saturating_neg())
    }
}

impl From<Fixed> for f32 {
    #[inline]
    fn from(value: Fixed) -> Self {
        value.to_f32()
    }
}

/// Engine units to device pixels (divide by 256)
#[inline]
pub fn to_device_units(value: Fixed) -> f32 {
    value.to_f32()
}

/// Device pixels to engine units (multiply by 256)
#[inline]
pub fn to_fixed_units(value: f32) -> Fixed {
    Fixed::from_f32(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_scale() {
        assert_eq!(to_fixed_units(1.0).to_bits(), 256);
        assert_eq!(to_fixed_units(-2.5).to_bits(), -640);
        assert_eq!(to_device_units(Fixed::from_bits(384)), 1.5);
    }

    #[test]
    fn test_fixed_round_trip() {
        for bits in [-1_000_000, -257, -1, 0, 1, 255, 256, 12_345, 8_388_607] {
            let value = Fixed::from_bits(bits);
            assert_eq!(to_fixed_units(to_device_units(value)), value);
        }
    }

    #[test]
    fn test_fixed_sub_unit_truncates() {
        // Below one engine unit the value is lost
        assert_eq!(to_fixed_units(0.001), Fixed::ZERO);
        assert_eq!(to_fixed_units(1.0 / 256.0), Fixed::from_bits(1));
    }

    #[test]
    fn test_fixed_ops() {
        let a = Fixed::from_f32(10.5);
        let b = Fixed::from_f32(2.25);
        assert_eq!((a + b).to_f32(), 12.75);
        assert_eq!((a - b).to_f32(), 8.25);
        assert_eq!((-a).to_f32(), -10.5);
        assert_eq!(Fixed::from_bits(i32::MAX) + Fixed::ONE, Fixed::from_bits(i32::MAX));
    }
}
