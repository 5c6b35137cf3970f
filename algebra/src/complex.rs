//! Complex projector coefficients and their source-literal form.
//!
//! Coefficients only ever appear in generated text, either in the projector
//! dump comments or folded into signed term lists. Formatting is therefore
//! exact and canonical rather than numerically general.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use std::str::FromStr;

use num_complex::Complex64;

use crate::error::AlgebraError;

/// An immutable complex coefficient of a projector or gamma matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficient(pub Complex64);

impl Coefficient {
    /// `0`
    pub const ZERO: Self = Self::new(0.0, 0.0);
    /// `1`
    pub const ONE: Self = Self::new(1.0, 0.0);
    /// `-1`
    pub const MINUS_ONE: Self = Self::new(-1.0, 0.0);
    /// `i`
    pub const I: Self = Self::new(0.0, 1.0);
    /// `-i`
    pub const MINUS_I: Self = Self::new(0.0, -1.0);

    /// Creates a coefficient from its real and imaginary parts.
    #[must_use]
    pub const fn new(re: f64, im: f64) -> Self {
        Self(Complex64::new(re, im))
    }

    /// Real part.
    #[must_use]
    pub fn re(self) -> f64 {
        self.0.re
    }

    /// Imaginary part.
    #[must_use]
    pub fn im(self) -> f64 {
        self.0.im
    }

    /// Returns true if both parts are exactly zero.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0.re == 0.0 && self.0.im == 0.0
    }
}

impl Add for Coefficient {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Coefficient {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Mul for Coefficient {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self(self.0 * rhs.0)
    }
}

impl Neg for Coefficient {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

/// Integral values print without a decimal point.
fn real_literal(a: f64) -> String {
    if a == a.trunc() {
        format!("{}", a as i64)
    } else {
        format!("{a}")
    }
}

fn imaginary_literal(a: f64) -> String {
    if a == 0.0 {
        "0i".to_string()
    } else if a == 1.0 {
        "i".to_string()
    } else if a == -1.0 {
        "-i".to_string()
    } else {
        format!("{}i", real_literal(a))
    }
}

impl fmt::Display for Coefficient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (re, im) = (self.re(), self.im());
        if re == 0.0 && im == 0.0 {
            f.write_str("0")
        } else if re == 0.0 {
            f.write_str(&imaginary_literal(im))
        } else if im == 0.0 {
            f.write_str(&real_literal(re))
        } else if im < 0.0 {
            write!(f, "{}-{}", real_literal(re), imaginary_literal(-im))
        } else {
            write!(f, "{}+{}", real_literal(re), imaginary_literal(im))
        }
    }
}

impl FromStr for Coefficient {
    type Err = AlgebraError;

    /// Parses any literal produced by [`Coefficient`]'s `Display` impl.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || AlgebraError::InvalidLiteral(s.to_string());
        if s.is_empty() {
            return Err(invalid());
        }

        let Some(body) = s.strip_suffix('i') else {
            return s
                .parse::<f64>()
                .map(|re| Self::new(re, 0.0))
                .map_err(|_| invalid());
        };

        // The last sign after the first character separates re from im.
        let split = body
            .char_indices()
            .skip(1)
            .filter(|(_, ch)| *ch == '+' || *ch == '-')
            .map(|(at, _)| at)
            .last();
        let (re_part, im_part) = match split {
            Some(at) => (&body[..at], &body[at..]),
            None => ("", body),
        };

        let re = if re_part.is_empty() {
            0.0
        } else {
            re_part.parse::<f64>().map_err(|_| invalid())?
        };
        let im = match im_part {
            "" | "+" => 1.0,
            "-" => -1.0,
            digits => digits.parse::<f64>().map_err(|_| invalid())?,
        };
        Ok(Self::new(re, im))
    }
}

/// A nonzero coefficient usable as a term of a sparse add/subtract list.
///
/// `Real(w)` contributes `w·z`; `Imaginary(w)` contributes `i·w·z`, which
/// swaps the real and imaginary parts of `z` with a sign flip on the new real
/// part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weight {
    /// Purely real weight.
    Real(i8),
    /// Purely imaginary weight (the stored value is the imaginary part).
    Imaginary(i8),
}

impl Weight {
    /// Classifies a coefficient. Zero yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::UnsupportedWeight`] if the coefficient has both
    /// parts nonzero or a magnitude other than 1 or 2.
    pub fn from_coefficient(c: Coefficient) -> Result<Option<Self>, AlgebraError> {
        let unsupported = || AlgebraError::UnsupportedWeight {
            literal: c.to_string(),
        };
        match (c.re() == 0.0, c.im() == 0.0) {
            (true, true) => Ok(None),
            (false, true) => small_integer(c.re())
                .map(|w| Some(Self::Real(w)))
                .ok_or_else(unsupported),
            (true, false) => small_integer(c.im())
                .map(|w| Some(Self::Imaginary(w)))
                .ok_or_else(unsupported),
            (false, false) => Err(unsupported()),
        }
    }

    /// The signed scale, ignoring whether the weight is real or imaginary.
    #[must_use]
    pub fn value(self) -> i8 {
        match self {
            Self::Real(w) | Self::Imaginary(w) => w,
        }
    }
}

fn small_integer(x: f64) -> Option<i8> {
    [1i8, -1, 2, -2].into_iter().find(|w| f64::from(*w) == x)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn zero_and_units() {
        assert_eq!(Coefficient::ZERO.to_string(), "0");
        assert_eq!(Coefficient::I.to_string(), "i");
        assert_eq!(Coefficient::MINUS_I.to_string(), "-i");
        assert_eq!(Coefficient::new(-0.0, 0.0).to_string(), "0");
    }

    #[test]
    fn integral_parts_have_no_decimal_point() {
        assert_eq!(Coefficient::new(2.0, 0.0).to_string(), "2");
        assert_eq!(Coefficient::new(0.0, -2.0).to_string(), "-2i");
        assert_eq!(Coefficient::new(0.5, 0.0).to_string(), "0.5");
    }

    #[test]
    fn general_values_never_double_sign() {
        assert_eq!(Coefficient::new(1.0, -1.0).to_string(), "1-i");
        assert_eq!(Coefficient::new(-2.0, 0.5).to_string(), "-2+0.5i");
        assert_eq!(Coefficient::new(1.0, -2.0).to_string(), "1-2i");
    }

    #[test]
    fn parses_its_own_output() {
        for literal in ["0", "i", "-i", "2", "-0.5i", "1-i", "-2+0.5i"] {
            let c: Coefficient = literal.parse().unwrap();
            assert_eq!(c.to_string(), literal);
        }
        assert!("".parse::<Coefficient>().is_err());
        assert!("1+xi".parse::<Coefficient>().is_err());
    }

    #[test]
    fn weights() {
        assert_eq!(Weight::from_coefficient(Coefficient::ZERO), Ok(None));
        assert_eq!(
            Weight::from_coefficient(Coefficient::new(-2.0, 0.0)),
            Ok(Some(Weight::Real(-2)))
        );
        assert_eq!(
            Weight::from_coefficient(Coefficient::I),
            Ok(Some(Weight::Imaginary(1)))
        );
        assert!(Weight::from_coefficient(Coefficient::new(1.0, 1.0)).is_err());
        assert!(Weight::from_coefficient(Coefficient::new(0.5, 0.0)).is_err());
    }
}
