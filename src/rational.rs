// syntxt-midi -- compiling plain-text note sketches into MIDI
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Rational numbers are used for designating times on the song level, e.g. note lengths in beats.

use std::convert::TryFrom;
use std::{cmp::Ordering, fmt, ops};

/// Underlying integral type for the rational numbers.
type Int = i64;

/// Intermediate results are computed with twice the width, so that products
/// of two `Int`s never overflow before being normalized again.
type Wide = i128;

/// Decimal literals with more fractional digits than this are rejected,
/// since `10^k` would no longer fit comfortably into the denominator.
const MAX_DECIMAL_DIGITS: usize = 12;

/// A rational number, always fully normalized.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Rational {
    /// The numerator of the fraction.
    /// If the fraction is negative, the numerator will be made negative.
    num: Int,
    /// The denominator of the fraction, always positive.
    denom: Int,
}

impl Rational {
    /// Create a new rational from a potentially unnormalized fraction.
    ///
    /// # Panic
    ///
    /// Panics if the denominator is zero, or if the normalized fraction is
    /// not representable (e.g. `i64::MIN / -1`).
    ///
    /// # Examples
    ///
    /// ```
    /// use syntxt_midi::rational::*;
    ///
    /// assert_eq!(Rational::new(10, 5), Rational::new(2, 1));
    /// assert_eq!(Rational::new(-10, -5), Rational::new(6, 3));
    /// assert_eq!(Rational::new(-6, 8), Rational::new(3, -4));
    /// ```
    pub fn new(num: Int, denom: Int) -> Rational {
        assert_ne!(denom, 0, "Denominator must not be zero");
        match Rational::checked_new(num, denom) {
            Some(r) => r,
            None => panic!("{}/{} is not representable", num, denom),
        }
    }

    /// Like [`Rational::new`], but returns `None` instead of panicking.
    ///
    /// ```
    /// use syntxt_midi::rational::*;
    ///
    /// assert_eq!(Rational::checked_new(3, 6), Some(Rational::new(1, 2)));
    /// assert_eq!(Rational::checked_new(1, 0), None);
    /// assert_eq!(Rational::checked_new(i64::MIN, -1), None);
    /// ```
    pub fn checked_new(num: Int, denom: Int) -> Option<Rational> {
        Rational::reduce(Wide::from(num), Wide::from(denom))
    }

    fn reduce(num: Wide, denom: Wide) -> Option<Rational> {
        if denom == 0 {
            return None;
        }
        let sign = num.signum() * denom.signum();
        let div = gcd(num, denom);
        Some(Rational {
            num: Int::try_from(sign * num.abs() / div).ok()?,
            denom: Int::try_from(denom.abs() / div).ok()?,
        })
    }

    pub fn from_int(int: Int) -> Rational {
        Rational { num: int, denom: 1 }
    }

    pub fn zero() -> Rational {
        Rational::from_int(0)
    }

    pub fn is_positive(self) -> bool {
        self.num > 0
    }

    /// Addition returning `None` when the normalized sum does not fit.
    ///
    /// ```
    /// use syntxt_midi::rational::*;
    ///
    /// let tiny = Rational::new(1, i64::MAX);
    /// assert_eq!(tiny.checked_add(tiny), Some(Rational::new(2, i64::MAX)));
    /// assert_eq!(tiny.checked_add(Rational::new(1, i64::MAX - 1)), None);
    /// ```
    pub fn checked_add(self, rhs: Rational) -> Option<Rational> {
        let (a, b) = (Wide::from(self.num), Wide::from(self.denom));
        let (c, d) = (Wide::from(rhs.num), Wide::from(rhs.denom));
        Rational::reduce(a * d + c * b, b * d)
    }

    /// Multiplication by an integer returning `None` when the result does not fit.
    pub fn checked_mul_int(self, rhs: Int) -> Option<Rational> {
        Rational::reduce(
            Wide::from(self.num) * Wide::from(rhs),
            Wide::from(self.denom),
        )
    }

    /// Round to the nearest integer, rounding halves away from zero.
    ///
    /// ```
    /// use syntxt_midi::rational::*;
    ///
    /// assert_eq!(Rational::new(7, 2).round(), 4);
    /// assert_eq!(Rational::new(10, 3).round(), 3);
    /// assert_eq!(Rational::new(-7, 2).round(), -4);
    /// ```
    pub fn round(self) -> Int {
        let (num, denom) = (Wide::from(self.num), Wide::from(self.denom));
        let rounded = num.signum() * ((2 * num.abs() + denom) / (2 * denom));
        // |rounded| <= |num| for denom > 1, and rounded == num otherwise
        rounded as Int
    }

    /// The exact decimal notation, if it terminates within a few digits.
    ///
    /// ```
    /// use syntxt_midi::rational::*;
    ///
    /// assert_eq!(Rational::new(3, 2).to_decimal().as_deref(), Some("1.5"));
    /// assert_eq!(Rational::new(-1, 20).to_decimal().as_deref(), Some("-0.05"));
    /// assert_eq!(Rational::from_int(2).to_decimal().as_deref(), Some("2"));
    /// assert_eq!(Rational::new(1, 3).to_decimal(), None);
    /// ```
    pub fn to_decimal(self) -> Option<String> {
        let mut rest = self.denom;
        let (mut twos, mut fives) = (0, 0);
        while rest % 2 == 0 {
            rest /= 2;
            twos += 1;
        }
        while rest % 5 == 0 {
            rest /= 5;
            fives += 1;
        }
        let digits: usize = twos.max(fives);
        if rest != 1 || digits > MAX_DECIMAL_DIGITS {
            return None;
        }

        let sign = if self.num < 0 { "-" } else { "" };
        let scale = Wide::pow(10, digits as u32);
        let scaled = Wide::from(self.num).abs() * scale / Wide::from(self.denom);
        if digits == 0 {
            Some(format!("{}{}", sign, scaled))
        } else {
            Some(format!(
                "{}{}.{:0width$}",
                sign,
                scaled / scale,
                scaled % scale,
                width = digits
            ))
        }
    }
}

/// # Panic
///
/// Panics when the sum is not representable, use [`Rational::checked_add`]
/// where that can happen.
///
/// # Examples
///
/// ```
/// use syntxt_midi::rational::*;
///
/// assert_eq!(Rational::new(1, 2) + Rational::new(3, 4), Rational::new(5, 4));
/// assert_eq!(Rational::new(3, 4) + Rational::new(-5, 8), Rational::new(1, 8));
/// ```
impl ops::Add for Rational {
    type Output = Rational;

    fn add(self, rhs: Rational) -> Self::Output {
        match self.checked_add(rhs) {
            Some(sum) => sum,
            None => panic!("overflow when adding {} and {}", self, rhs),
        }
    }
}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Rational) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// ```
/// use syntxt_midi::rational::*;
///
/// assert!(Rational::new(3,4) < Rational::new(3,2));
/// assert!(Rational::new(1, i64::MAX) < Rational::new(1, i64::MAX - 1));
/// ```
impl Ord for Rational {
    fn cmp(&self, other: &Self) -> Ordering {
        // a / b < c / d  <=>  a * d < c * b  (both denominators are positive)
        let l = Wide::from(self.num) * Wide::from(other.denom);
        let r = Wide::from(other.num) * Wide::from(self.denom);
        l.cmp(&r)
    }
}

/// Renders as an integer when the denominator is one, as `num/denom` otherwise.
impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denom == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.denom)
        }
    }
}

/// An error which can be returned when parsing a rational.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRationalError(RationalErrorKind);

impl ParseRationalError {
    pub fn kind(&self) -> RationalErrorKind {
        self.0
    }
}

impl fmt::Display for ParseRationalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            RationalErrorKind::InvalidInt => write!(f, "invalid or out of range integer"),
            RationalErrorKind::Zero => write!(f, "zero denominator"),
            RationalErrorKind::Malformed => write!(f, "malformed number"),
        }
    }
}

impl std::error::Error for ParseRationalError {}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RationalErrorKind {
    /// The numerator, denominator or a decimal part could not be parsed as integer,
    /// or the resulting fraction is not representable.
    InvalidInt,
    /// The denominator was zero
    Zero,
    /// The rational was not of the form `<int>`, `<int>.<digits>` or `<int>/<int>`
    Malformed,
}

/// Parses integers (`2`), decimals (`1.5`, `.25`) and fractions (`3/2`).
///
/// ```
/// use syntxt_midi::rational::*;
///
/// assert_eq!("1.5".parse(), Ok(Rational::new(3, 2)));
/// assert_eq!("3/2".parse(), Ok(Rational::new(3, 2)));
/// assert_eq!("-0.25".parse(), Ok(Rational::new(-1, 4)));
/// assert_eq!("2".parse(), Ok(Rational::from_int(2)));
/// assert!("1/0".parse::<Rational>().is_err());
/// assert!("1.2.3".parse::<Rational>().is_err());
/// ```
impl std::str::FromStr for Rational {
    type Err = ParseRationalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(slash) = s.find('/') {
            let numerator = parse_int(&s[..slash])?;
            let denominator = parse_int(&s[slash + 1..])?;
            if denominator == 0 {
                return Err(ParseRationalError(RationalErrorKind::Zero));
            }
            return Rational::checked_new(numerator, denominator)
                .ok_or(ParseRationalError(RationalErrorKind::InvalidInt));
        }

        match s.find('.') {
            None => Ok(Rational::from_int(parse_int(s)?)),
            Some(dot) => {
                let (int_str, frac_str) = (&s[..dot], &s[dot + 1..]);
                let negative = int_str.starts_with('-');
                let unsigned_int = int_str.trim_start_matches(|ch| ch == '-' || ch == '+');
                if unsigned_int.is_empty() && frac_str.is_empty()
                    || frac_str.len() > MAX_DECIMAL_DIGITS
                    || !frac_str.chars().all(|ch| ch.is_ascii_digit())
                {
                    return Err(ParseRationalError(RationalErrorKind::Malformed));
                }
                let whole = if unsigned_int.is_empty() {
                    0
                } else {
                    parse_int(unsigned_int)?
                };
                let scale = 10_i64.pow(frac_str.len() as u32);
                let frac = if frac_str.is_empty() {
                    0
                } else {
                    parse_int(frac_str)?
                };
                let magnitude = whole
                    .checked_mul(scale)
                    .and_then(|w| w.checked_add(frac))
                    .ok_or(ParseRationalError(RationalErrorKind::InvalidInt))?;
                let num = if negative {
                    magnitude.checked_neg()
                } else {
                    Some(magnitude)
                };
                num.and_then(|num| Rational::checked_new(num, scale))
                    .ok_or(ParseRationalError(RationalErrorKind::InvalidInt))
            }
        }
    }
}

fn parse_int(s: &str) -> Result<Int, ParseRationalError> {
    s.trim()
        .parse()
        .map_err(|_| ParseRationalError(RationalErrorKind::InvalidInt))
}

/// Computes the greatest common divisor of two numbers using euclids algorithm.
fn gcd(mut a: Wide, mut b: Wide) -> Wide {
    // normalized inputs to be positive to guarantee that it terminates
    a = a.abs();
    b = b.abs();

    // Invariant: a >= b
    if a < b {
        std::mem::swap(&mut a, &mut b)
    }

    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}
