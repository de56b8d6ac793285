//! Decimal rounding on the shortest round-trip digits of an `f64`.
//!
//! Rounding works on the decimal digits `{:e}` prints rather than on binary
//! arithmetic, so `1.45` rounds to `1.5` the way a reader expects (half-up
//! on the shortest representation).

use super::options::{DigitRange, RoundingPolicy};
use crate::core::plural::PluralOperands;

/// Decimal digits with the magnitude of the first digit.
///
/// The value is `Σ digits[i] × 10^(exponent − i)`. Zero has no digits.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Digits {
    digits: Vec<u8>,
    exponent: i32,
}

impl Digits {
    fn from_f64(value: f64) -> Self {
        let abs = value.abs();
        if abs == 0.0 || !abs.is_finite() {
            return Self::zero();
        }

        let sci = format!("{abs:e}");
        let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
        let mut digits = Self {
            digits: mantissa
                .bytes()
                .filter(u8::is_ascii_digit)
                .map(|b| b - b'0')
                .collect(),
            exponent: exponent.parse().unwrap_or(0),
        };
        digits.trim();
        digits
    }

    const fn zero() -> Self {
        Self {
            digits: Vec::new(),
            exponent: 0,
        }
    }

    fn is_zero(&self) -> bool {
        self.digits.is_empty()
    }

    fn trim(&mut self) {
        while self.digits.last() == Some(&0) {
            self.digits.pop();
        }
        if self.digits.is_empty() {
            self.exponent = 0;
        }
    }

    /// Magnitude of the lowest non-zero digit.
    fn lowest_magnitude(&self) -> i32 {
        self.exponent - self.digits.len() as i32 + 1
    }

    /// Digit at `magnitude` (0 outside the stored range).
    fn digit_at(&self, magnitude: i32) -> u8 {
        let index = self.exponent - magnitude;
        usize::try_from(index)
            .ok()
            .and_then(|i| self.digits.get(i).copied())
            .unwrap_or(0)
    }

    /// Round half-up so that no digit below `magnitude` remains.
    fn round_at(&mut self, magnitude: i32) {
        if self.is_zero() {
            return;
        }
        let keep = self.exponent - magnitude + 1;
        if keep < 0 {
            *self = Self::zero();
            return;
        }
        let keep = keep as usize;
        if keep >= self.digits.len() {
            return;
        }

        let round_up = self.digits[keep] >= 5;
        self.digits.truncate(keep);
        if round_up {
            if keep == 0 {
                self.digits = vec![1];
                self.exponent = magnitude;
            } else {
                let mut index = keep - 1;
                loop {
                    if self.digits[index] < 9 {
                        self.digits[index] += 1;
                        break;
                    }
                    self.digits[index] = 0;
                    if index == 0 {
                        self.digits.insert(0, 1);
                        self.exponent += 1;
                        break;
                    }
                    index -= 1;
                }
            }
        }
        self.trim();
    }
}

/// A number rounded for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundedDecimal {
    negative: bool,
    digits: Digits,
    /// Lowest magnitude that must be displayed (trailing zeros included).
    min_display_magnitude: i32,
    min_integer_digits: u8,
    rounding_magnitude: i32,
}

impl RoundedDecimal {
    /// Whether the rounded value is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.digits.is_zero()
    }

    /// Whether the input was negative.
    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.negative
    }

    /// Magnitude of the most significant digit (0 for zero).
    #[must_use]
    pub const fn magnitude(&self) -> i32 {
        self.digits.exponent
    }

    /// Magnitude of the rounding increment that was applied.
    #[must_use]
    pub const fn rounding_magnitude(&self) -> i32 {
        self.rounding_magnitude
    }

    /// Integer digits, padded to the minimum integer digits.
    #[must_use]
    pub fn integer_digits(&self) -> String {
        let top = self.digits.exponent.max(0);
        let mut out: String = (0..=top)
            .rev()
            .map(|m| char::from(b'0' + self.digits.digit_at(m)))
            .collect();
        if self.digits.exponent < 0 || self.is_zero() {
            out = "0".to_string();
        }
        let width = usize::from(self.min_integer_digits);
        if out.len() < width {
            out = "0".repeat(width - out.len()) + &out;
        }
        out
    }

    /// Fraction digits, including required trailing zeros.
    #[must_use]
    pub fn fraction_digits(&self) -> String {
        let lowest = if self.is_zero() {
            self.min_display_magnitude
        } else {
            self.digits.lowest_magnitude().min(self.min_display_magnitude)
        };
        if lowest >= 0 {
            return String::new();
        }
        (lowest..0)
            .rev()
            .map(|m| char::from(b'0' + self.digits.digit_at(m)))
            .collect()
    }

    /// Plural operands of the displayed number.
    #[must_use]
    pub fn plural_operands(&self) -> PluralOperands {
        PluralOperands::from_digits(&self.integer_digits(), &self.fraction_digits())
    }

    /// Rounded value (sign included) as `f64`.
    #[must_use]
    pub fn to_f64(&self) -> f64 {
        self.to_f64_scaled(0)
    }

    /// Rounded value multiplied by `10^exponent`, computed on the digits.
    #[must_use]
    pub fn to_f64_scaled(&self, exponent: i32) -> f64 {
        if self.is_zero() {
            return 0.0;
        }
        let mantissa: String = self
            .digits
            .digits
            .iter()
            .map(|d| char::from(b'0' + d))
            .collect();
        let text = format!("0.{mantissa}e{}", self.digits.exponent + 1 + exponent);
        let value: f64 = text.parse().unwrap_or(0.0);
        if self.negative { -value } else { value }
    }
}

fn round_significant(digits: &Digits, range: DigitRange) -> (Digits, i32, i32) {
    let rounding_magnitude = digits.exponent - i32::from(range.maximum) + 1;
    let mut rounded = digits.clone();
    rounded.round_at(rounding_magnitude);
    let display = rounded.exponent - i32::from(range.minimum) + 1;
    (rounded, display.min(0), rounding_magnitude)
}

fn round_fraction(digits: &Digits, range: DigitRange) -> (Digits, i32, i32) {
    let rounding_magnitude = -i32::from(range.maximum);
    let mut rounded = digits.clone();
    rounded.round_at(rounding_magnitude);
    (rounded, -i32::from(range.minimum), rounding_magnitude)
}

/// Round `value` with `policy`.
#[must_use]
pub fn round(value: f64, policy: RoundingPolicy, min_integer_digits: u8) -> RoundedDecimal {
    let digits = Digits::from_f64(value);
    let (rounded, min_display_magnitude, rounding_magnitude) = match policy {
        RoundingPolicy::Significant(range) => round_significant(&digits, range),
        RoundingPolicy::Fraction(range) => round_fraction(&digits, range),
        RoundingPolicy::MorePrecision {
            significant,
            fraction,
        } => {
            let by_significant = round_significant(&digits, significant);
            let by_fraction = round_fraction(&digits, fraction);
            if by_significant.2 <= by_fraction.2 {
                by_significant
            } else {
                by_fraction
            }
        }
    };

    RoundedDecimal {
        negative: value.is_sign_negative() && value != 0.0,
        digits: rounded,
        min_display_magnitude,
        min_integer_digits: min_integer_digits.max(1),
        rounding_magnitude,
    }
}

/// Magnitude (`⌊log10 |value|⌋`) from the shortest digits; 0 for zero.
#[must_use]
pub fn magnitude_of(value: f64) -> i32 {
    Digits::from_f64(value).exponent
}

/// `value / 10^exponent` for non-negative exponents, `value × 10^-exponent`
/// otherwise.
#[must_use]
pub fn rescale(value: f64, exponent: i32) -> f64 {
    if exponent >= 0 {
        value / 10f64.powi(exponent)
    } else {
        value * 10f64.powi(-exponent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compact(value: f64) -> (String, String) {
        let r = round(value, RoundingPolicy::COMPACT, 1);
        (r.integer_digits(), r.fraction_digits())
    }

    #[test]
    fn compact_rounding_keeps_two_significant_digits_below_ten() {
        assert_eq!(compact(1.5), ("1".to_string(), "5".to_string()));
        assert_eq!(compact(1.2256), ("1".to_string(), "2".to_string()));
        assert_eq!(compact(1.0), ("1".to_string(), String::new()));
    }

    #[test]
    fn compact_rounding_uses_integers_from_ten() {
        assert_eq!(compact(14.567), ("15".to_string(), String::new()));
        assert_eq!(compact(145.67), ("146".to_string(), String::new()));
    }

    #[test]
    fn carry_crosses_magnitude() {
        let r = round(999.5, RoundingPolicy::COMPACT, 1);
        assert_eq!(r.integer_digits(), "1000");
        assert_eq!(r.magnitude(), 3);
        assert!((r.to_f64() - 1000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn half_up_on_shortest_digits() {
        let r = round(1.45, RoundingPolicy::Fraction(DigitRange::new(0, 1)), 1);
        assert_eq!(r.fraction_digits(), "5");
        let r = round(14.567, RoundingPolicy::Fraction(DigitRange::new(0, 1)), 1);
        assert_eq!((r.integer_digits(), r.fraction_digits()), ("14".to_string(), "6".to_string()));
        assert!((r.to_f64_scaled(3) - 14_600.0).abs() < f64::EPSILON);
    }

    #[test]
    fn minimum_digits_pad_with_zeros() {
        let r = round(1.5, RoundingPolicy::Fraction(DigitRange::new(2, 2)), 3);
        assert_eq!(r.integer_digits(), "001");
        assert_eq!(r.fraction_digits(), "50");

        let r = round(0.0, RoundingPolicy::Significant(DigitRange::new(2, 3)), 1);
        assert_eq!((r.integer_digits(), r.fraction_digits()), ("0".to_string(), "0".to_string()));
    }

    #[test]
    fn small_values_round_to_zero() {
        let r = round(0.0004, RoundingPolicy::Fraction(DigitRange::new(0, 3)), 1);
        assert!(r.is_zero());
        assert_eq!(r.integer_digits(), "0");
        assert_eq!(r.fraction_digits(), "");

        let r = round(0.0005, RoundingPolicy::Fraction(DigitRange::new(0, 3)), 1);
        assert_eq!(r.fraction_digits(), "001");
    }

    #[test]
    fn sign_is_kept() {
        let r = round(-1.25, RoundingPolicy::COMPACT, 1);
        assert!(r.is_negative());
        assert!((r.to_f64_scaled(3) + 1_300.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rescale_direction() {
        assert!((rescale(1_500.0, 3) - 1.5).abs() < f64::EPSILON);
        assert!((rescale(0.015, -2) - 1.5).abs() < 1e-12);
    }
}
