//! Fixed-scale rescaling.
//!
//! Multiplication and division report results with a configured number of
//! fractional digits, rounded with a [`bigdecimal::RoundingMode`]. Division
//! rounds from the exact integer ratio, never from an intermediate
//! approximation, so every rounding mode sees the true remainder.

use bigdecimal::num_bigint::BigInt;
use bigdecimal::{BigDecimal, RoundingMode, Signed, Zero};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CalcError;

/// Largest absolute operand scale accepted by any operation.
///
/// Bounds the power of ten used to align operands.
pub const MAX_OPERAND_SCALE: i64 = 1_000;

/// Config-facing name for a [`RoundingMode`].
///
/// Serializes as `HALF_UP`, `HALF_EVEN`, ... and parses any spelling that
/// differs only in case, `_` or `-`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoundingRule(RoundingMode);

impl RoundingRule {
    #[must_use]
    pub const fn new(mode: RoundingMode) -> Self {
        Self(mode)
    }

    #[must_use]
    pub const fn mode(self) -> RoundingMode {
        self.0
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self.0 {
            RoundingMode::Up => "UP",
            RoundingMode::Down => "DOWN",
            RoundingMode::Ceiling => "CEILING",
            RoundingMode::Floor => "FLOOR",
            RoundingMode::HalfUp => "HALF_UP",
            RoundingMode::HalfDown => "HALF_DOWN",
            RoundingMode::HalfEven => "HALF_EVEN",
        }
    }
}

impl Default for RoundingRule {
    fn default() -> Self {
        Self(RoundingMode::HalfUp)
    }
}

impl From<RoundingMode> for RoundingRule {
    fn from(mode: RoundingMode) -> Self {
        Self(mode)
    }
}

impl fmt::Display for RoundingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoundingRule {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-' && !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();

        let mode = match normalized.as_str() {
            "up" => RoundingMode::Up,
            "down" => RoundingMode::Down,
            "ceiling" => RoundingMode::Ceiling,
            "floor" => RoundingMode::Floor,
            "halfup" => RoundingMode::HalfUp,
            "halfdown" => RoundingMode::HalfDown,
            "halfeven" => RoundingMode::HalfEven,
            _ => return Err(CalcError::InvalidConfig(format!("unknown rounding rule: {s}"))),
        };
        Ok(Self(mode))
    }
}

impl TryFrom<String> for RoundingRule {
    type Error = CalcError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RoundingRule> for String {
    fn from(rule: RoundingRule) -> Self {
        rule.as_str().to_string()
    }
}

/// Number of fractional digits plus the rule used to get there.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalePolicy {
    pub scale: i64,
    #[serde(default)]
    pub rounding: RoundingRule,
}

impl ScalePolicy {
    #[must_use]
    pub const fn new(scale: i64, mode: RoundingMode) -> Self {
        Self {
            scale,
            rounding: RoundingRule::new(mode),
        }
    }

    /// Rescale `value` to this policy.
    #[must_use]
    pub fn apply(&self, value: &BigDecimal) -> BigDecimal {
        value.with_scale_round(self.scale, self.rounding.mode())
    }
}

/// Divide `dividend` by `divisor`, rounding the exact quotient to `policy`.
///
/// Works on unscaled integers: the operands are aligned so that the integer
/// quotient carries one guard digit past the target scale. A trailing
/// sticky digit marks a nonzero remainder, which is all the rounding mode
/// needs to know about the digits beyond the guard.
pub fn divide_to_scale(
    dividend: &BigDecimal,
    divisor: &BigDecimal,
    policy: ScalePolicy,
) -> Result<BigDecimal, CalcError> {
    if divisor.is_zero() {
        return Err(CalcError::DivisionByZero);
    }

    let (num, num_scale) = dividend.as_bigint_and_exponent();
    let (den, den_scale) = divisor.as_bigint_and_exponent();
    check_operand_scale(num_scale)?;
    check_operand_scale(den_scale)?;

    let negative = num.is_negative() != den.is_negative();

    // quotient * 10^(scale + 1) = num * 10^(scale + 1 + den_scale - num_scale) / den
    let shift = policy.scale + 1 + den_scale - num_scale;
    let (mut num, mut den) = (num.abs(), den.abs());
    if shift >= 0 {
        num *= pow10(shift);
    } else {
        den *= pow10(-shift);
    }

    let mut digits = (&num / &den) * 10u32;
    if !(&num % &den).is_zero() {
        digits += 1u32;
    }
    if negative {
        digits = -digits;
    }

    Ok(BigDecimal::new(digits, policy.scale + 2).with_scale_round(policy.scale, policy.rounding.mode()))
}

/// Reject operands whose scale would make alignment unreasonably large.
pub fn check_operand_scale(scale: i64) -> Result<(), CalcError> {
    if scale.abs() > MAX_OPERAND_SCALE {
        return Err(CalcError::ScaleOutOfRange { scale });
    }
    Ok(())
}

fn pow10(exp: i64) -> BigInt {
    // Callers bound `exp` through MAX_OPERAND_SCALE and the validated policy scale.
    BigInt::from(10u8).pow(exp.unsigned_abs() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn scale_of(value: &BigDecimal) -> i64 {
        value.as_bigint_and_exponent().1
    }

    #[test]
    fn test_parse_rounding_spellings() {
        assert_eq!("HALF_UP".parse::<RoundingRule>().unwrap().mode(), RoundingMode::HalfUp);
        assert_eq!("half-even".parse::<RoundingRule>().unwrap().mode(), RoundingMode::HalfEven);
        assert_eq!("Floor".parse::<RoundingRule>().unwrap().mode(), RoundingMode::Floor);
        assert!("bankers".parse::<RoundingRule>().is_err());
    }

    #[test]
    fn test_rounding_rule_serde() {
        let json = serde_json::to_string(&RoundingRule::new(RoundingMode::HalfDown)).unwrap();
        assert_eq!(json, "\"HALF_DOWN\"");
        let back: RoundingRule = serde_json::from_str("\"half_down\"").unwrap();
        assert_eq!(back.mode(), RoundingMode::HalfDown);
        assert!(serde_json::from_str::<RoundingRule>("\"sideways\"").is_err());
    }

    #[test]
    fn test_default_rule_is_half_up() {
        assert_eq!(RoundingRule::default().mode(), RoundingMode::HalfUp);
    }

    #[test]
    fn test_scale_policy_half_up() {
        let policy = ScalePolicy::new(1, RoundingMode::HalfUp);
        assert_eq!(policy.apply(&dec("5.100")), dec("5.1"));
        assert_eq!(policy.apply(&dec("2.25")), dec("2.3"));
        assert_eq!(policy.apply(&dec("-2.25")), dec("-2.3"));
        assert_eq!(scale_of(&policy.apply(&dec("7"))), 1);
    }

    #[test]
    fn test_scale_policy_looks_past_first_dropped_digit() {
        let policy = ScalePolicy::new(1, RoundingMode::HalfDown);
        assert_eq!(policy.apply(&dec("2.25")), dec("2.2"));
        assert_eq!(policy.apply(&dec("2.2501")), dec("2.3"));
    }

    #[test]
    fn test_divide_exact_quotients() {
        let policy = ScalePolicy::new(10, RoundingMode::HalfUp);

        let q = divide_to_scale(&dec("6.0"), &dec("2.0"), policy).unwrap();
        assert_eq!(q, dec("3"));
        assert_eq!(scale_of(&q), 10);

        let q = divide_to_scale(&dec("-5.0"), &dec("-2.0"), policy).unwrap();
        assert_eq!(q, dec("2.5"));
        assert_eq!(scale_of(&q), 10);

        let q = divide_to_scale(&dec("-6.0"), &dec("2.0"), policy).unwrap();
        assert_eq!(q, dec("-3"));
    }

    #[test]
    fn test_divide_zero_dividend_keeps_scale() {
        let policy = ScalePolicy::new(10, RoundingMode::HalfUp);
        let q = divide_to_scale(&dec("0.0"), &dec("5.0"), policy).unwrap();
        assert!(q.is_zero());
        assert_eq!(scale_of(&q), 10);
    }

    #[test]
    fn test_divide_by_zero() {
        let policy = ScalePolicy::new(10, RoundingMode::HalfUp);
        assert_eq!(
            divide_to_scale(&dec("10"), &dec("0.000"), policy),
            Err(CalcError::DivisionByZero)
        );
    }

    #[test]
    fn test_divide_non_terminating() {
        let policy = ScalePolicy::new(10, RoundingMode::HalfUp);
        assert_eq!(
            divide_to_scale(&dec("1"), &dec("3"), policy).unwrap(),
            dec("0.3333333333")
        );
        assert_eq!(
            divide_to_scale(&dec("2"), &dec("3"), policy).unwrap(),
            dec("0.6666666667")
        );
        assert_eq!(
            divide_to_scale(&dec("-2"), &dec("3"), policy).unwrap(),
            dec("-0.6666666667")
        );
    }

    #[test]
    fn test_divide_honours_every_mode_on_ties() {
        // 1 / 4 = 0.25, an exact tie between 0.2 and 0.3 at scale 1.
        let cases = [
            (RoundingMode::Up, "0.3", "-0.3"),
            (RoundingMode::Down, "0.2", "-0.2"),
            (RoundingMode::Ceiling, "0.3", "-0.2"),
            (RoundingMode::Floor, "0.2", "-0.3"),
            (RoundingMode::HalfUp, "0.3", "-0.3"),
            (RoundingMode::HalfDown, "0.2", "-0.2"),
            (RoundingMode::HalfEven, "0.2", "-0.2"),
        ];
        for (mode, positive, negative) in cases {
            let policy = ScalePolicy::new(1, mode);
            assert_eq!(
                divide_to_scale(&dec("1"), &dec("4"), policy).unwrap(),
                dec(positive),
                "{mode:?} positive"
            );
            assert_eq!(
                divide_to_scale(&dec("-1"), &dec("4"), policy).unwrap(),
                dec(negative),
                "{mode:?} negative"
            );
        }
    }

    #[test]
    fn test_divide_just_past_a_tie_rounds_away() {
        // 1 / 3.9999 = 0.250006..., just above the 0.25 tie at scale 1.
        let half_down = ScalePolicy::new(1, RoundingMode::HalfDown);
        let half_even = ScalePolicy::new(1, RoundingMode::HalfEven);
        assert_eq!(divide_to_scale(&dec("1"), &dec("3.9999"), half_down).unwrap(), dec("0.3"));
        assert_eq!(divide_to_scale(&dec("1"), &dec("3.9999"), half_even).unwrap(), dec("0.3"));
    }

    #[test]
    fn test_divide_just_above_zero_rounds_up_with_up_mode() {
        // 1/3000 = 0.000333..., nonzero remainder below one half at scale 2.
        let up = ScalePolicy::new(2, RoundingMode::Up);
        let half_up = ScalePolicy::new(2, RoundingMode::HalfUp);
        assert_eq!(divide_to_scale(&dec("1"), &dec("3000"), up).unwrap(), dec("0.01"));
        assert_eq!(divide_to_scale(&dec("1"), &dec("3000"), half_up).unwrap(), dec("0"));
    }

    #[test]
    fn test_divide_with_negative_operand_scale() {
        let policy = ScalePolicy::new(2, RoundingMode::HalfUp);
        let big = dec("1E+3");
        assert_eq!(divide_to_scale(&big, &dec("8"), policy).unwrap(), dec("125.00"));
        assert_eq!(divide_to_scale(&dec("1"), &big, policy).unwrap(), dec("0.00"));
    }

    #[test]
    fn test_divide_rejects_extreme_scale() {
        let policy = ScalePolicy::new(10, RoundingMode::HalfUp);
        let tiny = BigDecimal::new(BigInt::from(1), MAX_OPERAND_SCALE + 1);
        assert!(matches!(
            divide_to_scale(&tiny, &dec("3"), policy),
            Err(CalcError::ScaleOutOfRange { .. })
        ));
    }
}
