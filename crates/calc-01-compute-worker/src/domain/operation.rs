//! The arithmetic operation set.

use bigdecimal::BigDecimal;

use super::config::ArithmeticConfig;
use super::rounding::{check_operand_scale, divide_to_scale, ScalePolicy};
use crate::error::CalcError;

/// One arithmetic routine, with the rescaling policy it was configured with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    /// Exact addition, no rescaling
    Sum,
    /// Exact subtraction, no rescaling
    Subtraction,
    /// Exact product rescaled to the policy
    Multiplication(ScalePolicy),
    /// Quotient at the policy scale; fails on a zero divisor
    Division(ScalePolicy),
}

impl Operation {
    /// Lowercase name the operation is registered under.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Subtraction => "subtraction",
            Self::Multiplication(_) => "multiplication",
            Self::Division(_) => "division",
        }
    }

    /// The full operation set, configured.
    #[must_use]
    pub fn standard_set(config: &ArithmeticConfig) -> [Self; 4] {
        [
            Self::Sum,
            Self::Subtraction,
            Self::Multiplication(config.multiplication),
            Self::Division(config.division),
        ]
    }

    /// Evaluate `a <op> b`.
    ///
    /// Operands whose scale exceeds [`MAX_OPERAND_SCALE`](super::MAX_OPERAND_SCALE)
    /// in either direction are rejected before any digits are aligned.
    pub fn apply(&self, a: &BigDecimal, b: &BigDecimal) -> Result<BigDecimal, CalcError> {
        check_operand_scale(a.as_bigint_and_exponent().1)?;
        check_operand_scale(b.as_bigint_and_exponent().1)?;

        match self {
            Self::Sum => Ok(a + b),
            Self::Subtraction => Ok(a - b),
            Self::Multiplication(policy) => Ok(policy.apply(&(a * b))),
            Self::Division(policy) => divide_to_scale(a, b, *policy),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::RoundingMode;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn defaults() -> [Operation; 4] {
        Operation::standard_set(&ArithmeticConfig::default())
    }

    #[test]
    fn test_sum() {
        let [sum, ..] = defaults();
        let result = sum.apply(&dec("10.5"), &dec("2.5")).unwrap();
        assert_eq!(result, dec("13.0"));
        assert_eq!(result.to_string(), "13.0");
        assert_eq!(sum.apply(&dec("-10.5"), &dec("2.5")).unwrap(), dec("-8.0"));
        assert_eq!(sum.apply(&dec("0"), &dec("0")).unwrap(), dec("0"));
    }

    #[test]
    fn test_subtraction_keeps_operand_scale() {
        let [_, sub, ..] = defaults();
        let result = sub.apply(&dec("10.50"), &dec("2.5")).unwrap();
        assert_eq!(result, dec("8.00"));
        assert_eq!(result.as_bigint_and_exponent().1, 2);
        assert_eq!(sub.apply(&dec("2.5"), &dec("10.5")).unwrap(), dec("-8.0"));
    }

    #[test]
    fn test_multiplication_rescales_to_one_digit() {
        let [_, _, mul, _] = defaults();
        let result = mul.apply(&dec("2.55"), &dec("2.0")).unwrap();
        assert_eq!(result.to_string(), "5.1");
        assert_eq!(mul.apply(&dec("-2.5"), &dec("2.0")).unwrap(), dec("-5.0"));
        assert_eq!(mul.apply(&dec("0"), &dec("2.5")).unwrap(), dec("0.0"));
        assert_eq!(mul.apply(&dec("1.05"), &dec("1")).unwrap(), dec("1.1"));
    }

    #[test]
    fn test_multiplication_with_custom_policy() {
        let op = Operation::Multiplication(ScalePolicy::new(3, RoundingMode::Down));
        assert_eq!(op.apply(&dec("1.23456"), &dec("1")).unwrap(), dec("1.234"));
    }

    #[test]
    fn test_division_defaults() {
        let [.., div] = defaults();
        let cases = [
            ("6.0", "2.0", "3.0000000000"),
            ("0.0", "5.0", "0E-10"),
            ("-6.0", "2.0", "-3.0000000000"),
            ("5.0", "2.0", "2.5000000000"),
            ("-5.0", "-2.0", "2.5000000000"),
        ];
        for (a, b, expected) in cases {
            let result = div.apply(&dec(a), &dec(b)).unwrap();
            assert_eq!(result, dec(expected), "{a} / {b}");
            assert_eq!(result.as_bigint_and_exponent().1, 10, "{a} / {b} scale");
        }
    }

    #[test]
    fn test_division_by_zero() {
        let [.., div] = defaults();
        assert_eq!(
            div.apply(&dec("10"), &dec("0")),
            Err(CalcError::DivisionByZero)
        );
        assert_eq!(
            div.apply(&dec("0"), &dec("0.0")),
            Err(CalcError::DivisionByZero)
        );
    }

    #[test]
    fn test_huge_exponents_rejected_by_every_operation() {
        let huge = dec("1E+20000000");
        let one = dec("1");
        for op in defaults() {
            assert_eq!(
                op.apply(&huge, &one),
                Err(CalcError::ScaleOutOfRange { scale: -20_000_000 }),
                "{}",
                op.name()
            );
            assert_eq!(
                op.apply(&one, &huge),
                Err(CalcError::ScaleOutOfRange { scale: -20_000_000 }),
                "{}",
                op.name()
            );
        }
    }

    #[test]
    fn test_sum_at_scale_limit_is_exact() {
        let [sum, sub, ..] = defaults();
        let big = dec("1E+1000");
        let tiny = dec("1E-1000");
        let total = sum.apply(&big, &tiny).unwrap();
        assert_eq!(total.as_bigint_and_exponent().1, 1000);
        assert_eq!(sub.apply(&total, &tiny).unwrap(), big);
    }

    #[test]
    fn test_names_are_lowercase() {
        for op in defaults() {
            assert_eq!(op.name(), op.name().to_lowercase());
        }
    }
}
