//! Exact fractions used for every scale factor in the pipeline.
//!
//! Scale factors drive lookup-table generation and rounding decisions that must be
//! pixel exact, so they are never converted to floating point. A [`Ratio`] is always
//! stored reduced with a positive denominator, which makes `==` an exact comparison of
//! the represented values.

use std::fmt::Display;
use std::ops;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ratio {
    num: i32,
    den: i32,
}

impl Default for Ratio {
    fn default() -> Self {
        Self::ONE
    }
}

impl Ratio {
    pub const ONE: Self = Self { num: 1, den: 1 };

    /// # Panics
    ///
    /// Panics if `den` is zero.
    #[must_use]
    pub fn new(num: i32, den: i32) -> Self {
        Self::reduce(i64::from(num), i64::from(den))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn reduce(num: i64, den: i64) -> Self {
        assert!(den != 0, "ratio with a zero denominator");

        let (mut num, mut den) = if den < 0 { (-num, -den) } else { (num, den) };
        let divisor = gcd(num.abs(), den);
        if divisor > 1 {
            num /= divisor;
            den /= divisor;
        }

        Self {
            num: num as i32,
            den: den as i32,
        }
    }

    #[must_use]
    pub const fn numerator(&self) -> i32 {
        self.num
    }

    #[must_use]
    pub const fn denominator(&self) -> i32 {
        self.den
    }

    #[must_use]
    pub const fn is_one(&self) -> bool {
        self.num == self.den
    }

    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.num == 0
    }

    /// Integer part, truncated towards zero.
    #[must_use]
    pub const fn to_int(&self) -> i32 {
        self.num / self.den
    }
}

const fn gcd(mut a: i64, mut b: i64) -> i64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

impl Display for Ratio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl ops::Mul for Ratio {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self::Output {
        Self::reduce(
            i64::from(self.num) * i64::from(rhs.num),
            i64::from(self.den) * i64::from(rhs.den),
        )
    }
}

impl ops::Mul<Ratio> for i32 {
    type Output = Ratio;
    fn mul(self, rhs: Ratio) -> Self::Output {
        Ratio::reduce(i64::from(self) * i64::from(rhs.num), i64::from(rhs.den))
    }
}

impl ops::Div<Ratio> for i32 {
    type Output = Ratio;
    fn div(self, rhs: Ratio) -> Self::Output {
        Ratio::reduce(i64::from(self) * i64::from(rhs.den), i64::from(rhs.num))
    }
}

/// Multiplies `value` by `ratio`, rounding any fractional part up once the product
/// exceeds one denominator. `extra` is added before and removed after the
/// multiplication.
#[must_use]
pub const fn mul_round_up(value: i32, ratio: Ratio, extra: i32) -> i32 {
    let num = (value + extra) * ratio.num;
    let mut result = num / ratio.den;
    if num > ratio.den && num % ratio.den != 0 {
        result += 1;
    }
    result - extra
}
