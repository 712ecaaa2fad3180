//! Edge cost types and the dual accumulators the primal-dual engine grows.
//!
//! Integer costs accumulate in [`Dyadic`], an exact rational with a
//! power-of-two denominator, so a slack of zero is detected exactly even
//! when a growth step is half of an odd slack. Floating costs accumulate in
//! `f64` and rely on an absolute tolerance.

use std::cmp::Ordering;
use std::fmt::Debug;
use std::iter::Sum;
use std::ops::{Add, Sub};

pub trait Dual:
    Copy + Debug + PartialEq + PartialOrd + Add<Output = Self> + Sub<Output = Self> + Send + Sync
{
    fn zero() -> Self;
    fn half(self) -> Self;
    fn scale(self, k: u32) -> Self;
    /// True when a slack has reached zero. Exact types ignore `tolerance`.
    fn is_tight(self, tolerance: f64) -> bool;
    fn to_f64(self) -> f64;
}

pub trait Cost:
    Copy + Debug + PartialOrd + Add<Output = Self> + Sum<Self> + Send + Sync + 'static
{
    type Dual: Dual;

    fn zero() -> Self;
    /// Non-negative and finite.
    fn is_valid(&self) -> bool;
    fn to_dual(self) -> Self::Dual;
    fn to_f64(self) -> f64;
    /// `None` when the sum does not fit the cost type.
    fn checked_add(self, other: Self) -> Option<Self>;
}

/// `mant / 2^shift`, kept normalized (odd mantissa unless `shift == 0`).
///
/// # Panics
///
/// Arithmetic panics when an exact result no longer fits the 128-bit
/// mantissa, the same way integer overflow does in debug builds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Dyadic {
    mant: i128,
    shift: u32,
}

impl Dyadic {
    pub fn from_int(value: i128) -> Self {
        Self {
            mant: value,
            shift: 0,
        }
    }

    fn normalized(mut mant: i128, mut shift: u32) -> Self {
        while shift > 0 && mant & 1 == 0 {
            mant >>= 1;
            shift -= 1;
        }
        Self { mant, shift }
    }

    fn overflow(op: &str) -> ! {
        panic!("dyadic {} overflows the 128-bit mantissa", op)
    }

    /// `mant * 2^by`, checked.
    fn widen(mant: i128, by: u32) -> i128 {
        if mant == 0 || by == 0 {
            return mant;
        }
        let factor = 1i128.checked_shl(by).filter(|f| *f > 0);
        factor
            .and_then(|f| mant.checked_mul(f))
            .unwrap_or_else(|| Self::overflow("alignment"))
    }

    #[inline(always)]
    fn align(self, other: Self) -> (i128, i128, u32) {
        let shift = self.shift.max(other.shift);
        (
            Self::widen(self.mant, shift - self.shift),
            Self::widen(other.mant, shift - other.shift),
            shift,
        )
    }

    pub fn denominator_log2(&self) -> u32 {
        self.shift
    }
}

impl Ord for Dyadic {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b, _) = self.align(*other);
        a.cmp(&b)
    }
}

impl PartialOrd for Dyadic {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Add for Dyadic {
    type Output = Dyadic;

    fn add(self, rhs: Self) -> Self {
        let (a, b, shift) = self.align(rhs);
        let sum = a.checked_add(b).unwrap_or_else(|| Self::overflow("addition"));
        Self::normalized(sum, shift)
    }
}

impl Sub for Dyadic {
    type Output = Dyadic;

    fn sub(self, rhs: Self) -> Self {
        let (a, b, shift) = self.align(rhs);
        let diff = a.checked_sub(b).unwrap_or_else(|| Self::overflow("subtraction"));
        Self::normalized(diff, shift)
    }
}

impl Dual for Dyadic {
    fn zero() -> Self {
        Self::from_int(0)
    }

    fn half(self) -> Self {
        if self.mant & 1 == 0 {
            Self::normalized(self.mant >> 1, self.shift)
        } else {
            Self {
                mant: self.mant,
                shift: self.shift + 1,
            }
        }
    }

    fn scale(self, k: u32) -> Self {
        let scaled = self
            .mant
            .checked_mul(k as i128)
            .unwrap_or_else(|| Self::overflow("scaling"));
        Self::normalized(scaled, self.shift)
    }

    fn is_tight(self, _tolerance: f64) -> bool {
        self.mant <= 0
    }

    fn to_f64(self) -> f64 {
        self.mant as f64 / 2f64.powi(self.shift as i32)
    }
}

impl Dual for f64 {
    fn zero() -> Self {
        0.0
    }

    fn half(self) -> Self {
        self * 0.5
    }

    fn scale(self, k: u32) -> Self {
        self * k as f64
    }

    fn is_tight(self, tolerance: f64) -> bool {
        self <= tolerance
    }

    fn to_f64(self) -> f64 {
        self
    }
}

macro_rules! impl_integer_cost {
    ($($t:ty),*) => {
        $(
            impl Cost for $t {
                type Dual = Dyadic;

                fn zero() -> Self {
                    0
                }

                #[allow(unused_comparisons)]
                fn is_valid(&self) -> bool {
                    *self >= 0
                }

                fn to_dual(self) -> Dyadic {
                    Dyadic::from_int(self as i128)
                }

                fn to_f64(self) -> f64 {
                    self as f64
                }

                fn checked_add(self, other: Self) -> Option<Self> {
                    <$t>::checked_add(self, other)
                }
            }
        )*
    };
}

macro_rules! impl_float_cost {
    ($($t:ty),*) => {
        $(
            impl Cost for $t {
                type Dual = f64;

                fn zero() -> Self {
                    0.0
                }

                fn is_valid(&self) -> bool {
                    self.is_finite() && *self >= 0.0
                }

                fn to_dual(self) -> f64 {
                    self as f64
                }

                fn to_f64(self) -> f64 {
                    self as f64
                }

                fn checked_add(self, other: Self) -> Option<Self> {
                    let sum = self + other;
                    sum.is_finite().then_some(sum)
                }
            }
        )*
    };
}

impl_integer_cost!(i32, i64, u32, u64);
impl_float_cost!(f32, f64);
