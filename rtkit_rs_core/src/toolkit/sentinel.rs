//! # toolkit/sentinel
//!
//! a single lookup table for the reserved "invalid" value of every element type.
//!
//! | dtype            | invalid value          |
//! |------------------|------------------------|
//! | signed integers  | `MIN` (e.g. `i32::MIN`) |
//! | unsigned integers| `MAX` (e.g. `u8::MAX`)  |
//! | floats           | NaN                    |
//! | bool             | `false`                |
//! | bytes            | empty (all NUL)        |
//! | categorical      | code `0`               |
//!
//! gather, cast and quantile all go through this table, so changing a sentinel here
//! changes it everywhere.

use super::{
    column::{Column, Scalar},
    dtype::Dtype,
};

pub const INVALID_CATEGORY_CODE: i32 = 0;

pub trait Sentinel: Copy {
    fn invalid() -> Self;
    fn is_invalid(&self) -> bool;
}

macro_rules! sentinel_impl {
    ($dtype:ty, $value:expr) => {
        impl Sentinel for $dtype {
            #[inline]
            fn invalid() -> Self {
                $value
            }
            #[inline]
            fn is_invalid(&self) -> bool {
                *self == $value
            }
        }
    };
}

sentinel_impl!(i8, i8::MIN);
sentinel_impl!(i16, i16::MIN);
sentinel_impl!(i32, i32::MIN);
sentinel_impl!(i64, i64::MIN);
sentinel_impl!(u8, u8::MAX);
sentinel_impl!(u16, u16::MAX);
sentinel_impl!(u32, u32::MAX);
sentinel_impl!(u64, u64::MAX);

impl Sentinel for f32 {
    #[inline]
    fn invalid() -> Self {
        f32::NAN
    }
    #[inline]
    fn is_invalid(&self) -> bool {
        self.is_nan()
    }
}
impl Sentinel for f64 {
    #[inline]
    fn invalid() -> Self {
        f64::NAN
    }
    #[inline]
    fn is_invalid(&self) -> bool {
        self.is_nan()
    }
}

/// `bool` has no spare bit pattern: `false` is used as the fill value,
/// but no `bool` is ever *considered* invalid.
impl Sentinel for bool {
    #[inline]
    fn invalid() -> Self {
        false
    }
    #[inline]
    fn is_invalid(&self) -> bool {
        false
    }
}

/// The invalid value of `dtype`, as a [`Scalar`].
pub fn invalid_scalar(dtype: Dtype) -> Scalar {
    match dtype {
        Dtype::Bool => Scalar::Bool(false),
        Dtype::Int8 => Scalar::Int(i8::MIN as i64),
        Dtype::Int16 => Scalar::Int(i16::MIN as i64),
        Dtype::Int32 => Scalar::Int(i32::MIN as i64),
        Dtype::Int64 => Scalar::Int(i64::MIN),
        Dtype::UInt8 => Scalar::UInt(u8::MAX as u64),
        Dtype::UInt16 => Scalar::UInt(u16::MAX as u64),
        Dtype::UInt32 => Scalar::UInt(u32::MAX as u64),
        Dtype::UInt64 => Scalar::UInt(u64::MAX),
        Dtype::Float32 | Dtype::Float64 => Scalar::Float(f64::NAN),
        Dtype::Bytes(_) => Scalar::Bytes(Vec::new()),
    }
}

/// The value `column` uses to represent "missing".
///
/// Categoricals report their invalid code rather than the sentinel of the code dtype.
pub fn get_default_value(column: &Column) -> Scalar {
    match column {
        Column::Categorical(_) => Scalar::Int(INVALID_CATEGORY_CODE as i64),
        _ => invalid_scalar(column.dtype()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolkit::{categorical::Categorical, column::FixedBytes};
    use ndarray::arr1;

    #[test]
    fn test_typed_sentinels() {
        assert_eq!(i32::invalid(), -2147483648);
        assert_eq!(u16::invalid(), 65535);
        assert!(f32::invalid().is_nan());
        assert!(i64::MIN.is_invalid());
        assert!(!0i64.is_invalid());
        assert!(!false.is_invalid());
    }

    #[test]
    fn test_default_value_per_column() {
        let ints = Column::from(arr1(&[1i32, 2, 3]));
        assert_eq!(get_default_value(&ints), Scalar::Int(i32::MIN as i64));
        let floats = Column::from(arr1(&[1.0f64]));
        match get_default_value(&floats) {
            Scalar::Float(v) => assert!(v.is_nan()),
            other => panic!("unexpected default {other:?}"),
        }
        let strings = Column::Bytes(FixedBytes::from_items(&["ab", "c"]));
        assert_eq!(get_default_value(&strings), Scalar::Bytes(vec![]));
        let cat = Column::Categorical(Categorical::from_items(&["x", "y"]));
        assert_eq!(get_default_value(&cat), Scalar::Int(0));
    }
}
