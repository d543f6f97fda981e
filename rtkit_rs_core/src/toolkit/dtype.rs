//! # toolkit/dtype
//!
//! element types, the promotion rule used to bring two key columns onto one dtype,
//! and the casts that move a column onto that dtype.

use super::{column::Column, sentinel::Sentinel};
use crate::error::{Result, ToolkitError};
use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dtype {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    /// fixed-width, NUL padded byte strings of the given itemsize
    Bytes(usize),
}

impl Dtype {
    pub fn itemsize(&self) -> usize {
        match self {
            Dtype::Bool | Dtype::Int8 | Dtype::UInt8 => 1,
            Dtype::Int16 | Dtype::UInt16 => 2,
            Dtype::Int32 | Dtype::UInt32 | Dtype::Float32 => 4,
            Dtype::Int64 | Dtype::UInt64 | Dtype::Float64 => 8,
            Dtype::Bytes(itemsize) => *itemsize,
        }
    }

    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            Dtype::Int8 | Dtype::Int16 | Dtype::Int32 | Dtype::Int64
        )
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(
            self,
            Dtype::UInt8 | Dtype::UInt16 | Dtype::UInt32 | Dtype::UInt64
        )
    }

    pub fn is_integer(&self) -> bool {
        self.is_signed() || self.is_unsigned()
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Dtype::Float32 | Dtype::Float64)
    }

    pub fn is_bytes(&self) -> bool {
        matches!(self, Dtype::Bytes(_))
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dtype::Bool => write!(f, "bool"),
            Dtype::Int8 => write!(f, "int8"),
            Dtype::Int16 => write!(f, "int16"),
            Dtype::Int32 => write!(f, "int32"),
            Dtype::Int64 => write!(f, "int64"),
            Dtype::UInt8 => write!(f, "uint8"),
            Dtype::UInt16 => write!(f, "uint16"),
            Dtype::UInt32 => write!(f, "uint32"),
            Dtype::UInt64 => write!(f, "uint64"),
            Dtype::Float32 => write!(f, "float32"),
            Dtype::Float64 => write!(f, "float64"),
            Dtype::Bytes(itemsize) => write!(f, "S{itemsize}"),
        }
    }
}

fn wider(a: Dtype, b: Dtype) -> Dtype {
    if a.itemsize() >= b.itemsize() {
        a
    } else {
        b
    }
}

/// The smallest dtype both `a` and `b` can be represented in without loss.
///
/// Follows numpy's promotion: mixing signed and unsigned integers moves to the next
/// wider signed type (`uint64` has none, so it lands on `float64`), small integers
/// fit in `float32`, everything else that mixes integers and floats is `float64`.
/// Byte strings widen to the larger itemsize; they never mix with numbers.
pub fn common_dtype(a: Dtype, b: Dtype) -> Result<Dtype> {
    if a == b {
        return Ok(a);
    }
    let common = match (a, b) {
        (Dtype::Bytes(x), Dtype::Bytes(y)) => Dtype::Bytes(x.max(y)),
        (Dtype::Bytes(_), _) | (_, Dtype::Bytes(_)) => {
            return Err(ToolkitError::type_error(format!(
                "no common dtype for `{a}` and `{b}`"
            )));
        }
        (Dtype::Bool, other) | (other, Dtype::Bool) => other,
        _ if a.is_float() && b.is_float() => wider(a, b),
        _ if a.is_float() || b.is_float() => {
            let (float, int) = if a.is_float() { (a, b) } else { (b, a) };
            if float == Dtype::Float32 && int.itemsize() <= 2 {
                Dtype::Float32
            } else {
                Dtype::Float64
            }
        }
        _ if a.is_signed() == b.is_signed() => wider(a, b),
        _ => {
            let (signed, unsigned) = if a.is_signed() { (a, b) } else { (b, a) };
            if signed.itemsize() > unsigned.itemsize() {
                signed
            } else {
                match unsigned.itemsize() {
                    1 => Dtype::Int16,
                    2 => Dtype::Int32,
                    4 => Dtype::Int64,
                    _ => Dtype::Float64,
                }
            }
        }
    };
    Ok(common)
}

// sentinel-aware: an invalid source element becomes the invalid target element
macro_rules! cast_numeric_into {
    (@one $v:expr, $target:ty) => {
        if $v.is_invalid() {
            <$target as Sentinel>::invalid()
        } else {
            $v as $target
        }
    };
    ($column:expr, $target:ty) => {
        match $column {
            Column::Int8(a) => Some(a.map(|&v| cast_numeric_into!(@one v, $target))),
            Column::Int16(a) => Some(a.map(|&v| cast_numeric_into!(@one v, $target))),
            Column::Int32(a) => Some(a.map(|&v| cast_numeric_into!(@one v, $target))),
            Column::Int64(a) => Some(a.map(|&v| cast_numeric_into!(@one v, $target))),
            Column::UInt8(a) => Some(a.map(|&v| cast_numeric_into!(@one v, $target))),
            Column::UInt16(a) => Some(a.map(|&v| cast_numeric_into!(@one v, $target))),
            Column::UInt32(a) => Some(a.map(|&v| cast_numeric_into!(@one v, $target))),
            Column::UInt64(a) => Some(a.map(|&v| cast_numeric_into!(@one v, $target))),
            Column::Float32(a) => Some(a.map(|&v| cast_numeric_into!(@one v, $target))),
            Column::Float64(a) => Some(a.map(|&v| cast_numeric_into!(@one v, $target))),
            _ => None,
        }
    };
}

// plain numeric conversion, `bool` included
macro_rules! astype_numeric_into {
    ($column:expr, $target:ty) => {
        match $column {
            Column::Bool(a) => Some(a.map(|&v| v as u8 as $target)),
            Column::Int8(a) => Some(a.map(|&v| v as $target)),
            Column::Int16(a) => Some(a.map(|&v| v as $target)),
            Column::Int32(a) => Some(a.map(|&v| v as $target)),
            Column::Int64(a) => Some(a.map(|&v| v as $target)),
            Column::UInt8(a) => Some(a.map(|&v| v as $target)),
            Column::UInt16(a) => Some(a.map(|&v| v as $target)),
            Column::UInt32(a) => Some(a.map(|&v| v as $target)),
            Column::UInt64(a) => Some(a.map(|&v| v as $target)),
            Column::Float32(a) => Some(a.map(|&v| v as $target)),
            Column::Float64(a) => Some(a.map(|&v| v as $target)),
            Column::Categorical(c) => Some(c.codes().map(|&v| v as $target).into_dyn()),
            Column::Bytes(_) => None,
        }
    };
}

macro_rules! dispatch_target {
    ($macro:ident, $column:expr, $dtype:expr) => {
        match $dtype {
            Dtype::Int8 => $macro!($column, i8).map(Column::Int8),
            Dtype::Int16 => $macro!($column, i16).map(Column::Int16),
            Dtype::Int32 => $macro!($column, i32).map(Column::Int32),
            Dtype::Int64 => $macro!($column, i64).map(Column::Int64),
            Dtype::UInt8 => $macro!($column, u8).map(Column::UInt8),
            Dtype::UInt16 => $macro!($column, u16).map(Column::UInt16),
            Dtype::UInt32 => $macro!($column, u32).map(Column::UInt32),
            Dtype::UInt64 => $macro!($column, u64).map(Column::UInt64),
            Dtype::Float32 => $macro!($column, f32).map(Column::Float32),
            Dtype::Float64 => $macro!($column, f64).map(Column::Float64),
            Dtype::Bool | Dtype::Bytes(_) => None,
        }
    };
}

/// Converts numeric columns while keeping invalid values invalid
/// (`i32::MIN` becomes `i64::MIN` or NaN, NaN becomes the integer sentinel).
///
/// Returns `None` for dtype pairs this path does not cover (`bool`, bytes, categoricals).
pub fn cast_preserving_invalid(column: &Column, dtype: Dtype) -> Option<Column> {
    dispatch_target!(cast_numeric_into, column, dtype)
}

/// Plain conversion, the way `astype` would do it: no sentinel handling.
pub fn astype(column: &Column, dtype: Dtype) -> Result<Column> {
    let converted = match (column, dtype) {
        (Column::Bytes(b), Dtype::Bytes(itemsize)) => Some(Column::Bytes(b.with_itemsize(itemsize))),
        (_, Dtype::Bool) => match column {
            Column::Bool(a) => Some(Column::Bool(a.clone())),
            Column::Float32(a) => Some(Column::Bool(a.map(|&v| v != 0.0))),
            Column::Float64(a) => Some(Column::Bool(a.map(|&v| v != 0.0))),
            _ => astype_numeric_into!(column, i64).map(|a| Column::Bool(a.map(|&v| v != 0))),
        },
        _ => dispatch_target!(astype_numeric_into, column, dtype),
    };
    converted.ok_or_else(|| {
        ToolkitError::type_error(format!("cannot cast `{}` to `{dtype}`", column.dtype()))
    })
}

/// Moves `column` onto `dtype`, preferring the sentinel-aware conversion and falling back
/// to [`astype`] when it does not apply. Columns already on `dtype` are returned as is.
pub fn cast(column: Column, dtype: Dtype) -> Result<Column> {
    if column.dtype() == dtype {
        return Ok(column);
    }
    match cast_preserving_invalid(&column, dtype) {
        Some(converted) => Ok(converted),
        None => astype(&column, dtype),
    }
}
