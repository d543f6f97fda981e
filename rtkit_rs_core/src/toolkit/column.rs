//! # toolkit/column
//!
//! [`Column`] is the dynamically typed array every public entry point accepts. It is a
//! closed set of dtypes, so callers (e.g. the Python bindings) decide the dtype once and
//! the kernels below dispatch to monomorphic code.

use super::{categorical::Categorical, dtype::Dtype, strings::find_true_width};
use crate::error::{Result, ToolkitError};
use ndarray::{Array, ArrayD, Dimension, IxDyn};
use num_traits::NumCast;
use std::slice::ChunksExact;

/// A single value, used for scalar keys and custom defaults.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bytes(Vec<u8>),
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}
impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}
impl From<u64> for Scalar {
    fn from(value: u64) -> Self {
        Scalar::UInt(value)
    }
}
impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}
impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Bytes(value.as_bytes().to_vec())
    }
}
impl From<&[u8]> for Scalar {
    fn from(value: &[u8]) -> Self {
        Scalar::Bytes(value.to_vec())
    }
}

/// Fixed-width byte strings (numpy's `S<n>` dtype).
///
/// Items are stored back to back in row-major order, each padded with NUL bytes up to
/// `itemsize`. Trailing NULs are padding, not content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedBytes {
    itemsize: usize,
    shape: Vec<usize>,
    data: Vec<u8>,
}

impl FixedBytes {
    pub fn new(itemsize: usize, shape: Vec<usize>, data: Vec<u8>) -> Result<Self> {
        if itemsize == 0 {
            return Err(ToolkitError::value_error("itemsize of byte strings must be positive"));
        }
        let size: usize = shape.iter().product();
        if data.len() != size * itemsize {
            return Err(ToolkitError::value_error(format!(
                "{} bytes cannot hold {size} items of itemsize {itemsize}",
                data.len()
            )));
        }
        Ok(Self {
            itemsize,
            shape,
            data,
        })
    }

    /// 1-D array of `items`, with the itemsize of the longest one.
    pub fn from_items<S: AsRef<[u8]>>(items: &[S]) -> Self {
        let itemsize = items
            .iter()
            .map(|item| item.as_ref().len())
            .max()
            .unwrap_or(0)
            .max(1);
        let mut data = vec![0u8; itemsize * items.len()];
        data.chunks_exact_mut(itemsize)
            .zip(items)
            .for_each(|(chunk, item)| {
                let item = item.as_ref();
                chunk[..item.len()].copy_from_slice(item);
            });
        Self {
            itemsize,
            shape: vec![items.len()],
            data,
        }
    }

    pub(crate) fn zeros(itemsize: usize, shape: Vec<usize>) -> Self {
        let size: usize = shape.iter().product();
        Self {
            itemsize,
            shape,
            data: vec![0u8; size * itemsize],
        }
    }

    pub fn itemsize(&self) -> usize {
        self.itemsize
    }
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }
    /// total number of items
    pub fn size(&self) -> usize {
        self.data.len() / self.itemsize
    }

    /// the padded item at flat position `i`
    pub fn get(&self, i: usize) -> &[u8] {
        &self.data[i * self.itemsize..(i + 1) * self.itemsize]
    }
    /// the item at flat position `i`, without its NUL padding
    pub fn get_trimmed(&self, i: usize) -> &[u8] {
        let item = self.get(i);
        &item[..find_true_width(item)]
    }
    pub(crate) fn get_mut(&mut self, i: usize) -> &mut [u8] {
        &mut self.data[i * self.itemsize..(i + 1) * self.itemsize]
    }

    pub fn items(&self) -> ChunksExact<'_, u8> {
        self.data.chunks_exact(self.itemsize)
    }
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn reshape(self, shape: Vec<usize>) -> Result<Self> {
        Self::new(self.itemsize, shape, self.data)
    }

    /// Re-pads (or truncates) every item to `itemsize`.
    pub fn with_itemsize(&self, itemsize: usize) -> FixedBytes {
        let mut out = FixedBytes::zeros(itemsize.max(1), self.shape.clone());
        let n = self.itemsize.min(out.itemsize);
        for (i, item) in self.items().enumerate() {
            out.get_mut(i)[..n].copy_from_slice(&item[..n]);
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Bool(ArrayD<bool>),
    Int8(ArrayD<i8>),
    Int16(ArrayD<i16>),
    Int32(ArrayD<i32>),
    Int64(ArrayD<i64>),
    UInt8(ArrayD<u8>),
    UInt16(ArrayD<u16>),
    UInt32(ArrayD<u32>),
    UInt64(ArrayD<u64>),
    Float32(ArrayD<f32>),
    Float64(ArrayD<f64>),
    Bytes(FixedBytes),
    Categorical(Categorical),
}

/// Expands `$body` once per plain ndarray variant with `$a` bound to the array;
/// `Bytes` / `Categorical` go to `$other`.
macro_rules! each_array {
    ($column:expr, $a:ident => $body:expr, $other:ident => $fallback:expr) => {
        match $column {
            Column::Bool($a) => $body,
            Column::Int8($a) => $body,
            Column::Int16($a) => $body,
            Column::Int32($a) => $body,
            Column::Int64($a) => $body,
            Column::UInt8($a) => $body,
            Column::UInt16($a) => $body,
            Column::UInt32($a) => $body,
            Column::UInt64($a) => $body,
            Column::Float32($a) => $body,
            Column::Float64($a) => $body,
            $other => $fallback,
        }
    };
}
pub(crate) use each_array;

/// Element types that have a [`Column`] variant.
pub trait ColumnElement: Copy + Send + Sync + 'static {
    const DTYPE: Dtype;
    fn wrap(array: ArrayD<Self>) -> Column;
    fn unwrap(column: &Column) -> Option<&ArrayD<Self>>;
    /// `None` when `scalar` is not exactly representable as this type
    /// (out of range, or a fractional float for an integer type).
    fn from_scalar(scalar: &Scalar) -> Option<Self>;
}

macro_rules! column_element_impl {
    ($dtype:ty, $variant:ident) => {
        impl ColumnElement for $dtype {
            const DTYPE: Dtype = Dtype::$variant;
            fn wrap(array: ArrayD<Self>) -> Column {
                Column::$variant(array)
            }
            fn unwrap(column: &Column) -> Option<&ArrayD<Self>> {
                match column {
                    Column::$variant(array) => Some(array),
                    _ => None,
                }
            }
            fn from_scalar(scalar: &Scalar) -> Option<Self> {
                match scalar {
                    Scalar::Int(v) => <$dtype as NumCast>::from(*v),
                    Scalar::UInt(v) => <$dtype as NumCast>::from(*v),
                    // integers only take whole floats
                    Scalar::Float(v) if Dtype::$variant.is_integer() && v.fract() != 0.0 => None,
                    Scalar::Float(v) => <$dtype as NumCast>::from(*v),
                    Scalar::Bool(v) => Some(*v as u8 as $dtype),
                    Scalar::Bytes(_) => None,
                }
            }
        }
        impl<D: Dimension> From<Array<$dtype, D>> for Column {
            fn from(array: Array<$dtype, D>) -> Self {
                Column::$variant(array.into_dyn())
            }
        }
    };
}

column_element_impl!(i8, Int8);
column_element_impl!(i16, Int16);
column_element_impl!(i32, Int32);
column_element_impl!(i64, Int64);
column_element_impl!(u8, UInt8);
column_element_impl!(u16, UInt16);
column_element_impl!(u32, UInt32);
column_element_impl!(u64, UInt64);
column_element_impl!(f32, Float32);
column_element_impl!(f64, Float64);

impl ColumnElement for bool {
    const DTYPE: Dtype = Dtype::Bool;
    fn wrap(array: ArrayD<Self>) -> Column {
        Column::Bool(array)
    }
    fn unwrap(column: &Column) -> Option<&ArrayD<Self>> {
        match column {
            Column::Bool(array) => Some(array),
            _ => None,
        }
    }
    fn from_scalar(scalar: &Scalar) -> Option<Self> {
        match scalar {
            Scalar::Bool(v) => Some(*v),
            _ => None,
        }
    }
}
impl<D: Dimension> From<Array<bool, D>> for Column {
    fn from(array: Array<bool, D>) -> Self {
        Column::Bool(array.into_dyn())
    }
}

impl From<FixedBytes> for Column {
    fn from(values: FixedBytes) -> Self {
        Column::Bytes(values)
    }
}
impl From<Categorical> for Column {
    fn from(values: Categorical) -> Self {
        Column::Categorical(values)
    }
}

impl Column {
    /// Categoricals report the dtype of their codes.
    pub fn dtype(&self) -> Dtype {
        match self {
            Column::Bool(_) => Dtype::Bool,
            Column::Int8(_) => Dtype::Int8,
            Column::Int16(_) => Dtype::Int16,
            Column::Int32(_) => Dtype::Int32,
            Column::Int64(_) => Dtype::Int64,
            Column::UInt8(_) => Dtype::UInt8,
            Column::UInt16(_) => Dtype::UInt16,
            Column::UInt32(_) => Dtype::UInt32,
            Column::UInt64(_) => Dtype::UInt64,
            Column::Float32(_) => Dtype::Float32,
            Column::Float64(_) => Dtype::Float64,
            Column::Bytes(b) => Dtype::Bytes(b.itemsize()),
            Column::Categorical(_) => Dtype::Int32,
        }
    }

    pub fn shape(&self) -> &[usize] {
        each_array!(self, a => a.shape(), other => match other {
            Column::Bytes(b) => b.shape(),
            Column::Categorical(c) => c.codes().shape(),
            _ => unreachable!(),
        })
    }

    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    /// length of the first axis (1 for 0-d columns)
    pub fn len(&self) -> usize {
        self.shape().first().copied().unwrap_or(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_categorical(&self) -> bool {
        matches!(self, Column::Categorical(_))
    }

    pub fn as_array<T: ColumnElement>(&self) -> Option<&ArrayD<T>> {
        T::unwrap(self)
    }

    /// Builds one column out of scalars: all bytes → bytes, all bools → bool,
    /// any float → `float64`, otherwise `int64`.
    pub fn from_scalars(scalars: &[Scalar]) -> Result<Self> {
        if scalars.is_empty() {
            return Err(ToolkitError::value_error("cannot build a column from zero scalars"));
        }
        let shape = IxDyn(&[scalars.len()]);
        let num_bytes = scalars
            .iter()
            .filter(|s| matches!(s, Scalar::Bytes(_)))
            .count();
        if num_bytes == scalars.len() {
            let items: Vec<&[u8]> = scalars
                .iter()
                .filter_map(|s| match s {
                    Scalar::Bytes(b) => Some(b.as_slice()),
                    _ => None,
                })
                .collect();
            return Ok(Column::Bytes(FixedBytes::from_items(&items)));
        }
        if num_bytes > 0 {
            return Err(ToolkitError::type_error(
                "cannot mix byte strings and numbers in one key",
            ));
        }
        if scalars.iter().all(|s| matches!(s, Scalar::Bool(_))) {
            let values = scalars
                .iter()
                .map(|s| matches!(s, Scalar::Bool(true)))
                .collect();
            return Ok(Column::Bool(ArrayD::from_shape_vec(shape, values)?));
        }
        if scalars.iter().any(|s| matches!(s, Scalar::Float(_))) {
            let values = scalars
                .iter()
                .map(|s| f64::from_scalar(s).unwrap_or(f64::NAN))
                .collect();
            return Ok(Column::Float64(ArrayD::from_shape_vec(shape, values)?));
        }
        let values = scalars
            .iter()
            .map(|s| {
                i64::from_scalar(s)
                    .ok_or_else(|| ToolkitError::value_error(format!("{s:?} does not fit in int64")))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Column::Int64(ArrayD::from_shape_vec(shape, values)?))
    }

    /// Values of a 1-D integer column as `i64`, e.g. for time sequences.
    pub fn to_i64_vec(&self, name: &str) -> Result<Vec<i64>> {
        if self.ndim() != 1 {
            return Err(ToolkitError::value_error(format!(
                "`{name}` must be 1-dimensional, got {} dimensions",
                self.ndim()
            )));
        }
        fn convert<T: Copy + num_traits::ToPrimitive + std::fmt::Debug>(
            array: &ArrayD<T>,
            name: &str,
        ) -> Result<Vec<i64>> {
            array
                .iter()
                .map(|v| {
                    v.to_i64().ok_or_else(|| {
                        ToolkitError::value_error(format!("`{name}` holds {v:?}, beyond int64"))
                    })
                })
                .collect()
        }
        match self {
            Column::Int8(a) => convert(a, name),
            Column::Int16(a) => convert(a, name),
            Column::Int32(a) => convert(a, name),
            Column::Int64(a) => Ok(a.iter().copied().collect()),
            Column::UInt8(a) => convert(a, name),
            Column::UInt16(a) => convert(a, name),
            Column::UInt32(a) => convert(a, name),
            Column::UInt64(a) => convert(a, name),
            other => Err(ToolkitError::type_error(format!(
                "`{name}` must be an integer array, not `{}`",
                other.dtype()
            ))),
        }
    }
}
