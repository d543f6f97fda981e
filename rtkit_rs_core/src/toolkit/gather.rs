//! # toolkit/gather
//!
//! fancy indexing where out-of-bounds indices 'retrieve' a default value instead of failing.
//!
//! ```text
//! values = [10, 20, 30, 40, 50, 60, 70]
//! index  = [ 0, -7,  4,  3,  7,  1,  2]
//! out    = [10,  S, 50, 40,  S, 20, 30]     (S = invalid value of the dtype)
//! ```
//!
//! negative indices are out of bounds, they do NOT wrap around.

use super::{
    categorical::Categorical,
    column::{each_array, Column, ColumnElement, FixedBytes, Scalar},
    sentinel::{Sentinel, INVALID_CATEGORY_CODE},
};
use crate::error::{Result, ToolkitError};
use ndarray::{Array1, Array2, ArrayD, ArrayView1, ArrayView2, ArrayViewD, Ix1, Ix2, ShapeBuilder};
use std::borrow::Cow;

/// Integer types usable as gather indices.
pub trait GatherIndex: Copy + Send + Sync + 'static {
    /// `Some(offset)` when `self` addresses an element of an axis of length `len`.
    fn to_offset(self, len: usize) -> Option<usize>;
}

macro_rules! gather_index_impl {
    ($($dtype:ty),*) => {
        $(
            impl GatherIndex for $dtype {
                #[inline]
                fn to_offset(self, len: usize) -> Option<usize> {
                    usize::try_from(self).ok().filter(|&offset| offset < len)
                }
            }
        )*
    };
}

gather_index_impl!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

fn contiguous<'a, T: Clone>(values: &'a ArrayView1<'_, T>) -> Cow<'a, [T]> {
    match values.as_slice() {
        Some(slice) => Cow::Borrowed(slice),
        None => Cow::Owned(values.to_vec()),
    }
}

/// `out[k] = values[index[k]]` for in-bounds indices, `default` otherwise.
///
/// The output has the shape of `index`.
pub fn gather_1d<T: Clone, I: GatherIndex>(
    values: ArrayView1<T>,
    index: ArrayViewD<I>,
    default: T,
) -> ArrayD<T> {
    let src = contiguous(&values);
    let len = src.len();
    index.map(|&i| match i.to_offset(len) {
        Some(offset) => src[offset].clone(),
        None => default.clone(),
    })
}

fn is_fortran<T>(values: &ArrayView2<T>) -> bool {
    !values.is_standard_layout() && values.t().is_standard_layout()
}

/// Row-wise gather over a 2-D source, output shape `(len(index), ncols)`.
///
/// The source is flattened in row-major order, each requested row expands into one
/// flat index per column (`row * ncols + col`), and [`gather_1d`] runs once over the
/// expanded indices. A column-major source gives a column-major result.
pub fn gather_2d<T: Clone, I: GatherIndex>(
    values: ArrayView2<T>,
    index: ArrayView1<I>,
    default: T,
) -> Result<Array2<T>> {
    let (nrows, ncols) = values.dim();
    let final_shape = (index.len(), ncols);
    let fortran = is_fortran(&values);

    let flat: Vec<T> = values.iter().cloned().collect();
    let mut expanded: Vec<i64> = Vec::with_capacity(index.len() * ncols);
    for &row in index.iter() {
        match row.to_offset(nrows) {
            Some(row) => expanded.extend((0..ncols).map(|col| (row * ncols + col) as i64)),
            None => expanded.extend(std::iter::repeat(i64::MIN).take(ncols)),
        }
    }
    let expanded = Array1::from(expanded).into_dyn();

    let result = gather_1d(ArrayView1::from(&flat), expanded.view(), default.clone());
    let result = result.into_shape(final_shape)?;
    if !fortran {
        return Ok(result);
    }
    let mut restored = Array2::from_elem(final_shape.f(), default);
    restored.assign(&result);
    Ok(restored)
}

fn gather_bytes<I: GatherIndex>(
    values: &FixedBytes,
    index: ArrayViewD<I>,
    default: &[u8],
) -> Result<FixedBytes> {
    let itemsize = values.itemsize();
    let default = &default[..default.len().min(itemsize)];
    let (row_len, nrows, out_shape) = match values.shape() {
        [n] => (1, *n, index.shape().to_vec()),
        [n, c] => (*c, *n, vec![index.len(), *c]),
        _ => return Err(too_many_dims(values.shape().len())),
    };
    let mut out = FixedBytes::zeros(itemsize, out_shape);
    for (k, &row) in index.iter().enumerate() {
        for col in 0..row_len {
            let target = out.get_mut(k * row_len + col);
            match row.to_offset(nrows) {
                Some(row) => target.copy_from_slice(values.get(row * row_len + col)),
                None => target[..default.len()].copy_from_slice(default),
            }
        }
    }
    Ok(out)
}

// categorical codes are 1-D, so the index has to be as well
fn gather_categorical<I: GatherIndex>(
    values: &Categorical,
    index: ArrayViewD<I>,
    default: Option<&Scalar>,
) -> Result<Categorical> {
    if index.ndim() != 1 {
        return Err(ToolkitError::value_error(format!(
            "categoricals can only be gathered with a 1-dimensional index, got {} dimensions",
            index.ndim()
        )));
    }
    let default = match default {
        None => INVALID_CATEGORY_CODE,
        Some(Scalar::Bytes(label)) => values.code_of(label).ok_or_else(|| {
            ToolkitError::value_error(format!(
                "default {:?} is not a category",
                String::from_utf8_lossy(label)
            ))
        })?,
        Some(Scalar::Int(code)) => i32::try_from(*code)
            .ok()
            .filter(|&c| c == INVALID_CATEGORY_CODE || values.label(c).is_some())
            .ok_or_else(|| ToolkitError::value_error(format!("{code} is not a category code")))?,
        Some(other) => {
            return Err(ToolkitError::type_error(format!(
                "{other:?} is not a valid default for a categorical"
            )))
        }
    };
    let codes = gather_1d(values.codes().view(), index, default).into_dimensionality::<Ix1>()?;
    Ok(values.with_codes(codes))
}

fn resolve_default<T: ColumnElement + Sentinel>(default: Option<&Scalar>) -> Result<T> {
    match default {
        None => Ok(T::invalid()),
        Some(scalar) => T::from_scalar(scalar).ok_or_else(|| {
            ToolkitError::type_error(format!(
                "default {scalar:?} cannot be represented as `{}`",
                T::DTYPE
            ))
        }),
    }
}

fn gather_array<T: ColumnElement + Sentinel, I: GatherIndex>(
    values: &ArrayD<T>,
    index: ArrayViewD<I>,
    default: Option<&Scalar>,
) -> Result<Column> {
    let default = resolve_default::<T>(default)?;
    match values.ndim() {
        1 => {
            let values = values.view().into_dimensionality::<Ix1>()?;
            Ok(T::wrap(gather_1d(values, index, default)))
        }
        2 => {
            let values = values.view().into_dimensionality::<Ix2>()?;
            let index: Array1<I> = index.iter().copied().collect();
            Ok(T::wrap(gather_2d(values, index.view(), default)?.into_dyn()))
        }
        n => Err(too_many_dims(n)),
    }
}

fn gather_column<I: GatherIndex>(
    values: &Column,
    index: ArrayViewD<I>,
    default: Option<&Scalar>,
) -> Result<Column> {
    each_array!(values, a => gather_array(a, index, default), other => match other {
        Column::Bytes(b) => {
            let default = match default {
                None => &[][..],
                Some(Scalar::Bytes(d)) => d.as_slice(),
                Some(other) => {
                    return Err(ToolkitError::type_error(format!(
                        "{other:?} is not a valid default for byte strings"
                    )))
                }
            };
            gather_bytes(b, index, default).map(Column::Bytes)
        }
        Column::Categorical(c) => gather_categorical(c, index, default).map(Column::Categorical),
        _ => unreachable!(),
    })
}

fn too_many_dims(ndim: usize) -> ToolkitError {
    ToolkitError::value_error(format!(
        "mbget supports 1 or 2 dimensional values, got {ndim} dimensions"
    ))
}

/// Gathers `values` at `index`, substituting a default for out-of-bounds indices.
///
/// - 1-D `values`: the result has the shape of `index`.
/// - 2-D `values`: `index` selects rows, the result has shape `(len(index), ncols)`.
///
/// The default is the dtype's invalid value (see [`super::sentinel`]) unless `default`
/// is given, in which case it is used for every dtype it can be represented in.
///
/// # Errors
///
/// - [`ToolkitError::Type`] if `index` is not an integer column, or `default` does not fit.
/// - [`ToolkitError::Value`] if `values` has more than 2 dimensions.
pub fn mbget(values: &Column, index: &Column, default: Option<&Scalar>) -> Result<Column> {
    tracing::debug!(
        values_dtype = %values.dtype(),
        values_shape = ?values.shape(),
        index_shape = ?index.shape(),
        "mbget"
    );
    macro_rules! with_index {
        ($i:expr) => {{
            if !matches!(values.ndim(), 1 | 2) {
                return Err(too_many_dims(values.ndim()));
            }
            gather_column(values, $i.view(), default)
        }};
    }
    match index {
        Column::Int8(i) => with_index!(i),
        Column::Int16(i) => with_index!(i),
        Column::Int32(i) => with_index!(i),
        Column::Int64(i) => with_index!(i),
        Column::UInt8(i) => with_index!(i),
        Column::UInt16(i) => with_index!(i),
        Column::UInt32(i) => with_index!(i),
        Column::UInt64(i) => with_index!(i),
        other => Err(ToolkitError::type_error(format!(
            "indices provided to mbget must be an integer type not `{}`",
            other.dtype()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2, Array3};

    #[test]
    fn test_gather_example() {
        let values = Column::from(arr1(&[10i32, 20, 30, 40, 50, 60, 70]));
        let index = Column::from(arr1(&[0i64, -7, 4, 3, 7, 1, 2]));
        let out = mbget(&values, &index, None).unwrap();
        let s = i32::MIN;
        assert_eq!(out, Column::from(arr1(&[10i32, s, 50, 40, s, 20, 30])));
    }

    #[test]
    fn test_gather_bounds_property() {
        let source: Vec<i64> = (0..13).map(|x| x * x - 20).collect();
        let values = arr1(&source);
        let index: Vec<i32> = (-5..20).collect();
        let out = gather_1d(values.view(), arr1(&index).into_dyn().view(), i64::MIN);
        assert_eq!(out.shape(), &[index.len()]);
        for (k, &i) in index.iter().enumerate() {
            let expected = if (0..source.len() as i32).contains(&i) {
                source[i as usize]
            } else {
                i64::MIN
            };
            assert_eq!(out[[k]], expected, "index {i}");
        }
    }

    #[test]
    fn test_gather_float_and_shape() {
        let values = Column::from(arr1(&[1.5f64, 2.5]));
        let index = Column::from(arr2(&[[0u8, 5], [1, 1], [9, 0]]));
        let out = mbget(&values, &index, None).unwrap();
        assert_eq!(out.shape(), &[3, 2]);
        let out = out.as_array::<f64>().unwrap();
        assert_eq!(out[[0, 0]], 1.5);
        assert!(out[[0, 1]].is_nan());
        assert_eq!(out[[1, 1]], 2.5);
        assert!(out[[2, 0]].is_nan());
    }

    #[test]
    fn test_gather_unsigned_sentinel() {
        let values = Column::from(arr1(&[1u16, 2]));
        let index = Column::from(arr1(&[1i32, 2]));
        let out = mbget(&values, &index, None).unwrap();
        assert_eq!(out, Column::from(arr1(&[2u16, u16::MAX])));
    }

    #[test]
    fn test_gather_custom_default() {
        let values = Column::from(arr1(&[1i32, 2, 3]));
        let index = Column::from(arr1(&[2i64, 3, -1]));
        let out = mbget(&values, &index, Some(&Scalar::Int(-1))).unwrap();
        assert_eq!(out, Column::from(arr1(&[3i32, -1, -1])));

        let floats = Column::from(arr1(&[0.5f32]));
        let out = mbget(&floats, &index, Some(&Scalar::Float(0.0))).unwrap();
        assert_eq!(out, Column::from(arr1(&[0.0f32, 0.0, 0.0])));

        let bad = mbget(&values, &index, Some(&"x".into()));
        assert!(matches!(bad, Err(ToolkitError::Type(_))));
    }

    #[test]
    fn test_gather_float_default_on_integers() {
        let values = Column::from(arr1(&[1i32, 2, 3]));
        let index = Column::from(arr1(&[0i64, 7]));
        let out = mbget(&values, &index, Some(&Scalar::Float(2.0))).unwrap();
        assert_eq!(out, Column::from(arr1(&[1i32, 2])));
        for lossy in [1.5, f64::NAN, 1e12] {
            let out = mbget(&values, &index, Some(&Scalar::Float(lossy)));
            assert!(matches!(out, Err(ToolkitError::Type(_))), "default {lossy}");
        }
        let floats = Column::from(arr1(&[0.5f32]));
        let out = mbget(&floats, &index, Some(&Scalar::Float(0.1))).unwrap();
        assert_eq!(out, Column::from(arr1(&[0.5f32, 0.1])));
    }

    #[test]
    fn test_gather_bytes() {
        let values = Column::Bytes(FixedBytes::from_items(&["ab", "cde", "f"]));
        let index = Column::from(arr1(&[2i64, -1, 0, 3]));
        let out = mbget(&values, &index, None).unwrap();
        assert_eq!(
            out,
            Column::Bytes(FixedBytes::from_items(&["f", "", "ab", ""]).with_itemsize(3))
        );
        let out = mbget(&values, &index, Some(&"zz".into())).unwrap();
        assert_eq!(
            out,
            Column::Bytes(FixedBytes::from_items(&["f", "zz", "ab", "zz"]).with_itemsize(3))
        );
    }

    #[test]
    fn test_gather_categorical() {
        let values = Column::Categorical(Categorical::from_items(&["x", "y", "x"]));
        let index = Column::from(arr1(&[1i32, 5, 0]));
        let Column::Categorical(out) = mbget(&values, &index, None).unwrap() else {
            panic!("categoricals should gather into categoricals");
        };
        assert_eq!(out.codes(), &arr1(&[2, 0, 1]));
        assert_eq!(out.categories(), &[b"x".to_vec(), b"y".to_vec()]);
        let Column::Categorical(out) = mbget(&values, &index, Some(&"y".into())).unwrap() else {
            panic!("categoricals should gather into categoricals");
        };
        assert_eq!(out.codes(), &arr1(&[2, 2, 1]));
    }

    #[test]
    fn test_gather_categorical_needs_1d_index() {
        let values = Column::Categorical(Categorical::from_items(&["x", "y", "x"]));
        let index = Column::from(arr2(&[[0i32, 1], [2, 9]]));
        let err = mbget(&values, &index, None).unwrap_err();
        assert!(matches!(err, ToolkitError::Value(ref msg) if msg.contains("1-dimensional index")));

        let plain = Column::from(arr1(&[1i32, 2, 1]));
        assert_eq!(mbget(&plain, &index, None).unwrap().shape(), &[2, 2]);
    }

    #[test]
    fn test_gather_2d() {
        let values = arr2(&[[1i64, 2, 3], [4, 5, 6]]);
        let index = arr1(&[1i32, -1, 0, 2]);
        let out = gather_2d(values.view(), index.view(), i64::MIN).unwrap();
        let s = i64::MIN;
        assert_eq!(out, arr2(&[[4, 5, 6], [s, s, s], [1, 2, 3], [s, s, s]]));
        assert!(out.is_standard_layout());

        let fortran = values.t().as_standard_layout().into_owned().reversed_axes();
        assert_eq!(fortran, values);
        assert!(!fortran.is_standard_layout());
        let out_f = gather_2d(fortran.view(), index.view(), i64::MIN).unwrap();
        assert_eq!(out_f, out);
        assert!(out_f.t().is_standard_layout());
    }

    #[test]
    fn test_gather_2d_column_shape() {
        let values = Column::from(arr2(&[[1.0f32, 2.0], [3.0, 4.0], [5.0, 6.0]]));
        let index = Column::from(arr1(&[2u32, 0, 0, 7, 1]));
        let out = mbget(&values, &index, None).unwrap();
        assert_eq!(out.shape(), &[5, 2]);

        let strings = FixedBytes::from_items(&["a", "b", "c", "d"]).reshape(vec![2, 2]);
        let strings = Column::Bytes(strings.unwrap());
        let out = mbget(&strings, &Column::from(arr1(&[1i8, 2])), None).unwrap();
        assert_eq!(out.shape(), &[2, 2]);
        let Column::Bytes(out) = out else {
            panic!("bytes should gather into bytes");
        };
        assert_eq!(out.as_bytes(), b"cd\0\0");
    }

    #[test]
    fn test_gather_errors() {
        let values = Column::from(arr1(&[1i32, 2]));
        let float_index = Column::from(arr1(&[0.0f64]));
        assert!(matches!(
            mbget(&values, &float_index, None),
            Err(ToolkitError::Type(_))
        ));
        let cube = Column::from(Array3::<i32>::zeros((2, 2, 2)));
        let index = Column::from(arr1(&[0i64]));
        assert!(matches!(
            mbget(&cube, &index, None),
            Err(ToolkitError::Value(_))
        ));
    }

    #[test]
    fn test_gather_empty() {
        let values = Column::from(arr1::<f64>(&[]));
        let index = Column::from(arr1(&[0i64, 1]));
        let out = mbget(&values, &index, None).unwrap();
        assert_eq!(out.len(), 2);
        let index = Column::from(arr1::<i64>(&[]));
        let out = mbget(&values, &index, None).unwrap();
        assert!(out.is_empty());
    }
}
