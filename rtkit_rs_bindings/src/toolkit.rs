//! numpy <-> [`Column`] glue shared by the extension modules.
//!
//! Numeric arrays are copied into owned ndarrays (memory order is kept), `S` arrays become
//! [`FixedBytes`], `U` arrays are utf-8 encoded first. Object arrays are rejected.

use numpy::{
    IntoPyArray, PyArrayDescrMethods, PyArrayDyn, PyArrayMethods, PyUntypedArray,
    PyUntypedArrayMethods,
};
use pyo3::{
    exceptions::{PyNotImplementedError, PyTypeError, PyValueError},
    prelude::*,
    types::{PyBool, PyBytes, PyDict, PyList, PyString, PyTuple},
};
use rtkit_core::{
    toolkit::{
        column::{Column, FixedBytes, Scalar},
        keys::{Key, KeyPart},
    },
    ToolkitError,
};

pub fn to_py_err(err: ToolkitError) -> PyErr {
    match err {
        ToolkitError::Type(msg) => PyTypeError::new_err(msg),
        ToolkitError::Value(msg) => PyValueError::new_err(msg),
        ToolkitError::NotImplemented(msg) => PyNotImplementedError::new_err(msg),
    }
}

pub trait IntoPyResult<T> {
    fn into_py_result(self) -> PyResult<T>;
}
impl<T> IntoPyResult<T> for rtkit_core::Result<T> {
    fn into_py_result(self) -> PyResult<T> {
        self.map_err(to_py_err)
    }
}

macro_rules! extract_numeric {
    ($array:expr, $($t:ty),+ $(,)?) => {
        $(
            if let Ok(array) = $array.as_any().downcast::<PyArrayDyn<$t>>() {
                return Ok(Column::from(array.readonly().as_array().to_owned()));
            }
        )+
    };
}

fn extract_bytes(array: &Bound<'_, PyUntypedArray>) -> PyResult<Column> {
    let itemsize = array.dtype().itemsize();
    let shape = array.shape().to_vec();
    let raw = array.call_method0("tobytes")?;
    let raw = raw.downcast::<PyBytes>()?;
    FixedBytes::new(itemsize, shape, raw.as_bytes().to_vec())
        .map(Column::from)
        .into_py_result()
}

/// Converts a numpy array into a [`Column`]; anything else is a `TypeError`.
pub fn extract_column(obj: &Bound<'_, PyAny>) -> PyResult<Column> {
    let array = obj
        .downcast::<PyUntypedArray>()
        .map_err(|_| PyTypeError::new_err("expected a numpy array"))?;
    let dtype = array.dtype();
    match dtype.kind() {
        b'O' => Err(PyTypeError::new_err(
            "object arrays are not supported, convert them to a fixed-width dtype first",
        )),
        b'S' => extract_bytes(array),
        b'U' => {
            let numpy = obj.py().import_bound("numpy")?;
            let encoded = numpy
                .getattr("char")?
                .call_method1("encode", (array, "utf-8"))?;
            extract_column(&encoded)
        }
        _ => {
            extract_numeric!(array, bool, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);
            Err(PyTypeError::new_err(format!(
                "unsupported dtype '{}'",
                dtype.str()?
            )))
        }
    }
}

/// Like [`extract_column`], but runs non-arrays (lists, tuples...) through `numpy.asarray`.
pub fn coerce_column(obj: &Bound<'_, PyAny>) -> PyResult<Column> {
    if obj.downcast::<PyUntypedArray>().is_ok() {
        return extract_column(obj);
    }
    let numpy = obj.py().import_bound("numpy")?;
    extract_column(&numpy.call_method1("asarray", (obj,))?)
}

pub fn extract_scalar(obj: &Bound<'_, PyAny>) -> PyResult<Scalar> {
    if obj.is_instance_of::<PyBool>() {
        return Ok(Scalar::Bool(obj.extract()?));
    }
    if let Ok(v) = obj.extract::<i64>() {
        return Ok(Scalar::Int(v));
    }
    if let Ok(v) = obj.extract::<u64>() {
        return Ok(Scalar::UInt(v));
    }
    if let Ok(v) = obj.extract::<f64>() {
        return Ok(Scalar::Float(v));
    }
    if let Ok(bytes) = obj.downcast::<PyBytes>() {
        return Ok(Scalar::Bytes(bytes.as_bytes().to_vec()));
    }
    if let Ok(s) = obj.downcast::<PyString>() {
        return Ok(Scalar::Bytes(s.to_cow()?.as_bytes().to_vec()));
    }
    Err(PyTypeError::new_err(format!(
        "cannot use {} as a scalar",
        obj.repr()?
    )))
}

fn key_part(item: &Bound<'_, PyAny>) -> PyResult<KeyPart> {
    if item.downcast::<PyUntypedArray>().is_ok() {
        return Ok(KeyPart::Column(extract_column(item)?));
    }
    match extract_scalar(item) {
        Ok(scalar) => Ok(KeyPart::Scalar(scalar)),
        // nested sequences are columns too
        Err(_) => Ok(KeyPart::Column(coerce_column(item)?)),
    }
}

/// Reads a key argument.
///
/// - a numpy array is one key column
/// - a dict maps names to key columns
/// - a list / tuple of arrays is a multikey, a list / tuple of scalars is one key column
/// - anything else goes through `numpy.asarray`
pub fn extract_key(obj: &Bound<'_, PyAny>) -> PyResult<Key> {
    if obj.downcast::<PyUntypedArray>().is_ok() {
        return Ok(Key::Single(extract_column(obj)?));
    }
    if let Ok(dict) = obj.downcast::<PyDict>() {
        let columns = dict
            .iter()
            .map(|(name, value)| Ok((name.str()?.to_string(), coerce_column(&value)?)))
            .collect::<PyResult<Vec<_>>>()?;
        return Ok(Key::Named(columns));
    }
    if obj.is_instance_of::<PyList>() || obj.is_instance_of::<PyTuple>() {
        let parts = obj
            .iter()?
            .map(|item| key_part(&item?))
            .collect::<PyResult<Vec<_>>>()?;
        return Key::from_parts(parts).into_py_result();
    }
    Ok(Key::Single(coerce_column(obj)?))
}

pub fn scalar_into_py(py: Python<'_>, scalar: Scalar) -> PyObject {
    match scalar {
        Scalar::Bool(v) => v.into_py(py),
        Scalar::Int(v) => v.into_py(py),
        Scalar::UInt(v) => v.into_py(py),
        Scalar::Float(v) => v.into_py(py),
        Scalar::Bytes(v) => PyBytes::new_bound(py, &v).into_any().unbind(),
    }
}

fn bytes_into_py(py: Python<'_>, values: FixedBytes) -> PyResult<PyObject> {
    let numpy = py.import_bound("numpy")?;
    let dtype = format!("S{}", values.itemsize());
    let shape = values.shape().to_vec();
    let raw = PyBytes::new_bound(py, values.as_bytes());
    let array = numpy
        .call_method1("frombuffer", (raw, dtype))?
        .call_method1("reshape", (shape,))?
        .call_method0("copy")?;
    Ok(array.unbind())
}

/// Converts a [`Column`] back into a numpy array. Categoricals are handed back as their codes.
pub fn column_into_py(py: Python<'_>, column: Column) -> PyResult<PyObject> {
    macro_rules! into_numpy {
        ($array:expr) => {
            Ok($array.into_pyarray_bound(py).into_any().unbind())
        };
    }
    match column {
        Column::Bool(a) => into_numpy!(a),
        Column::Int8(a) => into_numpy!(a),
        Column::Int16(a) => into_numpy!(a),
        Column::Int32(a) => into_numpy!(a),
        Column::Int64(a) => into_numpy!(a),
        Column::UInt8(a) => into_numpy!(a),
        Column::UInt16(a) => into_numpy!(a),
        Column::UInt32(a) => into_numpy!(a),
        Column::UInt64(a) => into_numpy!(a),
        Column::Float32(a) => into_numpy!(a),
        Column::Float64(a) => into_numpy!(a),
        Column::Bytes(values) => bytes_into_py(py, values),
        Column::Categorical(categorical) => into_numpy!(categorical.codes().clone()),
    }
}
