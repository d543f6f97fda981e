use numpy::{
    IntoPyArray, PyArray2, PyArrayDyn, PyReadonlyArray1, PyReadonlyArray2, PyReadonlyArrayDyn,
};
use pyo3::{exceptions::PyTypeError, prelude::*, types::PyBytes};
use rtkit_bindings::toolkit::{
    coerce_column, column_into_py, extract_column, extract_key, extract_scalar, scalar_into_py,
    IntoPyResult,
};
use rtkit_core::toolkit::{
    align::{alignmk_as, AlignOptions, Direction},
    column::{Column, FixedBytes},
    gather, sentinel, strings,
};

#[pyfunction]
#[pyo3(signature = (key1, key2, time1, time2, direction="backward", allow_exact_matches=true))]
pub fn alignmk(
    py: Python<'_>,
    key1: &Bound<'_, PyAny>,
    key2: &Bound<'_, PyAny>,
    time1: &Bound<'_, PyAny>,
    time2: &Bound<'_, PyAny>,
    direction: &str,
    allow_exact_matches: bool,
) -> PyResult<PyObject> {
    let direction = direction.parse::<Direction>().into_py_result()?;
    let options = AlignOptions::new(direction).allow_exact_matches(allow_exact_matches);
    let key1 = extract_key(key1)?;
    let key2 = extract_key(key2)?;
    let time1 = extract_column(time1)?;
    let time2 = extract_column(time2)?;
    // row numbers of the right side must fit the index dtype
    if time2.len() > i32::MAX as usize {
        tracing::debug!(rows = time2.len(), "alignmk: using int64 row numbers");
        let index = py
            .allow_threads(|| alignmk_as::<i64>(key1, key2, &time1, &time2, options))
            .into_py_result()?;
        return Ok(index.into_pyarray_bound(py).into_any().unbind());
    }
    let index = py
        .allow_threads(|| alignmk_as::<i32>(key1, key2, &time1, &time2, options))
        .into_py_result()?;
    Ok(index.into_pyarray_bound(py).into_any().unbind())
}

#[pyfunction]
#[pyo3(signature = (values, index, d=None))]
pub fn mbget(
    py: Python<'_>,
    values: &Bound<'_, PyAny>,
    index: &Bound<'_, PyAny>,
    d: Option<&Bound<'_, PyAny>>,
) -> PyResult<PyObject> {
    let values = coerce_column(values)?;
    let index = coerce_column(index)?;
    let default = d
        .filter(|d| !d.is_none())
        .map(extract_scalar)
        .transpose()?;
    let gathered = py
        .allow_threads(|| gather::mbget(&values, &index, default.as_ref()))
        .into_py_result()?;
    column_into_py(py, gathered)
}

#[pyfunction]
pub fn find_true_width(string: &Bound<'_, PyAny>) -> PyResult<usize> {
    if let Ok(bytes) = string.downcast::<PyBytes>() {
        return Ok(strings::find_true_width(bytes.as_bytes()));
    }
    match coerce_column(string)? {
        Column::Int8(a) => {
            let raw: Vec<u8> = a.iter().map(|&b| b as u8).collect();
            Ok(strings::find_true_width(&raw))
        }
        Column::UInt8(a) => {
            let raw: Vec<u8> = a.iter().copied().collect();
            Ok(strings::find_true_width(&raw))
        }
        Column::Bytes(values) if values.size() == 1 => Ok(strings::find_true_width(values.get(0))),
        other => Err(PyTypeError::new_err(format!(
            "find_true_width expects bytes or an int8 array, got {}",
            other.dtype()
        ))),
    }
}

fn bytes_argument(column: Column, name: &str) -> PyResult<FixedBytes> {
    match column {
        Column::Bytes(values) => Ok(values),
        other => Err(PyTypeError::new_err(format!(
            "{name} must be a byte string array, got {}",
            other.dtype()
        ))),
    }
}

#[pyfunction]
#[pyo3(signature = (values, old, new, missing=None))]
pub fn str_replace(
    py: Python<'_>,
    values: &Bound<'_, PyAny>,
    old: &Bound<'_, PyAny>,
    new: &Bound<'_, PyAny>,
    missing: Option<Vec<u8>>,
) -> PyResult<PyObject> {
    let values = bytes_argument(coerce_column(values)?, "values")?;
    let old = bytes_argument(coerce_column(old)?, "old")?;
    let new = bytes_argument(coerce_column(new)?, "new")?;
    let missing = missing.unwrap_or_default();
    let replaced = py
        .allow_threads(|| strings::str_replace(&values, &old, &new, &missing))
        .into_py_result()?;
    column_into_py(py, Column::Bytes(replaced))
}

#[pyfunction]
pub fn get_default_value(py: Python<'_>, values: &Bound<'_, PyAny>) -> PyResult<PyObject> {
    let values = coerce_column(values)?;
    Ok(scalar_into_py(py, sentinel::get_default_value(&values)))
}

// typed fast paths: zero-copy views of the numpy buffers, no `Column` round trip

macro_rules! gather_impl {
    ($dtype:ident) => {
        paste::item! {
            #[pyfunction]
            pub fn [<gather_1d_ $dtype>]<'py>(
                py: Python<'py>,
                values: PyReadonlyArray1<$dtype>,
                index: PyReadonlyArrayDyn<i64>,
                default: $dtype,
            ) -> Bound<'py, PyArrayDyn<$dtype>> {
                let values = values.as_array();
                let index = index.as_array();
                gather::gather_1d(values, index, default).into_pyarray_bound(py)
            }

            #[pyfunction]
            pub fn [<gather_2d_ $dtype>]<'py>(
                py: Python<'py>,
                values: PyReadonlyArray2<$dtype>,
                index: PyReadonlyArray1<i64>,
                default: $dtype,
            ) -> PyResult<Bound<'py, PyArray2<$dtype>>> {
                let values = values.as_array();
                let index = index.as_array();
                let gathered = gather::gather_2d(values, index, default).into_py_result()?;
                Ok(gathered.into_pyarray_bound(py))
            }
        }
    };
}

gather_impl!(f32);
gather_impl!(f64);
gather_impl!(i32);
gather_impl!(i64);
