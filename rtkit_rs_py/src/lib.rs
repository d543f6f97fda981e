mod toolkit;
use pyo3::{prelude::*, py_run};
use rtkit_bindings::register_submodule;
use rtkit_core::toolkit::sentinel::INVALID_CATEGORY_CODE;

#[pymodule]
fn rtkit(m: &Bound<'_, PyModule>) -> PyResult<()> {
    let rs_module = register_submodule!(m, "rtkit._rs");
    let toolkit_module = register_submodule!(rs_module, "rtkit._rs.toolkit");

    toolkit_module.add("INVALID_CATEGORY_CODE", INVALID_CATEGORY_CODE)?;
    toolkit_module.add_function(wrap_pyfunction!(toolkit::alignmk, &toolkit_module)?)?;
    toolkit_module.add_function(wrap_pyfunction!(toolkit::mbget, &toolkit_module)?)?;
    toolkit_module.add_function(wrap_pyfunction!(toolkit::find_true_width, &toolkit_module)?)?;
    toolkit_module.add_function(wrap_pyfunction!(toolkit::str_replace, &toolkit_module)?)?;
    toolkit_module.add_function(wrap_pyfunction!(toolkit::get_default_value, &toolkit_module)?)?;

    let gather_module = register_submodule!(toolkit_module, "rtkit._rs.toolkit.gather");
    macro_rules! add_gather {
        ($($func:ident),+ $(,)?) => {
            $(gather_module.add_function(wrap_pyfunction!(toolkit::$func, &gather_module)?)?;)+
        };
    }
    add_gather!(
        gather_1d_f32,
        gather_1d_f64,
        gather_1d_i32,
        gather_1d_i64,
        gather_2d_f32,
        gather_2d_f64,
        gather_2d_i32,
        gather_2d_i64,
    );

    Ok(())
}
