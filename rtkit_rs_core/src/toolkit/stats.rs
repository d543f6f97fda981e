use super::sentinel::Sentinel;
use crate::error::{Result, ToolkitError};
use ndarray::{Array1, ArrayView1};
use num_traits::ToPrimitive;

pub const DEFAULT_QUANTILES: [f64; 5] = [0.10, 0.25, 0.50, 0.75, 0.90];

/// Linear interpolation of sorted `data` at a fractional position.
///
/// Returns the interpolated value and the integer part of `float_index`. Positions past
/// the last element give NaN; negative or non-finite positions are a value error.
pub fn interpolate(data: &[f64], float_index: f64) -> Result<(f64, usize)> {
    if !float_index.is_finite() {
        return Err(ToolkitError::value_error(format!(
            "interpolate: index must be finite, got {float_index}"
        )));
    }
    if float_index < 0.0 {
        return Err(ToolkitError::value_error(format!(
            "interpolate: cannot call with negative index: {float_index}"
        )));
    }
    let whole = float_index.trunc();
    let frac = float_index - whole;
    let whole = whole as usize;
    if data.is_empty() || float_index > (data.len() - 1) as f64 {
        return Ok((f64::NAN, whole));
    }
    if frac == 0.0 {
        return Ok((data[whole], whole));
    }
    Ok(((1.0 - frac) * data[whole] + frac * data[whole + 1], whole))
}

/// Quantiles of the valid (non-sentinel) values of `values`, numpy's "linear" method.
///
/// `q` defaults to [`DEFAULT_QUANTILES`]; every quantile is NaN when nothing is valid.
pub fn quantile<T>(values: ArrayView1<T>, q: Option<&[f64]>) -> Result<Array1<f64>>
where
    T: Sentinel + ToPrimitive,
{
    let q = q.unwrap_or(&DEFAULT_QUANTILES);
    if let Some(bad) = q.iter().find(|p| !(0.0..=1.0).contains(*p)) {
        return Err(ToolkitError::value_error(format!(
            "quantiles must be within [0, 1], got {bad}"
        )));
    }
    let mut valid: Vec<f64> = values
        .iter()
        .filter(|v| !v.is_invalid())
        .filter_map(|v| v.to_f64())
        .collect();
    if valid.is_empty() {
        return Ok(Array1::from_elem(q.len(), f64::NAN));
    }
    valid.sort_by(f64::total_cmp);
    let last = (valid.len() - 1) as f64;
    q.iter()
        .map(|p| interpolate(&valid, p * last).map(|(v, _)| v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn test_interpolate() {
        let data = [1.0, 2.0, 4.0];
        assert_eq!(interpolate(&data, 0.0).unwrap(), (1.0, 0));
        assert_eq!(interpolate(&data, 1.5).unwrap(), (3.0, 1));
        assert_eq!(interpolate(&data, 2.0).unwrap(), (4.0, 2));
        assert!(interpolate(&data, 2.5).unwrap().0.is_nan());
        assert!(matches!(
            interpolate(&data, -0.5),
            Err(ToolkitError::Value(_))
        ));
    }

    #[test]
    fn test_interpolate_non_finite_index() {
        for index in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(
                matches!(interpolate(&[1.0], index), Err(ToolkitError::Value(_))),
                "index {index}"
            );
        }
    }

    #[test]
    fn test_quantile_skips_invalid() {
        let values = arr1(&[5i32, i32::MIN, 1, 3, 2, 4]);
        let q = quantile(values.view(), Some(&[0.0, 0.5, 0.25, 1.0])).unwrap();
        assert_eq!(q, arr1(&[1.0, 3.0, 2.0, 5.0]));

        let floats = arr1(&[f64::NAN, 10.0, 0.0]);
        let q = quantile(floats.view(), None).unwrap();
        assert_eq!(q.len(), DEFAULT_QUANTILES.len());
        assert!((q[0] - 1.0).abs() < 1e-12);
        assert!((q[2] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_quantile_all_invalid() {
        let values = arr1(&[f32::NAN, f32::NAN]);
        let q = quantile(values.view(), Some(&[0.5])).unwrap();
        assert!(q[0].is_nan());
        assert!(quantile(values.view(), Some(&[1.5])).is_err());
    }
}
