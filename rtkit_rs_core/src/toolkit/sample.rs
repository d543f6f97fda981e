//! # toolkit/sample
//!
//! random row sampling, built on [`super::gather::mbget`].

use super::{column::Column, gather::mbget};
use crate::error::{Result, ToolkitError};
use ndarray::Array1;
use rand::{seq::index, Rng};

/// Restricts which rows [`sample`] may pick.
#[derive(Debug, Clone, Copy)]
pub enum RowFilter<'a> {
    /// one flag per row
    Mask(&'a [bool]),
    /// explicit row numbers
    Rows(&'a [i64]),
}

/// Picks `min(n, available)` distinct rows uniformly at random, in ascending order.
pub fn sample_rows<R: Rng + ?Sized>(
    num_rows: usize,
    n: usize,
    filter: Option<RowFilter>,
    rng: &mut R,
) -> Result<Vec<i64>> {
    let candidates: Option<Vec<i64>> = match filter {
        None => None,
        Some(RowFilter::Mask(mask)) => {
            if mask.len() != num_rows {
                return Err(ToolkitError::value_error(format!(
                    "mask has {} flags for {num_rows} rows",
                    mask.len()
                )));
            }
            Some(
                mask.iter()
                    .enumerate()
                    .filter_map(|(i, &keep)| keep.then_some(i as i64))
                    .collect(),
            )
        }
        Some(RowFilter::Rows(rows)) => Some(rows.to_vec()),
    };
    let available = candidates.as_ref().map_or(num_rows, Vec::len);
    let n = n.min(available);
    let mut picked: Vec<i64> = index::sample(rng, available, n)
        .into_iter()
        .map(|i| match &candidates {
            Some(candidates) => candidates[i],
            None => i as i64,
        })
        .collect();
    picked.sort_unstable();
    Ok(picked)
}

/// Selects `n` random rows of `values` (see [`sample_rows`]), keeping their order.
pub fn sample<R: Rng + ?Sized>(
    values: &Column,
    n: usize,
    filter: Option<RowFilter>,
    rng: &mut R,
) -> Result<Column> {
    let rows = sample_rows(values.len(), n, filter, rng)?;
    mbget(values, &Column::from(Array1::from(rows)), None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_sample_rows() {
        let mut rng = StdRng::seed_from_u64(0);
        let rows = sample_rows(100, 10, None, &mut rng).unwrap();
        assert_eq!(rows.len(), 10);
        assert!(rows.windows(2).all(|w| w[0] < w[1]));
        assert!(rows.iter().all(|&r| (0..100).contains(&r)));

        let rows = sample_rows(3, 10, None, &mut rng).unwrap();
        assert_eq!(rows, vec![0, 1, 2]);
    }

    #[test]
    fn test_sample_with_filter() {
        let mut rng = StdRng::seed_from_u64(1);
        let mask = [true, false, true, false, true];
        let rows = sample_rows(5, 2, Some(RowFilter::Mask(&mask)), &mut rng).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|&r| mask[r as usize]));

        let rows = sample_rows(5, 5, Some(RowFilter::Rows(&[4, 1])), &mut rng).unwrap();
        assert_eq!(rows, vec![1, 4]);

        assert!(sample_rows(4, 1, Some(RowFilter::Mask(&mask)), &mut rng).is_err());
    }

    #[test]
    fn test_sample_column() {
        let mut rng = StdRng::seed_from_u64(2);
        let values = Column::from(arr2(&[[1i32, 2], [3, 4], [5, 6]]));
        let picked = sample(&values, 2, None, &mut rng).unwrap();
        assert_eq!(picked.shape(), &[2, 2]);
        let values = Column::from(arr1(&[1.0f64, 2.0, 3.0]));
        let picked = sample(&values, 5, None, &mut rng).unwrap();
        assert_eq!(picked, values);
    }
}
