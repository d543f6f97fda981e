use super::column::FixedBytes;
use crate::error::{Result, ToolkitError};
use fxhash::FxHashMap;

/// Length of a byte string without its trailing NUL padding.
#[inline]
pub fn find_true_width(bytes: &[u8]) -> usize {
    bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1)
}

/// Replaces every value of `values` found in `old` with the item at the same position
/// in `new`; values not in `old` become `missing`.
///
/// `old` is expected to hold unique values, the last duplicate wins otherwise.
pub fn str_replace(
    values: &FixedBytes,
    old: &FixedBytes,
    new: &FixedBytes,
    missing: &[u8],
) -> Result<FixedBytes> {
    if old.size() != new.size() {
        return Err(ToolkitError::value_error(format!(
            "lists of old uniques ({}) and new uniques ({}) must be the same length",
            old.size(),
            new.size()
        )));
    }
    let lookup: FxHashMap<&[u8], &[u8]> = (0..old.size())
        .map(|i| (old.get_trimmed(i), new.get_trimmed(i)))
        .collect();
    let missing = &missing[..find_true_width(missing)];
    let itemsize = missing.len().max(new.itemsize());
    let mut out = FixedBytes::zeros(itemsize, values.shape().to_vec());
    for i in 0..values.size() {
        let replaced = lookup
            .get(values.get_trimmed(i))
            .copied()
            .unwrap_or(missing);
        out.get_mut(i)[..replaced.len()].copy_from_slice(replaced);
    }
    Ok(out)
}
