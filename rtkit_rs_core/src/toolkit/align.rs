//! # toolkit/align
//!
//! the core routine behind an as-of merge.
//!
//! given a left and a right side, each with (possibly multi-column) keys and a
//! monotonic time sequence, [`alignmk`] returns, for every left row, the right row to
//! pull from, or the invalid index when there is none:
//!
//! - **backward**: the latest right row with the same key and `time2 <= time1`
//! - **forward**: the earliest right row with the same key and `time2 >= time1`
//!
//! (`<` / `>` when exact matches are not allowed).
//!
//! # design
//!
//! both sides are walked once, in time order. every distinct right key is interned to a
//! dense id up front, so during the walk "the last row seen for key K" is a plain
//! vector lookup. keys are hashed as opaque byte tuples (each column contributes a
//! fixed-width little-endian encoding), never compared lexicographically.
//!
//! times are assumed to be sorted; this is not checked.

use super::{
    column::Column,
    keys::{normalize_keys, Key},
    sentinel::Sentinel,
};
use crate::error::{Result, ToolkitError};
use fxhash::FxHashMap;
use ndarray::Array1;
use std::{borrow::Cow, fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Backward,
    Forward,
    /// closest match in either direction; not supported yet
    Nearest,
}

impl FromStr for Direction {
    type Err = ToolkitError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "backward" => Ok(Direction::Backward),
            "forward" => Ok(Direction::Forward),
            "nearest" => Ok(Direction::Nearest),
            _ => Err(ToolkitError::value_error(format!(
                "unsupported direction in alignmk: {s:?}"
            ))),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Backward => write!(f, "backward"),
            Direction::Forward => write!(f, "forward"),
            Direction::Nearest => write!(f, "nearest"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignOptions {
    pub direction: Direction,
    /// whether equal times on both sides count as a match
    pub allow_exact_matches: bool,
}

impl Default for AlignOptions {
    fn default() -> Self {
        Self {
            direction: Direction::Backward,
            allow_exact_matches: true,
        }
    }
}

impl AlignOptions {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            ..Self::default()
        }
    }

    pub fn allow_exact_matches(mut self, allow: bool) -> Self {
        self.allow_exact_matches = allow;
        self
    }
}

/// Integer types an alignment result can be expressed in; the invalid row is `MIN`.
pub trait AlignIndex: Sentinel + Send + Sync + 'static {
    fn from_row(row: usize) -> Option<Self>;
}

impl AlignIndex for i32 {
    #[inline]
    fn from_row(row: usize) -> Option<Self> {
        i32::try_from(row).ok()
    }
}
impl AlignIndex for i64 {
    #[inline]
    fn from_row(row: usize) -> Option<Self> {
        i64::try_from(row).ok()
    }
}

/// A key column laid out as `len * width` bytes, one fixed-width record per row.
struct KeyBytes<'a> {
    data: Cow<'a, [u8]>,
    width: usize,
}

impl KeyBytes<'_> {
    #[inline]
    fn row(&self, row: usize) -> &[u8] {
        &self.data[row * self.width..(row + 1) * self.width]
    }
}

fn le_bytes<T: Copy, const N: usize>(
    values: impl Iterator<Item = T>,
    to_bytes: impl Fn(T) -> [u8; N],
) -> KeyBytes<'static> {
    KeyBytes {
        data: Cow::Owned(values.flat_map(to_bytes).collect()),
        width: N,
    }
}

// -0.0 == 0.0, and every NaN hashes the same
#[inline]
fn canonical_f32(v: f32) -> [u8; 4] {
    let v = if v == 0.0 { 0.0 } else if v.is_nan() { f32::NAN } else { v };
    v.to_le_bytes()
}
#[inline]
fn canonical_f64(v: f64) -> [u8; 8] {
    let v = if v == 0.0 { 0.0 } else if v.is_nan() { f64::NAN } else { v };
    v.to_le_bytes()
}

fn key_bytes(column: &Column) -> KeyBytes<'_> {
    match column {
        Column::Bool(a) => le_bytes(a.iter().copied(), |v: bool| [v as u8]),
        Column::Int8(a) => le_bytes(a.iter().copied(), i8::to_le_bytes),
        Column::Int16(a) => le_bytes(a.iter().copied(), i16::to_le_bytes),
        Column::Int32(a) => le_bytes(a.iter().copied(), i32::to_le_bytes),
        Column::Int64(a) => le_bytes(a.iter().copied(), i64::to_le_bytes),
        Column::UInt8(a) => le_bytes(a.iter().copied(), u8::to_le_bytes),
        Column::UInt16(a) => le_bytes(a.iter().copied(), u16::to_le_bytes),
        Column::UInt32(a) => le_bytes(a.iter().copied(), u32::to_le_bytes),
        Column::UInt64(a) => le_bytes(a.iter().copied(), u64::to_le_bytes),
        Column::Float32(a) => le_bytes(a.iter().copied(), canonical_f32),
        Column::Float64(a) => le_bytes(a.iter().copied(), canonical_f64),
        Column::Bytes(b) => KeyBytes {
            data: Cow::Borrowed(b.as_bytes()),
            width: b.itemsize(),
        },
        Column::Categorical(c) => le_bytes(c.codes().iter().copied(), i32::to_le_bytes),
    }
}

/// The key of `row` as one byte tuple. Single-column keys are borrowed as is,
/// multi-column keys are assembled in `buffer`.
#[inline]
fn row_key<'s>(columns: &'s [KeyBytes<'_>], row: usize, buffer: &'s mut Vec<u8>) -> &'s [u8] {
    if let [column] = columns {
        return column.row(row);
    }
    buffer.clear();
    for column in columns {
        buffer.extend_from_slice(column.row(row));
    }
    buffer
}

fn check_key_columns(columns: &[Column], num_rows: usize, side: &str) -> Result<()> {
    for (i, column) in columns.iter().enumerate() {
        if column.ndim() != 1 {
            return Err(ToolkitError::value_error(format!(
                "key column {i} of {side} must be 1-dimensional, got {} dimensions",
                column.ndim()
            )));
        }
        if column.len() != num_rows {
            return Err(ToolkitError::value_error(format!(
                "key column {i} of {side} has {} rows but its time sequence has {num_rows}",
                column.len()
            )));
        }
    }
    Ok(())
}

/// Same as [`alignmk`], with the result expressed in index type `I`.
pub fn alignmk_as<I: AlignIndex>(
    key1: impl Into<Key>,
    key2: impl Into<Key>,
    time1: &Column,
    time2: &Column,
    options: AlignOptions,
) -> Result<Array1<I>> {
    let AlignOptions {
        direction,
        allow_exact_matches,
    } = options;
    if direction == Direction::Nearest {
        return Err(ToolkitError::NotImplemented(
            "the 'nearest' direction is not yet supported by alignmk".to_string(),
        ));
    }

    let (key1, key2) = normalize_keys(key1, key2)?;
    let time1 = time1.to_i64_vec("time1")?;
    let time2 = time2.to_i64_vec("time2")?;
    let (n1, n2) = (time1.len(), time2.len());
    check_key_columns(&key1, n1, "key1")?;
    check_key_columns(&key2, n2, "key2")?;
    if n2 > 0 && I::from_row(n2 - 1).is_none() {
        return Err(ToolkitError::value_error(format!(
            "{n2} right rows do not fit the requested index type"
        )));
    }

    let left: Vec<KeyBytes> = key1.iter().map(key_bytes).collect();
    let right: Vec<KeyBytes> = key2.iter().map(key_bytes).collect();
    let mut buffer = Vec::new();
    let mut ids: FxHashMap<Box<[u8]>, u32> = FxHashMap::default();
    let right_ids: Vec<u32> = (0..n2)
        .map(|row| {
            let key = row_key(&right, row, &mut buffer);
            match ids.get(key) {
                Some(&id) => id,
                None => {
                    let id = ids.len() as u32;
                    ids.insert(key.into(), id);
                    id
                }
            }
        })
        .collect();
    let left_ids: Vec<Option<u32>> = (0..n1)
        .map(|row| ids.get(row_key(&left, row, &mut buffer)).copied())
        .collect();
    tracing::debug!(
        %direction,
        allow_exact_matches,
        left_rows = n1,
        right_rows = n2,
        cardinality = ids.len(),
        "alignmk"
    );

    let invalid = I::invalid();
    let mut last = vec![invalid; ids.len()];
    let mut result = Array1::from_elem(n1, invalid);
    match direction {
        Direction::Backward => {
            let mut j = 0;
            for i in 0..n1 {
                let t = time1[i];
                while j < n2 && (time2[j] < t || allow_exact_matches && time2[j] == t) {
                    last[right_ids[j] as usize] = I::from_row(j).unwrap_or(invalid);
                    j += 1;
                }
                if let Some(id) = left_ids[i] {
                    result[i] = last[id as usize];
                }
            }
        }
        Direction::Forward => {
            let mut j = n2;
            for i in (0..n1).rev() {
                let t = time1[i];
                while j > 0 && (time2[j - 1] > t || allow_exact_matches && time2[j - 1] == t) {
                    j -= 1;
                    last[right_ids[j] as usize] = I::from_row(j).unwrap_or(invalid);
                }
                if let Some(id) = left_ids[i] {
                    result[i] = last[id as usize];
                }
            }
        }
        Direction::Nearest => unreachable!("rejected above"),
    }
    Ok(result)
}

/// For every left row, the right row an as-of merge would pull from (`i32::MIN` if none).
///
/// Use the result to gather from the right side, e.g. with [`super::gather::mbget`].
///
/// # Errors
///
/// - [`ToolkitError::NotImplemented`] for [`Direction::Nearest`].
/// - [`ToolkitError::Type`] if a time sequence is not an integer array.
/// - [`ToolkitError::Value`] if key columns and times disagree on the number of rows.
/// - whatever [`normalize_keys`] raises.
///
/// # Examples
///
/// ```
/// use ndarray::{arr1, Array1};
/// use rtkit_core::toolkit::{align::{alignmk, AlignOptions, Direction}, column::Column};
///
/// let time1 = Column::from(arr1(&[0i64, 1, 4, 6, 8, 9, 11, 16, 19, 20, 22, 27]));
/// let time2 = Column::from(arr1(&[4i64, 5, 7, 8, 10, 12, 15, 16, 24]));
/// let ones = |n: usize| Column::from(Array1::<f64>::ones(n));
/// let backward = alignmk(ones(12), ones(9), &time1, &time2, AlignOptions::default()).unwrap();
/// let s = i32::MIN;
/// assert_eq!(backward.to_vec(), vec![s, s, 0, 1, 3, 3, 4, 7, 7, 7, 7, 8]);
/// let forward = AlignOptions::new(Direction::Forward);
/// let forward = alignmk(ones(12), ones(9), &time1, &time2, forward).unwrap();
/// assert_eq!(forward.to_vec(), vec![0, 0, 0, 2, 3, 4, 5, 7, 8, 8, 8, s]);
/// ```
pub fn alignmk(
    key1: impl Into<Key>,
    key2: impl Into<Key>,
    time1: &Column,
    time2: &Column,
    options: AlignOptions,
) -> Result<Array1<i32>> {
    alignmk_as::<i32>(key1, key2, time1, time2, options)
}
