//! # toolkit/keys
//!
//! brings two key sets onto a common representation, so they can be compared element-wise
//! or hashed consistently: same number of columns, and for every position the same dtype
//! (and itemsize for byte strings) on both sides, categoricals sharing one code space.

use super::{
    categorical,
    column::{Column, Scalar},
    dtype::{cast, common_dtype},
};
use crate::error::{Result, ToolkitError};
use itertools::izip;

/// The shapes a key can be handed over in.
#[derive(Debug, Clone)]
pub enum Key {
    /// one key column
    Single(Column),
    /// several key columns, compared together
    Multi(Vec<Column>),
    /// one key column written out as scalars
    Scalars(Vec<Scalar>),
    /// named key columns (dict-like), used in insertion order
    Named(Vec<(String, Column)>),
}

impl From<Column> for Key {
    fn from(column: Column) -> Self {
        Key::Single(column)
    }
}
impl From<Vec<Column>> for Key {
    fn from(columns: Vec<Column>) -> Self {
        Key::Multi(columns)
    }
}
impl From<Vec<Scalar>> for Key {
    fn from(scalars: Vec<Scalar>) -> Self {
        Key::Scalars(scalars)
    }
}
impl From<Vec<(String, Column)>> for Key {
    fn from(columns: Vec<(String, Column)>) -> Self {
        Key::Named(columns)
    }
}

/// One element of a key handed over as a sequence.
#[derive(Debug, Clone)]
pub enum KeyPart {
    Column(Column),
    Scalar(Scalar),
}

impl Key {
    /// Reads a key handed over as a sequence: the first element decides its shape.
    ///
    /// - a column first makes it a multikey, one column per element
    /// - a scalar first makes it a single key column built from all the scalars
    ///
    /// # Errors
    ///
    /// - [`ToolkitError::Value`] for an empty sequence.
    /// - [`ToolkitError::Type`] when columns and scalars are mixed.
    pub fn from_parts(parts: Vec<KeyPart>) -> Result<Self> {
        match parts.first() {
            None => Err(ToolkitError::value_error("a key needs at least one element")),
            Some(KeyPart::Column(_)) => parts
                .into_iter()
                .enumerate()
                .map(|(i, part)| match part {
                    KeyPart::Column(column) => Ok(column),
                    KeyPart::Scalar(scalar) => Err(ToolkitError::type_error(format!(
                        "element {i} of a multikey is the scalar {scalar:?}, expected an array"
                    ))),
                })
                .collect::<Result<Vec<_>>>()
                .map(Key::Multi),
            Some(KeyPart::Scalar(_)) => parts
                .into_iter()
                .enumerate()
                .map(|(i, part)| match part {
                    KeyPart::Scalar(scalar) => Ok(scalar),
                    KeyPart::Column(_) => Err(ToolkitError::type_error(format!(
                        "element {i} of a scalar key is an array"
                    ))),
                })
                .collect::<Result<Vec<_>>>()
                .map(Key::Scalars),
        }
    }

    /// The ordered key columns.
    pub fn into_columns(self) -> Result<Vec<Column>> {
        match self {
            Key::Single(column) => Ok(vec![column]),
            Key::Multi(columns) => Ok(columns),
            Key::Scalars(scalars) => Ok(vec![Column::from_scalars(&scalars)?]),
            Key::Named(columns) => Ok(columns.into_iter().map(|(_, column)| column).collect()),
        }
    }
}

fn reconcile(a: Column, b: Column) -> Result<(Column, Column)> {
    // aligning may re-code both sides even when no upcast is needed
    let (a, b) = if a.is_categorical() || b.is_categorical() {
        categorical::align(a, b)?
    } else {
        (a, b)
    };
    let common = common_dtype(a.dtype(), b.dtype())?;
    Ok((cast(a, common)?, cast(b, common)?))
}

/// Makes two key sets comparable.
///
/// Single columns come back as one-element lists. Integers, floats and byte strings may
/// be upcast (invalid values stay invalid), categoricals may be re-coded.
///
/// # Errors
///
/// - [`ToolkitError::Value`] if the key sets have a different number of columns.
/// - whatever categorical alignment or dtype promotion raise for a column pair.
pub fn normalize_keys(
    key1: impl Into<Key>,
    key2: impl Into<Key>,
) -> Result<(Vec<Column>, Vec<Column>)> {
    let key1 = key1.into().into_columns()?;
    let key2 = key2.into().into_columns()?;
    if key1.len() != key2.len() {
        return Err(ToolkitError::value_error(format!(
            "key sets have different numbers of columns: {} vs {}",
            key1.len(),
            key2.len()
        )));
    }
    tracing::debug!(
        columns = key1.len(),
        left = ?key1.iter().map(Column::dtype).collect::<Vec<_>>(),
        right = ?key2.iter().map(Column::dtype).collect::<Vec<_>>(),
        "normalizing keys"
    );

    let mut arrays1 = Vec::with_capacity(key1.len());
    let mut arrays2 = Vec::with_capacity(key2.len());
    for (a, b) in izip!(key1, key2) {
        let (a, b) = reconcile(a, b)?;
        arrays1.push(a);
        arrays2.push(b);
    }
    Ok((arrays1, arrays2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolkit::{
        categorical::Categorical,
        column::FixedBytes,
        dtype::Dtype,
    };
    use ndarray::arr1;

    fn dtypes(columns: &[Column]) -> Vec<Dtype> {
        columns.iter().map(Column::dtype).collect()
    }

    #[test]
    fn test_single_columns_are_wrapped() {
        let (a, b) = normalize_keys(
            Column::from(arr1(&[1i16, 2])),
            Column::from(arr1(&[3i32])),
        )
        .unwrap();
        assert_eq!(a, vec![Column::from(arr1(&[1i32, 2]))]);
        assert_eq!(b, vec![Column::from(arr1(&[3i32]))]);
    }

    #[test]
    fn test_multi_columns_pairwise() {
        let key1 = vec![
            Column::from(arr1(&[1u8, 2])),
            Column::Bytes(FixedBytes::from_items(&["a", "b"])),
            Column::from(arr1(&[0.5f32, 1.0])),
        ];
        let key2 = vec![
            Column::from(arr1(&[i8::MIN, 4])),
            Column::Bytes(FixedBytes::from_items(&["abcd"])),
            Column::from(arr1(&[2i64])),
        ];
        let (a, b) = normalize_keys(key1, key2).unwrap();
        let expected = vec![Dtype::Int16, Dtype::Bytes(4), Dtype::Float64];
        assert_eq!(dtypes(&a), expected);
        assert_eq!(dtypes(&b), expected);
        // the int8 sentinel stays invalid after the upcast
        assert_eq!(b[0], Column::from(arr1(&[i16::MIN, 4])));
    }

    #[test]
    fn test_scalars_form_one_column() {
        let (a, b) = normalize_keys(
            vec![Scalar::Int(1), Scalar::Int(2)],
            Column::from(arr1(&[1.5f64])),
        )
        .unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(a[0], Column::from(arr1(&[1.0f64, 2.0])));
        assert_eq!(dtypes(&b), vec![Dtype::Float64]);
    }

    #[test]
    fn test_named_columns_keep_order() {
        let key1 = vec![
            ("sym".to_string(), Column::Bytes(FixedBytes::from_items(&["x"]))),
            ("id".to_string(), Column::from(arr1(&[7i32]))),
        ];
        let key2 = vec![
            Column::Bytes(FixedBytes::from_items(&["yy"])),
            Column::from(arr1(&[7i64])),
        ];
        let (a, b) = normalize_keys(key1, key2).unwrap();
        assert_eq!(dtypes(&a), vec![Dtype::Bytes(2), Dtype::Int64]);
        assert_eq!(dtypes(&a), dtypes(&b));
    }

    #[test]
    fn test_categoricals_are_aligned() {
        let c1 = Categorical::from_items(&["A", "B", "C"]);
        let c2 = Categorical::new(
            arr1(&[1, 2, 3]),
            vec![b"B".to_vec(), b"C".to_vec(), b"D".to_vec()],
        )
        .unwrap();
        let (a, b) = normalize_keys(Column::from(c1), Column::from(c2)).unwrap();
        let (Column::Categorical(a), Column::Categorical(b)) = (&a[0], &b[0]) else {
            panic!("categoricals should stay categoricals");
        };
        assert_eq!(a.categories(), b.categories());
        // 'B' and 'C' share codes on both sides
        assert_eq!(a.codes()[1], b.codes()[0]);
        assert_eq!(a.codes()[2], b.codes()[1]);
    }

    #[test]
    fn test_key_from_parts() {
        let multi = Key::from_parts(vec![
            KeyPart::Column(Column::from(arr1(&[1i32, 2]))),
            KeyPart::Column(Column::Bytes(FixedBytes::from_items(&["a", "b"]))),
        ])
        .unwrap();
        assert_eq!(multi.into_columns().unwrap().len(), 2);

        let scalars = Key::from_parts(vec![
            KeyPart::Scalar(Scalar::Int(3)),
            KeyPart::Scalar(Scalar::Int(4)),
        ])
        .unwrap();
        assert_eq!(
            scalars.into_columns().unwrap(),
            vec![Column::from(arr1(&[3i64, 4]))]
        );

        let mixed = Key::from_parts(vec![
            KeyPart::Scalar(Scalar::Int(3)),
            KeyPart::Column(Column::from(arr1(&[1i32]))),
        ]);
        assert!(matches!(mixed, Err(ToolkitError::Type(_))));
        let mixed = Key::from_parts(vec![
            KeyPart::Column(Column::from(arr1(&[1i32]))),
            KeyPart::Scalar(Scalar::Int(3)),
        ]);
        assert!(matches!(mixed, Err(ToolkitError::Type(_))));
        assert!(matches!(Key::from_parts(vec![]), Err(ToolkitError::Value(_))));
    }

    #[test]
    fn test_mismatched_column_counts() {
        let key1 = vec![Column::from(arr1(&[1i32])), Column::from(arr1(&[1i32]))];
        let key2 = Column::from(arr1(&[1i32]));
        assert!(matches!(
            normalize_keys(key1, key2),
            Err(ToolkitError::Value(_))
        ));
    }

    #[test]
    fn test_incompatible_columns() {
        let key1 = Column::Bytes(FixedBytes::from_items(&["a"]));
        let key2 = Column::from(arr1(&[1i32]));
        assert!(matches!(
            normalize_keys(key1, key2),
            Err(ToolkitError::Type(_))
        ));
    }
}
