//! # toolkit/categorical
//!
//! a categorical column stores 1-based `i32` codes into a list of byte-string labels,
//! code `0` being the invalid ("filtered") bin.

use super::{
    column::{Column, FixedBytes},
    sentinel::INVALID_CATEGORY_CODE,
};
use crate::error::{Result, ToolkitError};
use fxhash::FxHashMap;
use itertools::Itertools;
use ndarray::Array1;

#[derive(Debug, Clone, PartialEq)]
pub struct Categorical {
    codes: Array1<i32>,
    categories: Vec<Vec<u8>>,
}

impl Categorical {
    pub fn new(codes: Array1<i32>, categories: Vec<Vec<u8>>) -> Result<Self> {
        let max_code = categories.len() as i64;
        if let Some(bad) = codes.iter().find(|&&c| c < 0 || c as i64 > max_code) {
            return Err(ToolkitError::value_error(format!(
                "code {bad} is out of range for {max_code} categories"
            )));
        }
        Ok(Self { codes, categories })
    }

    /// Categorizes `items` with their sorted unique values as categories.
    pub fn from_items<S: AsRef<[u8]>>(items: &[S]) -> Self {
        let categories: Vec<Vec<u8>> = items
            .iter()
            .map(|item| item.as_ref())
            .sorted()
            .dedup()
            .map(|item| item.to_vec())
            .collect();
        let lookup: FxHashMap<&[u8], i32> = categories
            .iter()
            .enumerate()
            .map(|(i, label)| (label.as_slice(), i as i32 + 1))
            .collect();
        let codes = items.iter().map(|item| lookup[item.as_ref()]).collect();
        Self {
            codes,
            categories,
        }
    }

    /// Categorizes a 1-D byte string column, ignoring NUL padding.
    pub fn from_bytes(values: &FixedBytes) -> Result<Self> {
        if values.shape().len() != 1 {
            return Err(ToolkitError::value_error(
                "only 1-dimensional byte strings can be categorized",
            ));
        }
        let items: Vec<&[u8]> = (0..values.size()).map(|i| values.get_trimmed(i)).collect();
        Ok(Self::from_items(&items))
    }

    pub fn codes(&self) -> &Array1<i32> {
        &self.codes
    }
    pub fn categories(&self) -> &[Vec<u8>] {
        &self.categories
    }
    pub fn len(&self) -> usize {
        self.codes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// label of `code`; `None` for the invalid code (or a code out of range)
    pub fn label(&self, code: i32) -> Option<&[u8]> {
        if code <= INVALID_CATEGORY_CODE {
            return None;
        }
        self.categories.get(code as usize - 1).map(Vec::as_slice)
    }

    /// the code of `label`, if it is one of the categories
    pub fn code_of(&self, label: &[u8]) -> Option<i32> {
        self.categories
            .iter()
            .position(|c| c.as_slice() == label)
            .map(|i| i as i32 + 1)
    }

    /// Same categories, new codes.
    pub(crate) fn with_codes(&self, codes: Array1<i32>) -> Self {
        Self {
            codes,
            categories: self.categories.clone(),
        }
    }

    /// Expands the codes back into byte strings; invalid codes become empty strings.
    pub fn expand(&self) -> FixedBytes {
        let items: Vec<&[u8]> = self
            .codes
            .iter()
            .map(|&code| self.label(code).unwrap_or(b""))
            .collect();
        FixedBytes::from_items(&items)
    }
}

fn to_categorical(column: Column) -> Result<Categorical> {
    match column {
        Column::Categorical(c) => Ok(c),
        Column::Bytes(b) => Categorical::from_bytes(&b),
        other => Err(ToolkitError::type_error(format!(
            "cannot align a `{}` column with a categorical",
            other.dtype()
        ))),
    }
}

/// Puts two categoricals onto one code space: the same label gets the same code on both
/// sides. A plain byte string column is categorized first.
///
/// The merged categories are `a`'s, followed by the labels only `b` has, so `a`'s codes
/// never change.
pub fn align(a: Column, b: Column) -> Result<(Column, Column)> {
    let a = to_categorical(a)?;
    let b = to_categorical(b)?;
    if a.categories == b.categories {
        return Ok((a.into(), b.into()));
    }
    let mut categories = a.categories.clone();
    let mut lookup: FxHashMap<Vec<u8>, i32> = categories
        .iter()
        .enumerate()
        .map(|(i, label)| (label.clone(), i as i32 + 1))
        .collect();
    let mut remap = vec![INVALID_CATEGORY_CODE; b.categories.len() + 1];
    for (i, label) in b.categories.iter().enumerate() {
        let code = *lookup.entry(label.clone()).or_insert_with(|| {
            categories.push(label.clone());
            categories.len() as i32
        });
        remap[i + 1] = code;
    }
    tracing::trace!(
        left = a.categories.len(),
        right = b.categories.len(),
        merged = categories.len(),
        "aligned categoricals"
    );
    let b_codes = b.codes.mapv(|code| remap[code as usize]);
    let b = Categorical {
        codes: b_codes,
        categories: categories.clone(),
    };
    let a = Categorical {
        codes: a.codes,
        categories,
    };
    Ok((a.into(), b.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn test_from_items() {
        let c = Categorical::from_items(&["b", "a", "b", "c"]);
        assert_eq!(c.categories(), &[b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
        assert_eq!(c.codes(), &arr1(&[2, 1, 2, 3]));
        assert_eq!(c.label(2), Some(&b"b"[..]));
        assert_eq!(c.label(0), None);
        assert_eq!(c.code_of(b"c"), Some(3));
        assert_eq!(c.expand(), FixedBytes::from_items(&["b", "a", "b", "c"]));
    }

    #[test]
    fn test_new_checks_codes() {
        let categories = vec![b"x".to_vec()];
        assert!(Categorical::new(arr1(&[0, 1]), categories.clone()).is_ok());
        assert!(Categorical::new(arr1(&[2]), categories.clone()).is_err());
        assert!(Categorical::new(arr1(&[-1]), categories).is_err());
    }

    #[test]
    fn test_align_shares_codes() {
        // ['A', 'B', 'C'] vs codes [1, 2, 3] into ['B', 'C', 'D']
        let c1 = Categorical::from_items(&["A", "B", "C"]);
        let c2 = Categorical::new(
            arr1(&[1, 2, 3, 0]),
            vec![b"B".to_vec(), b"C".to_vec(), b"D".to_vec()],
        )
        .unwrap();
        let (a, b) = align(c1.into(), c2.into()).unwrap();
        let (Column::Categorical(a), Column::Categorical(b)) = (a, b) else {
            panic!("align should return categoricals");
        };
        assert_eq!(a.categories(), b.categories());
        assert_eq!(a.codes(), &arr1(&[1, 2, 3]));
        assert_eq!(b.codes(), &arr1(&[2, 3, 4, 0]));
        assert_eq!(b.expand(), FixedBytes::from_items(&["B", "C", "D", ""]));
    }

    #[test]
    fn test_align_categorizes_bytes() {
        let c = Categorical::from_items(&["x", "y"]);
        let raw = Column::Bytes(FixedBytes::from_items(&["y", "z"]));
        let (a, b) = align(c.into(), raw).unwrap();
        let (Column::Categorical(a), Column::Categorical(b)) = (a, b) else {
            panic!("align should return categoricals");
        };
        assert_eq!(a.codes(), &arr1(&[1, 2]));
        assert_eq!(b.codes(), &arr1(&[2, 3]));

        let numbers = Column::from(arr1(&[1i32, 2]));
        let c = Categorical::from_items(&["x"]);
        assert!(matches!(
            align(c.into(), numbers),
            Err(ToolkitError::Type(_))
        ));
    }
}
