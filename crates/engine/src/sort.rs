//! Row ordering for the sort primitive.

use std::cmp::Ordering;

use ordered_float::OrderedFloat;

use gridwise_core::CellValue;

/// Key for sorting rows.
///
/// Type rank: Numbers(0) < Text(1) < Bool(2) < Blank(3). Blanks stay last in
/// both directions; ties keep their original order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SortKey {
    pub type_rank: u8,
    pub number: OrderedFloat<f64>,
    /// Trimmed + lowercased text
    pub text: String,
    pub flag: bool,
}

impl SortKey {
    pub fn from_value(value: &CellValue) -> Self {
        let mut key = SortKey {
            type_rank: 3,
            number: OrderedFloat(0.0),
            text: String::new(),
            flag: false,
        };
        match value {
            CellValue::Number(n) => {
                key.type_rank = 0;
                key.number = OrderedFloat(*n);
            }
            CellValue::Text(s) if !s.is_empty() => {
                key.type_rank = 1;
                key.text = s.trim().to_lowercase();
            }
            CellValue::Bool(b) => {
                key.type_rank = 2;
                key.flag = *b;
            }
            _ => {}
        }
        key
    }

    pub fn is_blank(&self) -> bool {
        self.type_rank == 3
    }
}

/// Compare two keys for the given direction, keeping blanks at the end.
pub fn compare(a: &SortKey, b: &SortKey, ascending: bool) -> Ordering {
    match (a.is_blank(), b.is_blank()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) if ascending => a.cmp(b),
        (false, false) => b.cmp(a),
    }
}

/// Stable permutation of row offsets that sorts `keys`.
pub fn permutation(keys: &[SortKey], ascending: bool) -> Vec<usize> {
    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by(|&a, &b| compare(&keys[a], &keys[b], ascending));
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(values: &[CellValue]) -> Vec<SortKey> {
        values.iter().map(SortKey::from_value).collect()
    }

    #[test]
    fn test_numbers_before_text_blanks_last() {
        let k = keys(&[
            CellValue::Empty,
            CellValue::from("b"),
            CellValue::Number(3.0),
            CellValue::Number(-1.0),
        ]);
        assert_eq!(permutation(&k, true), vec![3, 2, 1, 0]);
    }

    #[test]
    fn test_descending_keeps_blanks_last() {
        let k = keys(&[CellValue::Number(1.0), CellValue::Empty, CellValue::Number(5.0)]);
        assert_eq!(permutation(&k, false), vec![2, 0, 1]);
    }

    #[test]
    fn test_stable_for_ties() {
        let k = keys(&[CellValue::from("A"), CellValue::from("a"), CellValue::from(" a ")]);
        assert_eq!(permutation(&k, true), vec![0, 1, 2]);
        assert_eq!(permutation(&k, false), vec![0, 1, 2]);
    }
}
