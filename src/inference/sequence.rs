use crate::config::{ModelConfig, Side};
use std::iter;

/// The fixed-length encoding contract the model was trained with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceShape {
    pub max_len: usize,
    pub padding: Side,
    pub truncating: Side,
    pub pad_value: i64,
}

impl SequenceShape {
    pub fn new(max_len: usize) -> Self {
        Self {
            max_len,
            padding: Side::Pre,
            truncating: Side::Pre,
            pad_value: 0,
        }
    }
}

impl Default for SequenceShape {
    fn default() -> Self {
        Self::new(100)
    }
}

impl From<&ModelConfig> for SequenceShape {
    fn from(config: &ModelConfig) -> Self {
        Self {
            max_len: config.max_len,
            padding: config.padding,
            truncating: config.truncating,
            pad_value: config.pad_value,
        }
    }
}

/// Pad or truncate `ids` to exactly `shape.max_len` elements.
///
/// `Side::Pre` truncation keeps the last `max_len` ids; `Side::Pre` padding
/// puts the filler before the ids.
pub fn fit_sequence(ids: &[i64], shape: &SequenceShape) -> Vec<i64> {
    let max_len = shape.max_len;
    let kept = if ids.len() > max_len {
        match shape.truncating {
            Side::Pre => &ids[ids.len() - max_len..],
            Side::Post => &ids[..max_len],
        }
    } else {
        ids
    };

    let filler = iter::repeat(shape.pad_value).take(max_len - kept.len());
    match shape.padding {
        Side::Pre => filler.chain(kept.iter().copied()).collect(),
        Side::Post => kept.iter().copied().chain(filler).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn shape(max_len: usize, padding: Side, truncating: Side) -> SequenceShape {
        SequenceShape {
            max_len,
            padding,
            truncating,
            pad_value: 0,
        }
    }

    #[rstest]
    #[case(Side::Pre, vec![0, 0, 7, 8, 9])]
    #[case(Side::Post, vec![7, 8, 9, 0, 0])]
    fn test_short_sequences_are_padded(#[case] padding: Side, #[case] expected: Vec<i64>) {
        let fitted = fit_sequence(&[7, 8, 9], &shape(5, padding, Side::Pre));
        assert_eq!(fitted, expected);
    }

    #[rstest]
    #[case(Side::Pre, vec![3, 4, 5])]
    #[case(Side::Post, vec![1, 2, 3])]
    fn test_long_sequences_are_truncated(#[case] truncating: Side, #[case] expected: Vec<i64>) {
        let fitted = fit_sequence(&[1, 2, 3, 4, 5], &shape(3, Side::Pre, truncating));
        assert_eq!(fitted, expected);
    }

    #[test]
    fn test_exact_length_is_untouched() {
        let fitted = fit_sequence(&[1, 2, 3], &shape(3, Side::Post, Side::Post));
        assert_eq!(fitted, vec![1, 2, 3]);
    }

    #[test]
    fn test_empty_sequence_is_all_filler() {
        let mut shape = SequenceShape::default();
        shape.pad_value = -1;
        let fitted = fit_sequence(&[], &shape);
        assert_eq!(fitted.len(), 100);
        assert!(fitted.iter().all(|&id| id == -1));
    }

    #[rstest]
    #[case(1)]
    #[case(100)]
    #[case(10_000)]
    fn test_output_length_is_always_max_len(#[case] len: usize) {
        let ids: Vec<i64> = (1..=len as i64).collect();
        let fitted = fit_sequence(&ids, &SequenceShape::default());
        assert_eq!(fitted.len(), 100);
    }

    #[test]
    fn test_defaults_match_keras_pad_sequences() {
        let shape = SequenceShape::from(&ModelConfig::default());
        assert_eq!(shape, SequenceShape::new(100));
        let ids: Vec<i64> = (1..=150).collect();
        let fitted = fit_sequence(&ids, &shape);
        assert_eq!(fitted[0], 51);
        assert_eq!(fitted[99], 150);
    }
}
