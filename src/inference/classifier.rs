use crate::{Error, Result};

/// A loaded model that maps one fixed-length id sequence to its output row.
pub trait Classifier: Send + Sync {
    fn predict(&self, sequence: &[i64]) -> Result<Vec<f32>>;
}

/// Pick the injection-class probability out of a model output row.
///
/// The value is passed through unmodified; anything that is not a finite
/// probability is an inference failure rather than a score.
pub fn extract_score(output: &[f32], positive_index: usize) -> Result<f64> {
    let value = output.get(positive_index).copied().ok_or_else(|| {
        Error::inference(format!(
            "model produced {} outputs, expected index {}",
            output.len(),
            positive_index
        ))
    })?;

    let score = f64::from(value);
    if !score.is_finite() || !(0.0..=1.0).contains(&score) {
        return Err(Error::inference(format!(
            "model output {} is not a probability",
            score
        )));
    }

    Ok(score)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_requested_index() {
        assert_eq!(extract_score(&[0.25, 0.75], 0).unwrap(), 0.25);
        assert_eq!(extract_score(&[0.25, 0.75], 1).unwrap(), 0.75);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        assert_eq!(extract_score(&[0.0], 0).unwrap(), 0.0);
        assert_eq!(extract_score(&[1.0], 0).unwrap(), 1.0);
    }

    #[test]
    fn test_missing_index_is_error() {
        assert!(matches!(extract_score(&[0.5], 1), Err(Error::Inference(_))));
        assert!(extract_score(&[], 0).is_err());
    }

    #[test]
    fn test_non_probabilities_are_rejected() {
        assert!(extract_score(&[f32::NAN], 0).is_err());
        assert!(extract_score(&[1.5], 0).is_err());
        assert!(extract_score(&[-0.1], 0).is_err());
    }
}
