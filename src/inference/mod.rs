//! The request-to-score pipeline: tokenize, fit to the trained length,
//! predict, extract the injection probability.

mod classifier;
#[cfg(feature = "onnx")]
mod onnx;
mod sequence;
mod tokenizer;

pub use classifier::{Classifier, extract_score};
#[cfg(feature = "onnx")]
pub use onnx::OnnxClassifier;
pub use sequence::{SequenceShape, fit_sequence};
pub use tokenizer::{DEFAULT_FILTERS, KerasTokenizer, TextEncoder, TokenizerOptions};

use crate::{Result, config::ModelConfig};
use tracing::{info, trace};

/// Load-once handle over the tokenizer and model. Shared read-only by every
/// request for the life of the process.
pub struct Scorer {
    encoder: Box<dyn TextEncoder>,
    classifier: Box<dyn Classifier>,
    shape: SequenceShape,
    positive_index: usize,
}

impl Scorer {
    pub fn new(
        encoder: Box<dyn TextEncoder>,
        classifier: Box<dyn Classifier>,
        shape: SequenceShape,
        positive_index: usize,
    ) -> Self {
        Self {
            encoder,
            classifier,
            shape,
            positive_index,
        }
    }

    /// Load both artifacts named by `config`. Any failure here is fatal to
    /// the service.
    #[cfg(feature = "onnx")]
    pub fn load(config: &ModelConfig) -> Result<Self> {
        let tokenizer = KerasTokenizer::from_file(&config.tokenizer_path)?;
        let classifier =
            OnnxClassifier::load(std::path::Path::new(&config.model_path), config.input_type)?;

        info!(
            model = %config.model_path,
            tokenizer = %config.tokenizer_path,
            max_len = config.max_len,
            "Model artifacts loaded"
        );

        Ok(Self::new(
            Box::new(tokenizer),
            Box::new(classifier),
            SequenceShape::from(config),
            config.positive_index,
        ))
    }

    #[cfg(not(feature = "onnx"))]
    pub fn load(_config: &ModelConfig) -> Result<Self> {
        Err(crate::Error::artifact(
            "onnx backend not compiled in (enable the 'onnx' feature)",
        ))
    }

    pub fn shape(&self) -> &SequenceShape {
        &self.shape
    }

    /// The exact fixed-length sequence the model sees for `payload`.
    pub fn encode(&self, payload: &str) -> Vec<i64> {
        fit_sequence(&self.encoder.encode(payload), &self.shape)
    }

    pub fn score(&self, payload: &str) -> Result<f64> {
        let sequence = self.encode(payload);
        let output = self.classifier.predict(&sequence)?;
        let score = extract_score(&output, self.positive_index)?;
        trace!(score, payload_len = payload.len(), "payload scored");
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Records the sequences it is given and answers with the share of
    /// non-padding ids.
    struct RecordingClassifier {
        seen: Mutex<Vec<Vec<i64>>>,
    }

    impl Classifier for RecordingClassifier {
        fn predict(&self, sequence: &[i64]) -> Result<Vec<f32>> {
            self.seen.lock().unwrap().push(sequence.to_vec());
            let used = sequence.iter().filter(|&&id| id != 0).count();
            Ok(vec![used as f32 / sequence.len() as f32])
        }
    }

    struct FailingClassifier;

    impl Classifier for FailingClassifier {
        fn predict(&self, _sequence: &[i64]) -> Result<Vec<f32>> {
            Err(Error::inference("graph exploded"))
        }
    }

    fn tokenizer() -> KerasTokenizer {
        let options = TokenizerOptions {
            oov_token: Some("<OOV>".to_string()),
            ..Default::default()
        };
        let word_index: HashMap<String, i64> = [("<OOV>", 1), ("or", 2), ("1", 3)]
            .into_iter()
            .map(|(w, i)| (w.to_string(), i))
            .collect();
        KerasTokenizer::new(options, word_index).unwrap()
    }

    #[test]
    fn test_score_feeds_fixed_length_sequence() {
        let classifier = RecordingClassifier {
            seen: Mutex::new(Vec::new()),
        };
        let scorer = Scorer::new(
            Box::new(tokenizer()),
            Box::new(classifier),
            SequenceShape::default(),
            0,
        );

        let sequence = scorer.encode("' OR 1=1 --");
        assert_eq!(sequence.len(), 100);
        assert_eq!(&sequence[96..], &[1, 2, 3, 3]);
        assert!(sequence[..96].iter().all(|&id| id == 0));

        let score = scorer.score("' OR 1=1 --").unwrap();
        assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn test_empty_payload_scores() {
        let scorer = Scorer::new(
            Box::new(tokenizer()),
            Box::new(RecordingClassifier {
                seen: Mutex::new(Vec::new()),
            }),
            SequenceShape::default(),
            0,
        );
        assert_eq!(scorer.score("").unwrap(), 0.0);
    }

    #[test]
    fn test_classifier_failure_propagates() {
        let scorer = Scorer::new(
            Box::new(tokenizer()),
            Box::new(FailingClassifier),
            SequenceShape::default(),
            0,
        );
        assert!(matches!(scorer.score("x"), Err(Error::Inference(_))));
    }

    #[test]
    fn test_load_fails_on_missing_artifacts() {
        let config = ModelConfig {
            model_path: "/nonexistent/model.onnx".to_string(),
            tokenizer_path: "/nonexistent/tokenizer.json".to_string(),
            ..Default::default()
        };
        assert!(matches!(Scorer::load(&config), Err(Error::Artifact(_))));
    }
}
