use async_trait::async_trait;
use mockall::mock;
use sqli_sentinel::{
    Error, Result,
    gateway::ModelClient,
    inference::Classifier,
};
use std::sync::{Arc, Mutex};

mock! {
    pub Classifier {}

    impl Classifier for Classifier {
        fn predict(&self, sequence: &[i64]) -> Result<Vec<f32>>;
    }
}

/// Deterministic stand-in for a trained model: the score is the share of
/// non-padding positions, so it is always a probability and depends only
/// on the encoded sequence.
#[derive(Debug, Default)]
pub struct DensityClassifier {
    pub sequences: Arc<Mutex<Vec<Vec<i64>>>>,
}

impl DensityClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self) -> Vec<Vec<i64>> {
        self.sequences.lock().unwrap().clone()
    }
}

impl Classifier for DensityClassifier {
    fn predict(&self, sequence: &[i64]) -> Result<Vec<f32>> {
        self.sequences.lock().unwrap().push(sequence.to_vec());
        let used = sequence.iter().filter(|&&id| id != 0).count();
        Ok(vec![used as f32 / sequence.len() as f32])
    }
}

/// Scoring-service stand-in for gateway tests.
#[derive(Debug)]
pub struct MockModelClient {
    pub score: Option<f64>,
    pub payloads: Arc<Mutex<Vec<String>>>,
}

impl MockModelClient {
    pub fn scoring(score: f64) -> Self {
        Self {
            score: Some(score),
            payloads: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing() -> Self {
        Self {
            score: None,
            payloads: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.payloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelClient for MockModelClient {
    async fn score(&self, payload: &str) -> Result<f64> {
        self.payloads.lock().unwrap().push(payload.to_string());
        self.score
            .ok_or_else(|| Error::model_service("scoring service unavailable"))
    }
}
