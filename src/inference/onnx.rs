// ONNX Runtime classifier for the exported Keras model.
//
// The Keras `.h5` artifact is converted once with tf2onnx; the resulting graph
// takes a single `[batch, max_len]` input and yields `[batch, outputs]`
// probabilities (sigmoid already applied by the final layer).

use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Tensor;
use tracing::debug;

use super::classifier::Classifier;
use crate::config::InputType;
use crate::{Error, Result};

pub struct OnnxClassifier {
    // ort::Session::run takes &mut self.
    session: Mutex<Session>,
    input_type: InputType,
}

impl OnnxClassifier {
    pub fn load(model_path: &Path, input_type: InputType) -> Result<Self> {
        if !model_path.exists() {
            return Err(Error::artifact(format!(
                "Model file not found: {}",
                model_path.display()
            )));
        }

        let session = Session::builder()
            .map_err(|e| Error::artifact(format!("Failed to create ONNX session builder: {}", e)))?
            .commit_from_file(model_path)
            .map_err(|e| {
                Error::artifact(format!(
                    "Failed to load ONNX model from {}: {}",
                    model_path.display(),
                    e
                ))
            })?;

        debug!(
            "Loaded ONNX model from {} (input type {:?})",
            model_path.display(),
            input_type
        );

        Ok(Self {
            session: Mutex::new(session),
            input_type,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, sequence: &[i64]) -> Result<Vec<f32>> {
        let shape = vec![1i64, sequence.len() as i64];

        let mut session = self
            .session
            .lock()
            .map_err(|e| Error::inference(format!("Session lock poisoned: {}", e)))?;

        let outputs = match self.input_type {
            InputType::Float32 => {
                let data: Vec<f32> = sequence.iter().map(|&id| id as f32).collect();
                let tensor = Tensor::from_array((shape, data)).map_err(|e| {
                    Error::inference(format!("Failed to create input tensor: {}", e))
                })?;
                session.run(ort::inputs![tensor])
            }
            InputType::Int64 => {
                let tensor = Tensor::from_array((shape, sequence.to_vec())).map_err(|e| {
                    Error::inference(format!("Failed to create input tensor: {}", e))
                })?;
                session.run(ort::inputs![tensor])
            }
        }
        .map_err(|e| Error::inference(format!("ONNX inference failed: {}", e)))?;

        let (_shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| Error::inference(format!("Failed to extract output tensor: {}", e)))?;

        Ok(data.to_vec())
    }
}
