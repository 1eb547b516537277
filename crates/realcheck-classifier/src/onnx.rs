//! ONNX Runtime image classifier.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image::imageops::FilterType;
use image::DynamicImage;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::{Tensor, Value};
use tracing::{debug, info};

use crate::classifier::Classifier;
use crate::config::ClassifierConfig;
use crate::error::{ClassifierError, ClassifierResult};
use crate::handle::ClassifierLoader;

/// ImageNet channel means.
const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// ImageNet channel standard deviations.
const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Classifier running a local ONNX model.
///
/// The session is shared behind a mutex; inference runs on the blocking pool.
/// Tensors live only for one `classify` call, so `release_memory` keeps the
/// default no-op.
pub struct OnnxClassifier {
    session: Arc<Mutex<Session>>,
    config: ClassifierConfig,
}

impl OnnxClassifier {
    /// Load the model named by `config`.
    ///
    /// Returns `ModelNotFound` when the file is missing.
    pub fn new(config: ClassifierConfig) -> ClassifierResult<Self> {
        let model_path = config.model_path();
        if !model_path.exists() {
            return Err(ClassifierError::ModelNotFound(model_path));
        }

        let session = create_session(&model_path, config.intra_threads)?;
        info!(
            model_path = %model_path.display(),
            input_size = config.input_size,
            "Image classifier initialized"
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            config,
        })
    }
}

#[async_trait]
impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        "onnx"
    }

    async fn classify(&self, path: &Path) -> ClassifierResult<f64> {
        let path = path.to_path_buf();
        let session = Arc::clone(&self.session);
        let input_size = self.config.input_size;
        let output_name = self.config.output_name.clone();
        let human_index = self.config.human_class_index;

        tokio::task::spawn_blocking(move || -> ClassifierResult<f64> {
            let img = image::open(&path)?;
            let input = preprocess(&img, input_size)?;
            let logits = run_inference(&session, input, &output_name)?;
            let score = logits_to_score(&logits, human_index)?;
            debug!(path = %path.display(), score, "Image classified");
            Ok(score)
        })
        .await
        .map_err(|e| ClassifierError::internal(format!("Inference task failed: {}", e)))?
    }
}

/// Loader that builds an [`OnnxClassifier`] on first use.
pub struct OnnxLoader {
    config: ClassifierConfig,
}

impl OnnxLoader {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ClassifierLoader for OnnxLoader {
    async fn load(&self) -> ClassifierResult<Arc<dyn Classifier>> {
        let config = self.config.clone();
        let classifier = tokio::task::spawn_blocking(move || OnnxClassifier::new(config))
            .await
            .map_err(|e| ClassifierError::load(format!("Loader task failed: {}", e)))??;
        Ok(Arc::new(classifier))
    }
}

/// Create ONNX Runtime session on the CPU execution provider.
fn create_session(model_path: &Path, intra_threads: usize) -> ClassifierResult<Session> {
    let model_bytes = std::fs::read(model_path)
        .map_err(|e| ClassifierError::load(format!("Failed to read model file: {}", e)))?;

    Session::builder()
        .map_err(|e| ClassifierError::load(format!("Failed to create session builder: {}", e)))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| ClassifierError::load(format!("Failed to set optimization level: {}", e)))?
        .with_intra_threads(intra_threads)
        .map_err(|e| ClassifierError::load(format!("Failed to set intra threads: {}", e)))?
        .commit_from_memory(&model_bytes)
        .map_err(|e| ClassifierError::load(format!("Failed to load ONNX model: {}", e)))
}

/// Resize, normalize and lay out an image as a `[1, 3, H, W]` tensor.
fn preprocess(img: &DynamicImage, input_size: u32) -> ClassifierResult<Value> {
    let chw_data = to_normalized_chw(img, input_size);
    let side = input_size as usize;
    let shape = vec![1usize, 3, side, side];

    Tensor::from_array((shape, chw_data.into_boxed_slice()))
        .map(Value::from)
        .map_err(|e| ClassifierError::inference(format!("Failed to create tensor: {}", e)))
}

/// HWC RGB -> CHW with ImageNet normalization.
fn to_normalized_chw(img: &DynamicImage, input_size: u32) -> Vec<f32> {
    let rgb = img
        .resize_exact(input_size, input_size, FilterType::Triangle)
        .to_rgb8();
    let side = input_size as usize;

    let mut chw_data: Vec<f32> = Vec::with_capacity(3 * side * side);
    for c in 0..3 {
        for y in 0..input_size {
            for x in 0..input_size {
                let value = rgb.get_pixel(x, y)[c] as f32 / 255.0;
                chw_data.push((value - MEAN[c]) / STD[c]);
            }
        }
    }
    chw_data
}

fn run_inference(
    session: &Mutex<Session>,
    input: Value,
    output_name: &str,
) -> ClassifierResult<Vec<f32>> {
    let mut session = session
        .lock()
        .map_err(|_| ClassifierError::inference("Session lock poisoned"))?;

    let outputs = session
        .run(ort::inputs![input])
        .map_err(|e| ClassifierError::inference(format!("ONNX inference failed: {}", e)))?;

    let output = outputs
        .get(output_name)
        .ok_or_else(|| ClassifierError::inference(format!("Missing {} tensor", output_name)))?;

    let tensor = output
        .try_extract_tensor::<f32>()
        .map_err(|e| ClassifierError::inference(format!("Failed to extract tensor: {}", e)))?;

    Ok(tensor.1.iter().copied().collect())
}

/// Map raw model output to a `[0, 100]` human-likelihood score.
///
/// One value is a binary logit (sigmoid); more are class logits (softmax,
/// reading `human_index`).
fn logits_to_score(logits: &[f32], human_index: usize) -> ClassifierResult<f64> {
    let score = match logits {
        [] => return Err(ClassifierError::inference("Model returned an empty tensor")),
        [logit] => sigmoid(*logit as f64),
        many => {
            if human_index >= many.len() {
                return Err(ClassifierError::inference(format!(
                    "Human class index {} out of range for {} classes",
                    human_index,
                    many.len()
                )));
            }
            let max = many.iter().copied().fold(f32::NEG_INFINITY, f32::max) as f64;
            let exps: Vec<f64> = many.iter().map(|&v| (v as f64 - max).exp()).collect();
            let sum: f64 = exps.iter().sum();
            exps[human_index] / sum
        }
    };

    Ok(score * 100.0)
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
