//! Sequencing of the classification stages.
//!
//! Labels and image are loaded and checked before the model is even parsed,
//! and the image is checked against the model's declared input before any
//! inference runs. The first failure stops the run.
use std::path::Path;

use tract_onnx::prelude::TractResult;

use crate::config::Config;
use crate::errors::ClassifyError;
use crate::labels::load_labels;
use crate::model::{Classifier, TractClassifier};
use crate::preprocess::load_image;
use crate::rank::{softmax, top_k, Prediction};

/// Runs the whole pipeline with tract as the inference engine.
pub fn run(config: &Config) -> Result<Vec<Prediction>, ClassifyError> {
    run_with(config, |path| TractClassifier::load(path, config.image_size))
}

/// Runs the pipeline, loading the network with `load_model`.
pub fn run_with<C, F>(config: &Config, load_model: F) -> Result<Vec<Prediction>, ClassifyError>
where
    C: Classifier,
    F: FnOnce(&Path) -> TractResult<C>,
{
    let labels = load_labels(&config.labels);
    if labels.is_empty() {
        return Err(ClassifyError::labels(&config.labels));
    }
    info!("Loaded {} labels from {}", labels.len(), config.labels.display());

    let image = load_image(&config.image, config.image_size, config.normalization)
        .map_err(|e| ClassifyError::image(&config.image, e))?;
    info!("Loaded {} as {} {}", config.image.display(), config.image_size, config.normalization);

    let classifier =
        load_model(&config.model).map_err(|e| ClassifyError::model(&config.model, e))?;
    if image.len() != classifier.input_len() {
        return Err(ClassifyError::shape_mismatch(format!(
            "Model expects input of shape {:?} ({} values), image has {} values",
            classifier.input_shape(),
            classifier.input_len(),
            image.len()
        )));
    }
    if classifier.class_count() != labels.len() {
        return Err(ClassifyError::shape_mismatch(format!(
            "Model produces {} scores but {} has {} labels",
            classifier.class_count(),
            config.labels.display(),
            labels.len()
        )));
    }

    let mut scores = classifier.scores(image).map_err(ClassifyError::inference)?;
    debug!("Got {} scores", scores.len());
    if config.softmax {
        softmax(&mut scores).map_err(ClassifyError::ranking)?;
    }
    top_k(&scores, &labels, config.top_k).map_err(ClassifyError::ranking)
}
