use std::path::Path;

use anyhow::{ensure, Context};
use tract_onnx::prelude::*;

use crate::config::{ImageSize, CHANNELS};
use crate::preprocess::ImageTensor;

/// Something that turns an image tensor into one score per class.
pub trait Classifier {
    /// Declared input shape, batch axis included.
    fn input_shape(&self) -> &[usize];

    /// Number of scores produced by one inference.
    fn class_count(&self) -> usize;

    fn scores(&self, image: ImageTensor) -> TractResult<Vec<f32>>;

    /// Element count the input tensor must have.
    fn input_len(&self) -> usize {
        self.input_shape().iter().product()
    }
}

/// An optimized tract plan for an image classification network.
pub struct TractClassifier {
    plan: TypedRunnableModel<TypedModel>,
    input_shape: TVec<usize>,
    class_count: usize,
}

impl std::fmt::Debug for TractClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("TractClassifier")
            .field("input_shape", &self.input_shape)
            .field("class_count", &self.class_count)
            .finish()
    }
}

impl TractClassifier {
    /// Loads an ONNX model.
    ///
    /// When the network does not declare a fully concrete input (typically a
    /// symbolic batch axis), the input is pinned to `1x3xHxW` f32.
    pub fn load(path: impl AsRef<Path>, size: ImageSize) -> TractResult<TractClassifier> {
        let path = path.as_ref();
        let mut model = tract_onnx::onnx()
            .model_for_path(path)
            .with_context(|| format!("Parsing {}", path.display()))?;
        let declared =
            model.clone().into_typed().ok().and_then(|typed| concrete_input_shape(&typed));
        match declared {
            Some(shape) => debug!("{} declares input {:?}", path.display(), shape),
            None => {
                let shape = [1, CHANNELS, size.height, size.width];
                debug!("Pinning {} input to {:?}", path.display(), shape);
                model = model.with_input_fact(0, f32::fact(shape).into())?;
            }
        }
        TractClassifier::from_typed(model.into_typed()?)
    }

    /// Optimizes an already typed network and records its shapes.
    pub fn from_typed(model: TypedModel) -> TractResult<TractClassifier> {
        let model = model.into_optimized()?;
        let input_shape = concrete_input_shape(&model)
            .context("Model input shape is not fully determined")?;
        let output = model.output_fact(0)?;
        let class_count = output
            .shape
            .as_concrete()
            .map(|shape| shape.iter().product())
            .with_context(|| format!("Model output shape is not fully determined: {output:?}"))?;
        info!("Model input {:?}, {} classes", input_shape, class_count);
        let plan = model.into_runnable()?;
        Ok(TractClassifier { plan, input_shape, class_count })
    }
}

impl Classifier for TractClassifier {
    fn input_shape(&self) -> &[usize] {
        &self.input_shape
    }

    fn class_count(&self) -> usize {
        self.class_count
    }

    fn scores(&self, image: ImageTensor) -> TractResult<Vec<f32>> {
        ensure!(
            image.len() == self.input_len(),
            "Model expects {:?} input, image has {} values",
            self.input_shape,
            image.len()
        );
        let input = image.into_tensor(&self.input_shape)?;
        let outputs = self.plan.run(tvec!(input.into()))?;
        let scores = outputs[0].as_slice::<f32>()?.to_vec();
        trace!("Scores: {:?}", scores);
        Ok(scores)
    }
}

fn concrete_input_shape(model: &TypedModel) -> Option<TVec<usize>> {
    let fact = model.input_fact(0).ok()?;
    fact.shape.as_concrete().map(|shape| shape.iter().copied().collect())
}
