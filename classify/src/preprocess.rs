use std::path::Path;

use anyhow::{ensure, Context};
use image::imageops::FilterType;
use image::RgbImage;
use tract_onnx::prelude::*;

use crate::config::{ImageSize, Normalization, CHANNELS};

/// A normalized RGB image, planar (channel-major, CHW) layout.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageTensor {
    channels: usize,
    height: usize,
    width: usize,
    data: Vec<f32>,
}

impl ImageTensor {
    pub fn from_rgb(image: &RgbImage, normalization: Normalization) -> ImageTensor {
        let (width, height) = (image.width() as usize, image.height() as usize);
        let mut data = Vec::with_capacity(CHANNELS * height * width);
        for c in 0..CHANNELS {
            data.extend(image.pixels().map(|p| normalization.apply(c, p.0[c])));
        }
        ImageTensor { channels: CHANNELS, height, width, data }
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Builds the engine tensor, reshaped to the model's declared input shape.
    pub fn into_tensor(self, shape: &[usize]) -> TractResult<Tensor> {
        let expected: usize = shape.iter().product();
        ensure!(
            expected == self.data.len(),
            "Input shape {:?} needs {} values, image has {}",
            shape,
            expected,
            self.data.len()
        );
        Tensor::from_shape(shape, &self.data)
    }
}

/// Decodes, resizes and normalizes an image file.
pub fn load_image(
    path: impl AsRef<Path>,
    size: ImageSize,
    normalization: Normalization,
) -> TractResult<ImageTensor> {
    let path = path.as_ref();
    let width = u32::try_from(size.width).with_context(|| format!("Image width {}", size.width))?;
    let height =
        u32::try_from(size.height).with_context(|| format!("Image height {}", size.height))?;
    let image = image::open(path).with_context(|| format!("Decoding {}", path.display()))?;
    debug!("Decoded {} ({}x{})", path.display(), image.width(), image.height());
    let resized = image::imageops::resize(&image.to_rgb8(), width, height, FilterType::Triangle);
    Ok(ImageTensor::from_rgb(&resized, normalization))
}
