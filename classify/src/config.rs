use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, ensure, Context};

use crate::rank::TOP_K;

pub const DEFAULT_MODEL: &str = "assets/resnet50v2.onnx";
pub const DEFAULT_LABELS: &str = "assets/imagenet_classes.txt";
pub const DEFAULT_IMAGE: &str = "assets/dog.png";

/// Number of colour planes fed to the model.
pub const CHANNELS: usize = 3;

const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Everything a classification run needs to know.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub model: PathBuf,
    pub labels: PathBuf,
    pub image: PathBuf,
    pub image_size: ImageSize,
    pub normalization: Normalization,
    pub top_k: usize,
    pub softmax: bool,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            model: DEFAULT_MODEL.into(),
            labels: DEFAULT_LABELS.into(),
            image: DEFAULT_IMAGE.into(),
            image_size: ImageSize::default(),
            normalization: Normalization::default(),
            top_k: TOP_K,
            softmax: false,
        }
    }
}

/// Spatial resolution the image is resized to before inference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageSize {
    pub height: usize,
    pub width: usize,
}

impl ImageSize {
    pub fn new(height: usize, width: usize) -> ImageSize {
        ImageSize { height, width }
    }
}

impl Default for ImageSize {
    fn default() -> ImageSize {
        ImageSize::new(224, 224)
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}x{}", self.height, self.width)
    }
}

/// Parses `HxW`, or a single `N` for a square `NxN` image.
///
/// Each side must fit an image dimension (`u32`), and the whole RGB tensor
/// must be addressable.
impl FromStr for ImageSize {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<ImageSize, Self::Err> {
        let dims = s
            .split('x')
            .map(|d| {
                d.trim().parse::<u32>().with_context(|| format!("Invalid dimension in {s:?}"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let size = match dims[..] {
            [side] => ImageSize::new(side as usize, side as usize),
            [height, width] => ImageSize::new(height as usize, width as usize),
            _ => bail!("Expected HxW or N, got {:?}", s),
        };
        ensure!(size.height > 0 && size.width > 0, "Image size must be non-zero, got {}", size);
        ensure!(
            CHANNELS.checked_mul(size.height).and_then(|n| n.checked_mul(size.width)).is_some(),
            "Image size {} is too large",
            size
        );
        Ok(size)
    }
}

/// How 8-bit pixel values are mapped to the floats the model consumes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Normalization {
    /// `value / 255`
    Unit,
    /// `(value / 255 - mean[c]) / std[c]` with the ImageNet statistics.
    #[default]
    ImageNet,
}

impl Normalization {
    pub fn apply(&self, channel: usize, value: u8) -> f32 {
        let unit = value as f32 / 255.0;
        match self {
            Normalization::Unit => unit,
            Normalization::ImageNet => (unit - IMAGENET_MEAN[channel]) / IMAGENET_STD[channel],
        }
    }
}

impl fmt::Display for Normalization {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Normalization::Unit => write!(f, "unit"),
            Normalization::ImageNet => write!(f, "imagenet"),
        }
    }
}

impl FromStr for Normalization {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Normalization, Self::Err> {
        match &*s.to_ascii_lowercase() {
            "unit" => Ok(Normalization::Unit),
            "imagenet" => Ok(Normalization::ImageNet),
            _ => bail!("Unknown normalization {:?} (expected unit or imagenet)", s),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn default_matches_resnet_input() {
        let config = Config::default();
        assert_eq!(config.image_size, ImageSize::new(224, 224));
        assert_eq!(config.top_k, 5);
        assert!(!config.softmax);
    }

    #[test]
    fn parse_image_size() {
        assert_eq!("224".parse::<ImageSize>().unwrap(), ImageSize::new(224, 224));
        assert_eq!("112x96".parse::<ImageSize>().unwrap(), ImageSize::new(112, 96));
        assert!("abc".parse::<ImageSize>().is_err());
        assert!("1x2x3".parse::<ImageSize>().is_err());
        assert!("0x4".parse::<ImageSize>().is_err());
        assert_eq!(ImageSize::new(112, 96).to_string(), "112x96");
    }

    #[test]
    fn image_size_bounded_by_u32() {
        assert_eq!("4294967295x1".parse::<ImageSize>().unwrap().height, u32::MAX as usize);
        assert!("4294967296x1".parse::<ImageSize>().is_err());
        assert!("4294967295x4294967295".parse::<ImageSize>().is_err());
        assert!("99999999999999999999".parse::<ImageSize>().is_err());
    }

    #[test]
    fn parse_normalization() {
        assert_eq!("unit".parse::<Normalization>().unwrap(), Normalization::Unit);
        assert_eq!("ImageNet".parse::<Normalization>().unwrap(), Normalization::ImageNet);
        assert!("zscore".parse::<Normalization>().is_err());
    }

    #[test]
    fn normalize_pixels() {
        assert_abs_diff_eq!(Normalization::Unit.apply(0, 255), 1.0);
        assert_abs_diff_eq!(Normalization::Unit.apply(2, 0), 0.0);
        assert_abs_diff_eq!(
            Normalization::ImageNet.apply(1, 255),
            (1.0 - 0.456) / 0.224,
            epsilon = 1e-6
        );
        assert_abs_diff_eq!(Normalization::ImageNet.apply(2, 0), -0.406 / 0.225, epsilon = 1e-6);
    }
}
