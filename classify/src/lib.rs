//! Classify a single image with a pretrained convolutional network.
//!
//! The crate loads an ordered label list, turns an image into a planar
//! normalized tensor, runs it through an ONNX model with tract, and ranks the
//! resulting scores.
//!
//! ```no_run
//! use tract_classify::{Config, pipeline};
//!
//! let config = Config::default();
//! for prediction in pipeline::run(&config).unwrap() {
//!     println!("{prediction}");
//! }
//! ```
#[macro_use]
extern crate log;

pub mod config;
pub mod errors;
pub mod labels;
pub mod model;
pub mod pipeline;
pub mod preprocess;
pub mod rank;

pub use self::config::{Config, ImageSize, Normalization};
pub use self::errors::{ClassifyError, ErrorKind};
pub use self::model::{Classifier, TractClassifier};
pub use self::rank::{Prediction, TOP_K};

pub use tract_onnx::prelude::TractResult;

#[cfg(test)]
#[allow(dead_code)]
fn setup_test_logger() {
    let _ = env_logger::Builder::from_env("TRACT_LOG").try_init();
}
