#[macro_use]
extern crate log;

use std::io::Write;
use std::path::PathBuf;
use std::process;

use clap::builder::RangedU64ValueParser;
use clap::{ArgAction, Parser};
use tract_classify::config::{DEFAULT_IMAGE, DEFAULT_LABELS, DEFAULT_MODEL};
use tract_classify::{
    pipeline, ClassifyError, Config, ImageSize, Normalization, Prediction, TOP_K,
};

/// Classify an image with a pretrained ONNX network and print the best classes.
#[derive(Parser, Debug)]
#[command(name = "classify", version)]
struct Args {
    /// ONNX model to run
    #[arg(long, env = "CLASSIFY_MODEL", default_value = DEFAULT_MODEL)]
    model: PathBuf,

    /// Class names, one per line, in model output order
    #[arg(long, env = "CLASSIFY_LABELS", default_value = DEFAULT_LABELS)]
    labels: PathBuf,

    /// Image to classify
    #[arg(long, env = "CLASSIFY_IMAGE", default_value = DEFAULT_IMAGE)]
    image: PathBuf,

    /// Resolution the image is resized to (HxW, or N for NxN)
    #[arg(long, env = "CLASSIFY_IMAGE_SIZE", default_value = "224x224")]
    image_size: ImageSize,

    /// Pixel normalization: unit or imagenet
    #[arg(long, env = "CLASSIFY_NORMALIZATION", default_value = "imagenet")]
    normalization: Normalization,

    /// Number of classes to print
    #[arg(
        long,
        env = "CLASSIFY_TOP",
        default_value_t = TOP_K,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    top: usize,

    /// Print probabilities instead of raw scores
    #[arg(long)]
    softmax: bool,

    /// Sets the level of verbosity
    #[arg(short, action = ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn config(&self) -> Config {
        Config {
            model: self.model.clone(),
            labels: self.labels.clone(),
            image: self.image.clone(),
            image_size: self.image_size,
            normalization: self.normalization,
            top_k: self.top,
            softmax: self.softmax,
        }
    }
}

fn init_logger(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = format!("classify={level},tract_classify={level}");
    let env = env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, filter);
    env_logger::Builder::from_env(env).init();
}

/// Prints the ranking to `out`, or the failure once to `err`, and returns
/// the process exit code.
fn report(
    result: Result<Vec<Prediction>, ClassifyError>,
    out: &mut impl Write,
    err: &mut impl Write,
) -> i32 {
    match result {
        Ok(predictions) => {
            for prediction in predictions {
                if let Err(e) = writeln!(out, "{prediction}") {
                    let _ = writeln!(err, "{e}");
                    return 1;
                }
            }
            0
        }
        Err(e) => {
            if let Some(source) = std::error::Error::source(&e) {
                debug!("{:?}: {:?}", e.kind(), source);
            }
            let _ = writeln!(err, "{e}");
            e.exit_code()
        }
    }
}

fn main() {
    let args = Args::parse();
    init_logger(args.verbose);
    let config = args.config();
    debug!("{:?}", config);

    let code =
        report(pipeline::run(&config), &mut std::io::stdout().lock(), &mut std::io::stderr());
    process::exit(code)
}
