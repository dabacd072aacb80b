use std::fmt;
use std::path::Path;

/// Which stage of the pipeline failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Labels,
    Image,
    ShapeMismatch,
    Model,
    Inference,
    Ranking,
}

/// Failure surfaced by the pipeline driver.
///
/// Every kind is fatal: the process reports the message and exits with
/// [`ClassifyError::exit_code`].
#[derive(Debug)]
pub struct ClassifyError {
    kind: ErrorKind,
    message: String,
    source: Option<anyhow::Error>,
}

impl ClassifyError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        ClassifyError { kind, message: message.into(), source }
    }

    pub fn labels(path: &Path) -> Self {
        Self::new(ErrorKind::Labels, format!("Failed to load labels: {}", path.display()), None)
    }

    pub fn image(path: &Path, source: anyhow::Error) -> Self {
        Self::new(ErrorKind::Image, format!("Failed to load image: {}", path.display()), Some(source))
    }

    pub fn shape_mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ShapeMismatch, message, None)
    }

    pub fn model(path: &Path, source: anyhow::Error) -> Self {
        Self::new(ErrorKind::Model, format!("Failed to load model: {}", path.display()), Some(source))
    }

    /// The engine's own message is kept as is.
    pub fn inference(source: anyhow::Error) -> Self {
        Self::new(ErrorKind::Inference, format!("{source:#}"), Some(source))
    }

    pub fn ranking(source: anyhow::Error) -> Self {
        Self::new(ErrorKind::Ranking, format!("{source:#}"), Some(source))
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn exit_code(&self) -> i32 {
        1
    }
}

impl fmt::Display for ClassifyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ClassifyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_deref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}
