use std::io::BufRead;
use std::path::Path;

/// Loads one class name per line, in class index order.
///
/// Any read failure yields an empty list: callers are expected to check for
/// emptiness and report the path themselves.
pub fn load_labels(path: impl AsRef<Path>) -> Vec<String> {
    let path = path.as_ref();
    match fs_err::File::open(path).map(std::io::BufReader::new).and_then(read_labels) {
        Ok(labels) => {
            debug!("Read {} labels from {}", labels.len(), path.display());
            labels
        }
        Err(e) => {
            warn!("{e}");
            vec![]
        }
    }
}

pub fn read_labels(reader: impl BufRead) -> std::io::Result<Vec<String>> {
    reader.lines().collect()
}
