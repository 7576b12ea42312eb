pub mod csv_source;

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use encoding_rs::Encoding;

use crate::DataError;

pub use csv_source::CsvBatchReader;

/// Where the delimited text comes from
pub enum Source {
    /// A file on disk
    Path(PathBuf),
    /// Any byte stream, e.g. an upload held in memory
    Reader(Box<dyn Read + Send>),
}

impl Source {
    /// Source backed by a file path
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Source::Path(path.into())
    }

    /// Source backed by a byte stream
    pub fn reader(reader: impl Read + Send + 'static) -> Self {
        Source::Reader(Box::new(reader))
    }

    /// Short name used in logs
    pub fn display_name(&self) -> String {
        match self {
            Source::Path(path) => path.display().to_string(),
            Source::Reader(_) => "<stream>".to_string(),
        }
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Source::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

impl From<PathBuf> for Source {
    fn from(path: PathBuf) -> Self {
        Source::Path(path)
    }
}

impl From<&Path> for Source {
    fn from(path: &Path) -> Self {
        Source::Path(path.to_path_buf())
    }
}

/// Resolve an encoding label such as `utf-8` or `latin1`.
///
/// Only ASCII-compatible encodings are accepted, since records are split on
/// delimiter bytes before their fields are decoded.
pub fn resolve_encoding(label: &str) -> Result<&'static Encoding, DataError> {
    let encoding = Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| DataError::UnsupportedEncoding(label.to_string()))?;

    if !encoding.is_ascii_compatible() {
        return Err(DataError::UnsupportedEncoding(format!(
            "{} is not ASCII-compatible",
            encoding.name()
        )));
    }

    Ok(encoding)
}
