use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    /// The package is not a usable `.docx` (not a ZIP, missing parts, bad encoding).
    InvalidDocx(String),
    Xml(roxmltree::Error),
    Zip(zip::result::ZipError),
    Image(image::ImageError),
    Csv(csv::Error),
    Json(serde_json::Error),
    /// A template, dataset, or image file that the operation needs does not exist.
    MissingResource(PathBuf),
    /// An operation scoped to table cells ran on a document without tables.
    NoTables,
    EmptyImagePool(PathBuf),
    UnknownProfile(String),
    Conversion(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "{}", e),
            Self::InvalidDocx(msg) => write!(f, "invalid docx: {}", msg),
            Self::Xml(e) => write!(f, "xml: {}", e),
            Self::Zip(e) => write!(f, "zip: {}", e),
            Self::Image(e) => write!(f, "image: {}", e),
            Self::Csv(e) => write!(f, "csv: {}", e),
            Self::Json(e) => write!(f, "json: {}", e),
            Self::MissingResource(path) => write!(f, "file not found: {}", path.display()),
            Self::NoTables => write!(f, "no tables found in document"),
            Self::EmptyImagePool(dir) => write!(f, "no replacement images found in {}", dir.display()),
            Self::UnknownProfile(name) => write!(f, "unknown profile '{}'", name),
            Self::Conversion(msg) => write!(f, "pdf conversion failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Xml(e) => Some(e),
            Self::Zip(e) => Some(e),
            Self::Image(e) => Some(e),
            Self::Csv(e) => Some(e),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<roxmltree::Error> for Error {
    fn from(e: roxmltree::Error) -> Self {
        Self::Xml(e)
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(e: zip::result::ZipError) -> Self {
        match e {
            zip::result::ZipError::Io(io_err) => Self::Io(io_err),
            other => Self::Zip(other),
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Self::Image(e)
    }
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(e: std::str::Utf8Error) -> Self {
        Self::InvalidDocx(e.to_string())
    }
}
