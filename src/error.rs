use std::path::PathBuf;

use thiserror::Error;

use crate::signature::ClassType;

/// Failures raised by resolution, the type lattice and IR construction.
#[derive(Error, Debug)]
pub enum Error {
    #[error("no class candidates for \"{0}\" found")]
    NotFound(ClassType),
    #[error(
        "multiple class candidates for \"{class_type}\" found in input locations [{}]",
        .locations.join(", ")
    )]
    AmbiguousResolution {
        class_type: ClassType,
        locations: Vec<String>,
    },
    #[error("{class_type} is a {found}, expected a {expected}")]
    TypeMismatch {
        class_type: ClassType,
        expected: &'static str,
        found: &'static str,
    },
    #[error("invalid type operation: {0}")]
    InvalidTypeOperation(String),
    #[error("malformed expression: {0}")]
    MalformedExpression(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read archive {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
    #[error("failed to decode {origin}: {message}")]
    Decode { origin: String, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn decode(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Decode {
            origin: origin.into(),
            message: message.into(),
        }
    }
}
