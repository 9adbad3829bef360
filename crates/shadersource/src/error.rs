use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to resolve or retrieve a single shader source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("shader locator must not be empty")]
    EmptyLocator,
    #[error("invalid shader url '{locator}': {reason}")]
    InvalidUrl { locator: String, reason: String },
    #[error("'{0}' does not name a local file")]
    NotAFilePath(String),
    #[error("requesting {url}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("failed to read shader at {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Which half of the shader pair a fetch belonged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Vertex,
    Fragment,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Vertex => f.write_str("vertex"),
            Role::Fragment => f.write_str("fragment"),
        }
    }
}

/// Failure of the combined two-source load.
#[derive(Debug, Error)]
#[error("failed to load {role} shader source from '{locator}'")]
pub struct LoadError {
    pub role: Role,
    pub locator: String,
    #[source]
    pub source: SourceError,
}
