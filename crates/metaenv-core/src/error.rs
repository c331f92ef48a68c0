use std::path::PathBuf;
use thiserror::Error;

/// Core error type for metaenv operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read options at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse options: {source}")]
    ConfigParse {
        path: Option<PathBuf>,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse {filename}: {message}")]
    Parse { filename: String, message: String },

    /// A replacement template did not compile. Templates are static, so this
    /// is a defect in the rule table rather than in the input.
    #[error("Invalid replacement template `{source_text}`: {message}")]
    Template {
        source_text: String,
        message: String,
    },

    #[error("Failed to emit {filename}: {message}")]
    Emit { filename: String, message: String },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Stable machine-readable code for JSON reports.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "METAENV_IO_ERROR",
            Self::ConfigRead { .. } => "METAENV_CONFIG_READ",
            Self::ConfigParse { .. } => "METAENV_CONFIG_PARSE",
            Self::Parse { .. } => "METAENV_PARSE_ERROR",
            Self::Template { .. } => "METAENV_TEMPLATE_ERROR",
            Self::Emit { .. } => "METAENV_EMIT_ERROR",
        }
    }
}
