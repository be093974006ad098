use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("could not read catalog `{path}`: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("malformed catalog row {row}: {message}")]
    MalformedRow { row: u64, message: String },
    #[error("catalog is empty")]
    EmptyCatalog,
    #[error("catalog is missing required column `{0}`")]
    MissingColumn(&'static str),
}

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact not found: `{path}`")]
    Missing { path: PathBuf },
    #[error("artifact `{blob}` is corrupt: {reason}")]
    Corrupt { blob: &'static str, reason: String },
    #[error("artifact io failure at `{path}`: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("could not encode artifact `{blob}`: {source}")]
    Encode { blob: &'static str, source: serde_json::Error },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("product `{name}` not found in index")]
    NotFound { name: String },
}

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error(transparent)]
    Query(#[from] QueryError),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String },
    #[error("not found: {message}")]
    NotFound { message: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String },
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "The catalog could not be processed. Check the input file.",
            Self::NotFound { .. } => "Product not found.",
            Self::ServiceUnavailable { .. } => {
                "The recommendation index is unavailable. Run a build first."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest { message }
            | Self::NotFound { message }
            | Self::ServiceUnavailable { message }
            | Self::Internal { message } => message,
        }
    }
}

impl ApplicationError {
    /// Stable machine-readable class used in command payloads.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Data(DataError::Io { .. }) => "data_io",
            Self::Data(_) => "data_validation",
            Self::Artifact(ArtifactError::Missing { .. }) => "artifact_missing",
            Self::Artifact(ArtifactError::Corrupt { .. }) => "artifact_corrupt",
            Self::Artifact(_) => "artifact_io",
            Self::Query(QueryError::NotFound { .. }) => "not_found",
        }
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let message = value.to_string();
        match value {
            ApplicationError::Data(_) => Self::BadRequest { message },
            ApplicationError::Query(QueryError::NotFound { .. }) => Self::NotFound { message },
            ApplicationError::Artifact(ArtifactError::Missing { .. })
            | ApplicationError::Artifact(ArtifactError::Corrupt { .. }) => {
                Self::ServiceUnavailable { message }
            }
            ApplicationError::Artifact(_) => Self::Internal { message },
        }
    }
}
