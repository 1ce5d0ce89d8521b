#[cfg(feature = "backtrace")]
use backtrace::Backtrace;
use std::fmt::{Display, Formatter};
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// Crate-wide error. Carries a backtrace when built with the `backtrace` feature.
#[derive(Debug)]
pub struct AppError {
    reason: ErrorReason,
    #[cfg(feature = "backtrace")]
    bt: Backtrace,
}

impl AppError {
    pub(crate) fn new(reason: ErrorReason) -> Self {
        Self {
            reason,
            #[cfg(feature = "backtrace")]
            bt: Backtrace::new(),
        }
    }

    pub fn reason(&self) -> &ErrorReason {
        &self.reason
    }
}

impl<E> From<E> for AppError
where
    E: Into<ErrorReason>,
{
    fn from(reason: E) -> Self {
        Self::new(reason.into())
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", &self.reason)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.reason.source()
    }
}

#[derive(Debug, Error)]
pub enum ErrorReason {
    #[error("failed to load the configuration")]
    Config(#[from] config::ConfigError),
    #[error("IO error")]
    Io(#[from] std::io::Error),
    #[error("malformed catalog document")]
    Json(#[from] serde_json::Error),
    #[error("unsupported catalog document version {0}")]
    UnsupportedVersion(u32),
    #[error("storage quota exceeded")]
    QuotaExceeded,
    #[error("a certificate with id `{0}` already exists")]
    DuplicateId(String),
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("no certificate with id `{0}`")]
    NotFound(String),
}

impl ErrorReason {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::DuplicateId(_) | Self::MissingField(_))
    }
}
