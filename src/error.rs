use thiserror::Error;

/// The single error surface exposed by this crate.
///
/// Every failure mode described in the crate's error handling design maps to
/// one of these variants; none of them carry secret material.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid secret: {0}")]
    InvalidSecret(String),

    #[error("configuration error: {0}")]
    ConfigurationError(String),

    #[error("no credential store configured")]
    StoreNotConfigured,

    #[error("credential store error: {0}")]
    StoreError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, AuthError>;
