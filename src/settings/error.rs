//! Settings subsystem errors.

use thiserror::Error;

use crate::settings::secret::CipherError;

#[derive(Debug, Error)]
pub enum SettingsError {
    /// Reading or writing the settings file failed.
    #[error("settings storage error: {0}")]
    Io(#[from] std::io::Error),

    /// The persisted record could not be (de)serialized.
    #[error("settings serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A secret could not be encrypted or decrypted.
    #[error("settings secret error: {0}")]
    Cipher(#[from] CipherError),

    /// The blocking settings write did not run to completion.
    #[error("settings write task failed: {0}")]
    Background(#[from] tokio::task::JoinError),

    /// The submitted form could not be bound.
    #[error("malformed submission: {0}")]
    Submission(String),
}

impl SettingsError {
    /// True for errors caused by the submitted data rather than the host.
    pub fn is_client_error(&self) -> bool {
        matches!(self, SettingsError::Submission(_))
    }
}

pub type SettingsResult<T> = Result<T, SettingsError>;
