use std::result;

use thiserror::Error;

pub type Result<T> = result::Result<T, MixpanelError>;

#[derive(Error, Debug)]
pub enum MixpanelError {
    #[error("invalid configuration: {0:?}")]
    InvalidConfiguration(String),
    #[error("bad request: {0:?}")]
    BadRequest(String),
    #[error("unauthorized: {0:?}")]
    Unauthorized(String),
    #[error("transport: {0:?}")]
    Transport(#[from] reqwest::Error),
    #[error("serde: {0:?}")]
    Serde(#[from] serde_json::Error),
}

impl MixpanelError {
    /// True when the validation gate produced this error before any
    /// network activity.
    pub fn is_configuration(&self) -> bool {
        matches!(self, MixpanelError::InvalidConfiguration(_))
    }
}
