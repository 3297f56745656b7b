use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PortalError {
    #[error("Request to the ERP failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("The ERP answered {status} for {resource}")]
    Status {
        resource: String,
        status: StatusCode,
    },

    #[error("No authenticated session; log in first")]
    NotAuthenticated,

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Session store failure: {0}")]
    Store(String),
}

impl PortalError {
    pub(crate) fn auth(reason: &str) -> Self {
        PortalError::Auth(reason.to_string())
    }

    /// True for failures of the HTTP exchange itself (network or non-2xx).
    pub fn is_transport(&self) -> bool {
        matches!(self, PortalError::Request(_) | PortalError::Status { .. })
    }
}

pub type Result<T> = std::result::Result<T, PortalError>;
