use serde_json::Value;
use thiserror::Error;

use crate::network::GatewayError;

/// Everything a panel operation can surface to the user.
///
/// None of these are fatal: the UI turns each one into a notice and keeps the
/// session running.
#[derive(Debug, Error)]
pub enum PanelError {
    /// Required input missing. Raised before any remote call is made.
    #[error("{0}")]
    Validation(String),

    /// The backend answered with a non-succeeded status, or could not be reached.
    #[error("{message}")]
    RemoteFailure {
        message: String,
        details: Option<Value>,
    },

    /// The backend answered, but not in a shape this call can use.
    #[error("unexpected response from `{action}` ({expected})")]
    MalformedResponse {
        action: &'static str,
        expected: &'static str,
        payload: Value,
    },
}

impl PanelError {
    pub fn remote(message: impl Into<String>, details: Option<Value>) -> Self {
        PanelError::RemoteFailure {
            message: message.into(),
            details,
        }
    }

    /// Raw payload worth showing next to the message, if any.
    pub fn details(&self) -> Option<&Value> {
        match self {
            PanelError::Validation(_) => None,
            PanelError::RemoteFailure { details, .. } => details.as_ref(),
            PanelError::MalformedResponse { payload, .. } => {
                if payload.is_null() {
                    None
                } else {
                    Some(payload)
                }
            }
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, PanelError::Validation(_))
    }
}

impl From<GatewayError> for PanelError {
    fn from(err: GatewayError) -> Self {
        PanelError::RemoteFailure {
            message: err.to_string(),
            details: None,
        }
    }
}
