use serde::Serialize;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Every failure the API client, the backends and the controllers report.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("{0}")]
    Rejected(String),

    #[error("Not authenticated")]
    NotAuthenticated,
}

impl ApiError {
    pub fn rejected(message: impl Into<String>) -> Self {
        ApiError::Rejected(message.into())
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Http { status: 401, .. } | ApiError::NotAuthenticated)
    }

    /// Raw message as the server (or mock) phrased it.
    pub fn message(&self) -> String {
        match self {
            ApiError::Http { message, .. } => message.clone(),
            ApiError::Rejected(message) => message.clone(),
            other => other.to_string(),
        }
    }

    /// Status-specific text for screens that show HTTP failures directly.
    pub fn status_hint(&self) -> Option<&'static str> {
        match self.status()? {
            401 => Some("Authentication required. Please refresh the page and try again."),
            404 => Some("Service temporarily unavailable. Please try again later."),
            500 => Some("Server error. Please try again later or contact support."),
            _ => None,
        }
    }
}

const GENERIC_MESSAGE: &str = "An unexpected error occurred. Please try again.";

/// Known backend phrases and what the patient sees instead.
const FRIENDLY_MESSAGES: &[(&str, &str)] = &[
    (
        "Network error",
        "Unable to connect to the server. Please check your internet connection.",
    ),
    ("Invalid email", "Please enter a valid email address."),
    ("Invalid phone", "Please enter a valid 10-digit phone number."),
    (
        "Slot not available",
        "This time slot is no longer available. Please select another time.",
    ),
    (
        "Appointment conflict",
        "You already have an appointment at this time.",
    ),
];

pub fn friendly_message(err: &ApiError) -> String {
    let key = match err {
        ApiError::Network(_) => "Network error".to_string(),
        other => other.message(),
    };
    FRIENDLY_MESSAGES
        .iter()
        .find(|(raw, _)| *raw == key)
        .map(|(_, friendly)| friendly.to_string())
        .unwrap_or_else(|| GENERIC_MESSAGE.to_string())
}

/// Wire shape `{ success, data?, error? }`, used for `--json` output.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> From<ApiResult<T>> for ApiResponse<T> {
    fn from(result: ApiResult<T>) -> Self {
        match result {
            Ok(data) => ApiResponse {
                success: true,
                data: Some(data),
                error: None,
            },
            Err(e) => ApiResponse {
                success: false,
                data: None,
                error: Some(e.message()),
            },
        }
    }
}
