use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};

/// Application-wide Result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Main application error type
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// Validation errors, including unrecognized phone number shapes
    #[error("Validation error: {0}")]
    Validation(String),

    /// Credential exchange against the Daraja token endpoint failed
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Daraja returned an explicit non-zero response code at submission
    #[error("Provider rejected request ({code}): {message}")]
    ProviderRejected { code: String, message: String },

    /// Timeout or connection failure on an outbound provider call
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Database operation errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Insert collision on the checkout request id
    #[error("Duplicate checkout request id: {0}")]
    DuplicateKey(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();

        // Internal distinctions (auth vs. network vs. provider rejection) stay
        // in the logs; the payer-facing message is deliberately generic.
        let message = match self {
            AppError::Auth(_) | AppError::ProviderRejected { .. } | AppError::Network(_) => {
                "Payment request failed. Please try again.".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(status_code).json(serde_json::json!({
            "error": {
                "message": message,
                "code": status_code.as_u16(),
            }
        }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(_) => StatusCode::BAD_GATEWAY,
            AppError::ProviderRejected { .. } => StatusCode::BAD_GATEWAY,
            AppError::Network(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::DuplicateKey(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Json(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Helper functions for common error scenarios
impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        AppError::Auth(msg.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        AppError::NotFound(resource.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }
}
