use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    // State-token errors
    InvalidState,

    // Upstream token-endpoint errors
    TokenExchange(String),
    TokenRefresh(String),
    TokenAcquisition(String),
    UpstreamTimeout(String),

    // Error relayed by the authorization server in a redirect
    Upstream(String),

    // Local input errors
    Validation(String),

    // Network errors
    Network(String),

    // Generic errors
    Internal(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidState => write!(f, "invalid state"),
            Error::TokenExchange(msg) => write!(f, "token exchange failed: {}", msg),
            Error::TokenRefresh(msg) => write!(f, "token refresh failed: {}", msg),
            Error::TokenAcquisition(msg) => write!(f, "token acquisition failed: {}", msg),
            Error::UpstreamTimeout(msg) => write!(f, "upstream call timed out: {}", msg),
            Error::Upstream(msg) => write!(f, "authorization server error: {}", msg),
            Error::Validation(msg) => write!(f, "invalid input: {}", msg),
            Error::Network(msg) => write!(f, "network error: {}", msg),
            Error::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Internal(e.to_string())
    }
}

// axum IntoResponse implementation
impl axum::response::IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        tracing::error!("request failed: {}", self);

        let status = match self {
            Error::InvalidState => StatusCode::INTERNAL_SERVER_ERROR,
            Error::TokenExchange(_)
            | Error::TokenRefresh(_)
            | Error::TokenAcquisition(_)
            | Error::Upstream(_)
            | Error::Network(_) => StatusCode::BAD_GATEWAY,
            Error::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, self.to_string()).into_response()
    }
}
