use serde::Deserialize;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("Not signed in, or the session has expired")]
    Unauthorized,
    #[error("Request failed with status {status}: {message}")]
    Http { status: u16, message: String },
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Could not decode the response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

const MAX_RAW_MESSAGE_LEN: usize = 200;

impl ApiError {
    /// Builds an error for a non-success response, preferring the backend's
    /// own `message` or `error` field over the raw body.
    pub fn from_status(status: u16, body: &str) -> ApiError {
        if status == 401 {
            return ApiError::Unauthorized;
        }

        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|body| body.message.or(body.error))
            .unwrap_or_else(|| {
                let raw = body.trim();
                match raw.char_indices().nth(MAX_RAW_MESSAGE_LEN) {
                    Some((cut, _)) => format!("{}...", &raw[..cut]),
                    None if raw.is_empty() => "no details".to_string(),
                    None => raw.to_string(),
                }
            });

        ApiError::Http { status, message }
    }
}
