use thiserror::Error;

/// Failures talking to the detection, scan and auth services
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16, body: String },

    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("websocket error on {url}: {message}")]
    WebSocket { url: String, message: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("request to {url} timed out after {secs}s")]
    Timeout { url: String, secs: u64 },
}

impl ClientError {
    pub(crate) fn from_reqwest(url: &str, timeout_secs: u64, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else if err.is_decode() {
            ClientError::Decode {
                url: url.to_string(),
                message: err.to_string(),
            }
        } else {
            ClientError::Http {
                url: url.to_string(),
                source: err,
            }
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Timeout { .. })
    }

    /// HTTP status, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;
