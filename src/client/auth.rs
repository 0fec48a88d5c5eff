use crate::client::http::build_http_client;
use crate::config::settings::join_url;
use crate::error::{ClientError, ClientResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

pub const LOGIN_GRANTED: &str = "Access granted. Initializing security protocols...";
pub const LOGIN_DENIED: &str = "Access denied. Security violation detected.";
pub const REGISTER_OK: &str = "Registration successful. Initializing user account...";
pub const REGISTER_FORBIDDEN: &str = "Access denied. Invalid admin credentials.";
pub const REGISTER_FAILED: &str = "Registration failed. Security violation detected.";

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub admin_password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct AuthResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Result of a login or registration attempt, with the text to show the operator
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AuthOutcome {
    Granted { message: String, token: Option<String> },
    Denied { message: String },
}

impl AuthOutcome {
    pub fn message(&self) -> &str {
        match self {
            AuthOutcome::Granted { message, .. } | AuthOutcome::Denied { message } => message,
        }
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, AuthOutcome::Granted { .. })
    }
}

#[derive(Debug, Clone)]
pub struct AuthClient {
    client: Client,
    base_url: String,
    timeout_secs: u64,
}

impl AuthClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ClientResult<Self> {
        Ok(Self {
            client: build_http_client(timeout)?,
            base_url: base_url.into(),
            timeout_secs: timeout.as_secs(),
        })
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> ClientResult<AuthResponse> {
        let url = join_url(&self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(&url, self.timeout_secs, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ClientError::from_reqwest(&url, self.timeout_secs, e))?;

        if !status.is_success() {
            return Err(ClientError::Status {
                url,
                status: status.as_u16(),
                body: text,
            });
        }

        // Some deployments answer with an empty body on success
        Ok(serde_json::from_str(&text).unwrap_or_default())
    }

    pub async fn login(&self, request: &LoginRequest) -> AuthOutcome {
        match self.post("/login", request).await {
            Ok(response) => {
                info!(username = %request.username, "Login accepted");
                AuthOutcome::Granted {
                    message: LOGIN_GRANTED.to_string(),
                    token: response.token,
                }
            }
            Err(e) => {
                warn!(username = %request.username, error = %e, "Login rejected");
                AuthOutcome::Denied {
                    message: server_message(&e).unwrap_or_else(|| LOGIN_DENIED.to_string()),
                }
            }
        }
    }

    pub async fn register(&self, request: &RegisterRequest) -> AuthOutcome {
        match self.post("/register", request).await {
            Ok(response) => {
                info!(username = %request.username, "Registration accepted");
                AuthOutcome::Granted {
                    message: REGISTER_OK.to_string(),
                    token: response.token,
                }
            }
            Err(e) => {
                warn!(username = %request.username, error = %e, "Registration rejected");
                let message = if e.status() == Some(403) {
                    REGISTER_FORBIDDEN
                } else {
                    REGISTER_FAILED
                };
                AuthOutcome::Denied {
                    message: message.to_string(),
                }
            }
        }
    }
}

/// The `message` field of an error response body, if there is one
fn server_message(error: &ClientError) -> Option<String> {
    match error {
        ClientError::Status { body, .. } => serde_json::from_str::<AuthResponse>(body)
            .ok()
            .and_then(|r| r.message)
            .filter(|m| !m.trim().is_empty()),
        _ => None,
    }
}
