use crate::client::http::build_http_client;
use crate::config::settings::join_url;
use crate::error::{ClientError, ClientResult};
use crate::models::{Device, ScanProgress, ScanRequest};
use regex::Regex;
use reqwest::{Client, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub const DEFAULT_NETWORK_RANGE: &str = "192.168.8.0/24";
pub const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);
pub const SCAN_TIMEOUT: Duration = Duration::from_secs(300);

const CIDR_PATTERN: &str = r"^(\d{1,3})\.(\d{1,3})\.(\d{1,3})\.(\d{1,3})/(\d{1,2})$";

/// Validate and normalise an IPv4 CIDR range such as `192.168.8.0/24`
pub fn validate_network_range(range: &str) -> ClientResult<String> {
    let range = range.trim();
    if range.is_empty() {
        return Err(ClientError::InvalidInput("Network range is required".to_string()));
    }

    let invalid = || ClientError::InvalidInput(format!("Invalid network range '{}'. Expected CIDR like 192.168.8.0/24", range));
    let re = Regex::new(CIDR_PATTERN).map_err(|e| ClientError::InvalidInput(format!("Failed to create regex: {}", e)))?;
    let captures = re.captures(range).ok_or_else(invalid)?;

    for octet in 1..=4 {
        let value: u32 = captures[octet].parse().map_err(|_| invalid())?;
        if value > 255 {
            return Err(invalid());
        }
    }
    let prefix: u32 = captures[5].parse().map_err(|_| invalid())?;
    if prefix > 32 {
        return Err(invalid());
    }

    Ok(range.to_string())
}

/// Attempts and exponential backoff for scan-service requests
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub attempts: u32,
    /// Delay after failed attempt `n` (1-based) is `base_delay * 2^n`
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

/// Terminal state of a tracked scan
#[derive(Debug, Clone, PartialEq)]
pub enum ScanCompletion {
    Finished(ScanProgress),
    TimedOut(ScanProgress),
}

/// Client for the device-scan service
#[derive(Debug, Clone)]
pub struct ScanClient {
    client: Client,
    base_url: String,
    timeout_secs: u64,
    retry: RetryPolicy,
}

impl ScanClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ClientResult<Self> {
        Ok(Self {
            client: build_http_client(timeout)?,
            base_url: base_url.into(),
            timeout_secs: timeout.as_secs(),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn request<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = join_url(&self.base_url, path);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.send_once(method.clone(), &url, body).await {
                Ok(value) => return Ok(value),
                Err(e @ ClientError::InvalidInput(_)) => return Err(e),
                Err(e) if attempt >= self.retry.attempts => return Err(e),
                Err(e) => {
                    let delay = self.retry.delay_after(attempt);
                    warn!(url = %url, attempt, error = %e, "Scan request failed, retrying in {:?}", delay);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn send_once<B, T>(&self, method: Method, url: &str, body: Option<&B>) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self.client.request(method, url).header("Accept", "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(url, self.timeout_secs, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::from_reqwest(url, self.timeout_secs, e))
    }

    /// Ask the service to scan `range`. Returns whatever acknowledgement it sends.
    pub async fn start_scan(&self, range: &str) -> ClientResult<serde_json::Value> {
        let network_range = validate_network_range(range)?;
        info!(%network_range, "Starting device scan");
        let request = ScanRequest { network_range };
        self.request(Method::POST, "/scan", Some(&request)).await
    }

    pub async fn progress(&self) -> ClientResult<ScanProgress> {
        self.request::<(), _>(Method::GET, "/scan/progress", None).await
    }

    pub async fn results(&self) -> ClientResult<Vec<Device>> {
        let devices: Vec<Device> = self.request::<(), _>(Method::GET, "/scan-results", None).await?;
        debug!(count = devices.len(), "Fetched scan results");
        Ok(devices)
    }

    /// Poll progress every `interval` until the scan stops or `limit` elapses.
    /// `on_progress` sees every update.
    pub async fn wait_for_completion<F>(&self, interval: Duration, limit: Duration, mut on_progress: F) -> ClientResult<ScanCompletion>
    where
        F: FnMut(&ScanProgress),
    {
        let deadline = Instant::now() + limit;
        let mut ticker = tokio::time::interval(interval);
        let mut last = ScanProgress::default();

        loop {
            ticker.tick().await;
            if Instant::now() >= deadline {
                warn!(progress = last.progress, "Scan timeout - operation took too long");
                return Ok(ScanCompletion::TimedOut(last));
            }

            let progress = self.progress().await?;
            on_progress(&progress);
            if !progress.scanning {
                return Ok(ScanCompletion::Finished(ScanProgress {
                    progress: 100.0,
                    scanning: false,
                }));
            }
            last = progress;
        }
    }
}
