use crate::config::ServicesConfig;
use crate::error::{ClientError, ClientResult};
use crate::models::event::{AttackDetailsResponse, AttackLabel, LatestAttackResponse, LogsResponse, cicids_attack_name};
use crate::models::{DetectionEvent, Domain, EventOrigin};
use async_trait::async_trait;
use chrono::Local;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, trace};

/// Read side of a detection service, the seam the poller is written against
#[async_trait]
pub trait DetectionSource: Send + Sync {
    async fn latest(&self, domain: Domain) -> ClientResult<DetectionEvent>;

    async fn details(&self, domain: Domain) -> ClientResult<Vec<DetectionEvent>>;
}

pub(crate) fn build_http_client(timeout: Duration) -> ClientResult<Client> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()
        .map_err(|e| ClientError::InvalidInput(format!("failed to build HTTP client: {}", e)))
}

pub(crate) async fn get_json<T: DeserializeOwned>(client: &Client, url: &str, timeout_secs: u64) -> ClientResult<T> {
    trace!(url, "GET");
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ClientError::from_reqwest(url, timeout_secs, e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ClientError::Status {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    let text = response
        .text()
        .await
        .map_err(|e| ClientError::from_reqwest(url, timeout_secs, e))?;

    serde_json::from_str(&text).map_err(|e| {
        let preview: String = text.chars().take(200).collect();
        ClientError::Decode {
            url: url.to_string(),
            message: format!("{} (body: {})", e, preview),
        }
    })
}

/// HTTP client for the three detection services
#[derive(Debug, Clone)]
pub struct DetectionClient {
    client: Client,
    services: ServicesConfig,
    timeout_secs: u64,
}

impl DetectionClient {
    pub fn new(services: ServicesConfig, timeout: Duration) -> ClientResult<Self> {
        Ok(Self {
            client: build_http_client(timeout)?,
            services,
            timeout_secs: timeout.as_secs(),
        })
    }

    pub fn services(&self) -> &ServicesConfig {
        &self.services
    }

    /// Full attack history of a domain, oldest first as served
    pub async fn logs(&self, domain: Domain) -> ClientResult<Vec<DetectionEvent>> {
        let url = self.services.domain(domain).logs_url();
        let response: LogsResponse = get_json(&self.client, &url, self.timeout_secs).await?;
        let total = response.logs.len();
        let events: Vec<DetectionEvent> = response
            .logs
            .into_iter()
            .filter_map(|record| record.into_event(domain, EventOrigin::History))
            .collect();
        debug!(%domain, total, kept = events.len(), "Fetched attack logs");
        Ok(events)
    }
}

#[async_trait]
impl DetectionSource for DetectionClient {
    async fn latest(&self, domain: Domain) -> ClientResult<DetectionEvent> {
        let url = self.services.domain(domain).latest_url();
        let response: LatestAttackResponse = get_json(&self.client, &url, self.timeout_secs).await?;

        // A missing label means nothing to report, which classifies as normal
        let label = match response.attack {
            Some(AttackLabel::Name(name)) => name,
            Some(AttackLabel::Code(code)) if domain == Domain::Cyber => cicids_attack_name(code)
                .map(str::to_string)
                .unwrap_or_else(|| code.to_string()),
            Some(AttackLabel::Code(code)) => code.to_string(),
            None => String::new(),
        };
        let timestamp = response
            .timestamp
            .unwrap_or_else(|| Local::now().format("%H:%M:%S").to_string());

        Ok(DetectionEvent::new(domain, label, timestamp, EventOrigin::Poll))
    }

    async fn details(&self, domain: Domain) -> ClientResult<Vec<DetectionEvent>> {
        let url = self.services.domain(domain).details_url();
        let response: AttackDetailsResponse = get_json(&self.client, &url, self.timeout_secs).await?;
        Ok(response
            .attacks
            .into_iter()
            .filter_map(|record| record.into_event(domain, EventOrigin::Poll))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::{one_shot_server, unreachable_base_url};

    fn services_for(domain: Domain, base_url: String) -> ServicesConfig {
        let mut services = ServicesConfig::default();
        match domain {
            Domain::Iot => services.iot.base_url = base_url,
            Domain::Cyber => services.cyber.base_url = base_url,
            Domain::Traditional => services.traditional.base_url = base_url,
        }
        services
    }

    #[tokio::test]
    async fn test_latest_parses_label() {
        let base = one_shot_server("200 OK", r#"{"attack": "Mirai Botnet", "timestamp": "12:00:00"}"#).await;
        let client = DetectionClient::new(services_for(Domain::Iot, base), Duration::from_secs(2)).unwrap();

        let event = client.latest(Domain::Iot).await.unwrap();
        assert_eq!(event.label, "Mirai Botnet");
        assert_eq!(event.timestamp, "12:00:00");
        assert_eq!(event.origin, EventOrigin::Poll);
    }

    #[tokio::test]
    async fn test_latest_maps_numeric_cicids_code() {
        let base = one_shot_server("200 OK", r#"{"attack": 10}"#).await;
        let client = DetectionClient::new(services_for(Domain::Cyber, base), Duration::from_secs(2)).unwrap();

        let event = client.latest(Domain::Cyber).await.unwrap();
        assert_eq!(event.label, "PortScan");
        assert!(!event.timestamp.is_empty());
    }

    #[tokio::test]
    async fn test_details_and_status_errors() {
        let base = one_shot_server(
            "200 OK",
            r#"{"attacks": [{"attack": "DDoS", "timestamp": "t1", "features": {"duration": 3}}, {"timestamp": "t2"}]}"#,
        )
        .await;
        let client = DetectionClient::new(services_for(Domain::Iot, base), Duration::from_secs(2)).unwrap();
        let events = client.details(Domain::Iot).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].feature_f64("duration"), Some(3.0));

        let base = one_shot_server("500 Internal Server Error", r#"{"error": "boom"}"#).await;
        let client = DetectionClient::new(services_for(Domain::Iot, base), Duration::from_secs(2)).unwrap();
        let err = client.details(Domain::Iot).await.unwrap_err();
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn test_logs_reject_malformed_body() {
        let base = one_shot_server("200 OK", r#"{"rows": []}"#).await;
        let client = DetectionClient::new(services_for(Domain::Traditional, base), Duration::from_secs(2)).unwrap();
        let err = client.logs(Domain::Traditional).await.unwrap_err();
        assert!(matches!(err, ClientError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_an_error() {
        let base = unreachable_base_url().await;
        let client = DetectionClient::new(services_for(Domain::Iot, base), Duration::from_secs(1)).unwrap();
        assert!(client.latest(Domain::Iot).await.is_err());
    }
}
