use crate::error::{ClientError, ClientResult};
use crate::models::{DetectionEvent, Domain, EventOrigin, WireRecord};
use futures::StreamExt;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

/// Decode one WebSocket text frame into a detection.
///
/// `Ok(None)` means a well-formed message without a label (keep-alives and
/// status frames); malformed JSON is an error.
pub fn parse_feed_message(domain: Domain, text: &str) -> ClientResult<Option<DetectionEvent>> {
    let record: WireRecord = serde_json::from_str(text).map_err(|e| ClientError::Decode {
        url: format!("{} feed", domain),
        message: e.to_string(),
    })?;
    Ok(record.into_event(domain, EventOrigin::Feed))
}

/// Live detection feed of one domain
#[derive(Debug, Clone)]
pub struct FeedClient {
    domain: Domain,
    url: String,
    connect_timeout: Duration,
}

impl FeedClient {
    pub fn new(domain: Domain, url: impl Into<String>, connect_timeout: Duration) -> Self {
        Self {
            domain,
            url: url.into(),
            connect_timeout,
        }
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub async fn connect(&self) -> ClientResult<FeedConnection> {
        let connect = tokio_tungstenite::connect_async(self.url.as_str());
        let (stream, _) = tokio::time::timeout(self.connect_timeout, connect)
            .await
            .map_err(|_| ClientError::Timeout {
                url: self.url.clone(),
                secs: self.connect_timeout.as_secs(),
            })?
            .map_err(|e| self.ws_error(e.to_string()))?;

        debug!(domain = %self.domain, url = %self.url, "Feed connected");
        Ok(FeedConnection {
            domain: self.domain,
            url: self.url.clone(),
            stream,
        })
    }

    fn ws_error(&self, message: String) -> ClientError {
        ClientError::WebSocket {
            url: self.url.clone(),
            message,
        }
    }
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// An open feed subscription
pub struct FeedConnection {
    domain: Domain,
    url: String,
    stream: WsStream,
}

impl FeedConnection {
    /// Next detection on the feed. `Ok(None)` once the server closes the stream.
    pub async fn next_event(&mut self) -> ClientResult<Option<DetectionEvent>> {
        while let Some(message) = self.stream.next().await {
            let message = message.map_err(|e| ClientError::WebSocket {
                url: self.url.clone(),
                message: e.to_string(),
            })?;
            let text = match message {
                Message::Text(text) => text,
                Message::Binary(bytes) => match String::from_utf8(bytes) {
                    Ok(text) => text,
                    Err(_) => {
                        warn!(domain = %self.domain, "Skipping non-UTF-8 feed frame");
                        continue;
                    }
                },
                Message::Close(_) => return Ok(None),
                _ => continue,
            };

            match parse_feed_message(self.domain, &text) {
                Ok(Some(event)) => return Ok(Some(event)),
                Ok(None) => {}
                Err(e) => warn!(domain = %self.domain, error = %e, "Skipping malformed feed message"),
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_feed_prefers_traffic_type() {
        let event = parse_feed_message(
            Domain::Iot,
            r#"{"traffic_type": "DDoS", "attack": "Benign", "timestamp": "2024-03-01 10:00:00", "features": {"orig_bytes": 10}}"#,
        )
        .unwrap()
        .unwrap();

        assert_eq!(event.label, "DDoS");
        assert_eq!(event.origin, EventOrigin::Feed);
        assert_eq!(event.feature_f64("orig_bytes"), Some(10.0));
    }

    #[test]
    fn test_parse_feed_without_label_is_ignored() {
        assert!(parse_feed_message(Domain::Cyber, r#"{"status": "ok"}"#).unwrap().is_none());
    }

    #[test]
    fn test_parse_feed_rejects_garbage() {
        assert!(parse_feed_message(Domain::Traditional, "not json").is_err());
    }

    #[tokio::test]
    async fn test_connect_fails_fast_when_nothing_listens() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let feed = FeedClient::new(Domain::Iot, format!("ws://{}", addr), Duration::from_secs(1));
        let result = feed.connect().await;
        assert!(matches!(result, Err(ClientError::WebSocket { .. })));
    }
}
