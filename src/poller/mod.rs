// Periodic polling of the detection services
use crate::client::{DetectionSource, FeedClient};
use crate::models::{DetectionEvent, Domain, SeverityLevel};
use crate::watch::events::WatchEvent;
use chrono::Local;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Label and severity that stand in for a domain whose poll failed
pub fn placeholder_for(domain: Domain) -> (&'static str, SeverityLevel) {
    match domain {
        Domain::Iot => (
            "ALERT: IoT security breach detected. Connection compromised.",
            SeverityLevel::Critical,
        ),
        Domain::Cyber => (
            "WARNING: Cyber attack vectors identified. Implementing countermeasures.",
            SeverityLevel::High,
        ),
        Domain::Traditional => (
            "CAUTION: Traditional attack signature detected. Firewall engaged.",
            SeverityLevel::High,
        ),
    }
}

pub fn placeholder_event(domain: Domain) -> DetectionEvent {
    let (label, severity) = placeholder_for(domain);
    DetectionEvent::placeholder(domain, label, severity, Local::now().format("%H:%M:%S").to_string())
}

/// Fetch the latest detection of one domain. Never fails: an unreachable,
/// slow or misbehaving service yields the domain's placeholder.
pub async fn poll_latest(source: &dyn DetectionSource, domain: Domain) -> DetectionEvent {
    match source.latest(domain).await {
        Ok(event) => event,
        Err(e) => {
            warn!(%domain, error = %e, timed_out = e.is_timeout(), "Poll failed, substituting placeholder");
            placeholder_event(domain)
        }
    }
}

/// Poll every domain concurrently, in `Domain::ALL` order
pub async fn poll_all(source: &dyn DetectionSource) -> Vec<DetectionEvent> {
    join_all(Domain::ALL.map(|domain| poll_latest(source, domain))).await
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollerSettings {
    pub live_interval: Duration,
    pub history_interval: Duration,
    /// Pause before reconnecting a dropped feed
    pub feed_retry: Duration,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            live_interval: Duration::from_secs(5),
            history_interval: Duration::from_secs(10),
            feed_retry: Duration::from_secs(5),
        }
    }
}

/// Spawns one task per domain and concern. Nothing here is shared between
/// tasks except the outgoing channel.
pub struct Poller {
    source: Arc<dyn DetectionSource>,
    settings: PollerSettings,
    domains: Vec<Domain>,
    poll_details: bool,
    feeds: Vec<FeedClient>,
}

impl Poller {
    pub fn new(source: Arc<dyn DetectionSource>, settings: PollerSettings) -> Self {
        Self {
            source,
            settings,
            domains: Domain::ALL.to_vec(),
            poll_details: true,
            feeds: Vec::new(),
        }
    }

    pub fn with_domains(mut self, domains: &[Domain]) -> Self {
        self.domains = domains.to_vec();
        self
    }

    pub fn without_details(mut self) -> Self {
        self.poll_details = false;
        self
    }

    pub fn with_feed(mut self, feed: FeedClient) -> Self {
        self.feeds.push(feed);
        self
    }

    pub fn spawn(self, tx: mpsc::UnboundedSender<WatchEvent>) -> PollHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut tasks = Vec::new();

        for &domain in &self.domains {
            tasks.push(tokio::spawn(live_task(
                self.source.clone(),
                domain,
                self.settings.live_interval,
                tx.clone(),
                shutdown_rx.clone(),
            )));
            if self.poll_details {
                tasks.push(tokio::spawn(details_task(
                    self.source.clone(),
                    domain,
                    self.settings.history_interval,
                    tx.clone(),
                    shutdown_rx.clone(),
                )));
            }
        }

        for feed in self.feeds {
            tasks.push(tokio::spawn(feed_task(
                feed,
                self.settings.feed_retry,
                tx.clone(),
                shutdown_rx.clone(),
            )));
        }

        info!(tasks = tasks.len(), "Poller started");
        PollHandle {
            shutdown: shutdown_tx,
            tasks,
        }
    }
}

/// Owns the poll tasks. Dropping it stops them, in-flight requests included.
pub struct PollHandle {
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl PollHandle {
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Signal every task and wait until all have stopped
    pub async fn shutdown(mut self) {
        let _ = self.shutdown.send(true);
        for task in std::mem::take(&mut self.tasks) {
            task.abort();
            let _ = task.await;
        }
        debug!("Poller stopped");
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
        for task in &self.tasks {
            task.abort();
        }
    }
}

async fn live_task(
    source: Arc<dyn DetectionSource>,
    domain: Domain,
    every: Duration,
    tx: mpsc::UnboundedSender<WatchEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {}
        }

        let event = tokio::select! {
            _ = shutdown.changed() => break,
            event = poll_latest(source.as_ref(), domain) => event,
        };

        if tx.send(WatchEvent::Detection(event)).is_err() {
            break;
        }
    }
    debug!(%domain, "Live poll task stopped");
}

async fn details_task(
    source: Arc<dyn DetectionSource>,
    domain: Domain,
    every: Duration,
    tx: mpsc::UnboundedSender<WatchEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {}
        }

        let result = tokio::select! {
            _ = shutdown.changed() => break,
            result = source.details(domain) => result,
        };

        let message = match result {
            Ok(events) => WatchEvent::DetailsUpdated { domain, events },
            Err(e) => {
                debug!(%domain, error = %e, "Details refresh failed");
                WatchEvent::DetailsUnavailable {
                    domain,
                    error: e.to_string(),
                }
            }
        };
        if tx.send(message).is_err() {
            break;
        }
    }
    debug!(%domain, "Details task stopped");
}

async fn feed_task(
    feed: FeedClient,
    retry: Duration,
    tx: mpsc::UnboundedSender<WatchEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    let domain = feed.domain();

    'reconnect: loop {
        let connected = tokio::select! {
            _ = shutdown.changed() => break,
            result = feed.connect() => result,
        };

        match connected {
            Ok(mut connection) => {
                if tx.send(WatchEvent::FeedStatus { domain, connected: true }).is_err() {
                    break;
                }
                loop {
                    let next = tokio::select! {
                        _ = shutdown.changed() => break 'reconnect,
                        next = connection.next_event() => next,
                    };
                    match next {
                        Ok(Some(event)) => {
                            if tx.send(WatchEvent::Detection(event)).is_err() {
                                break 'reconnect;
                            }
                        }
                        Ok(None) => {
                            debug!(%domain, "Feed closed by server");
                            break;
                        }
                        Err(e) => {
                            warn!(%domain, error = %e, "Feed error");
                            break;
                        }
                    }
                }
                if tx.send(WatchEvent::FeedStatus { domain, connected: false }).is_err() {
                    break;
                }
            }
            Err(e) => debug!(%domain, error = %e, "Feed unavailable"),
        }

        tokio::select! {
            _ = shutdown.changed() => break,
            _ = tokio::time::sleep(retry) => {}
        }
    }
    debug!(%domain, "Feed task stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::SeverityClassifier;
    use crate::client::DetectionClient;
    use crate::config::ServicesConfig;
    use crate::error::{ClientError, ClientResult};
    use crate::models::EventOrigin;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted source: a fixed label per domain, `None` meaning failure
    struct FakeSource {
        labels: HashMap<Domain, Option<&'static str>>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl FakeSource {
        fn new(labels: &[(Domain, Option<&'static str>)]) -> Self {
            Self {
                labels: labels.iter().cloned().collect(),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl DetectionSource for FakeSource {
        async fn latest(&self, domain: Domain) -> ClientResult<DetectionEvent> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            match self.labels.get(&domain).copied().flatten() {
                Some(label) => Ok(DetectionEvent::new(domain, label, "12:00:00", EventOrigin::Poll)),
                None => Err(ClientError::Timeout {
                    url: format!("fake://{}", domain),
                    secs: 5,
                }),
            }
        }

        async fn details(&self, domain: Domain) -> ClientResult<Vec<DetectionEvent>> {
            match self.labels.get(&domain).copied().flatten() {
                Some(label) => Ok(vec![DetectionEvent::new(domain, label, "t", EventOrigin::Poll)]),
                None => Err(ClientError::InvalidInput("offline".to_string())),
            }
        }
    }

    fn fast_settings() -> PollerSettings {
        PollerSettings {
            live_interval: Duration::from_millis(20),
            history_interval: Duration::from_millis(20),
            feed_retry: Duration::from_millis(20),
        }
    }

    #[tokio::test]
    async fn test_failed_iot_poll_becomes_critical_placeholder() {
        let mut services = ServicesConfig::default();
        services.iot.base_url = crate::client::testing::unreachable_base_url().await;
        let client = DetectionClient::new(services, Duration::from_secs(1)).unwrap();

        let event = poll_latest(&client, Domain::Iot).await;
        assert!(event.is_placeholder());
        assert!(event.label.contains("IoT security breach"));
        assert_eq!(SeverityClassifier::default().classify_event(&event), SeverityLevel::Critical);
    }

    #[tokio::test]
    async fn test_timed_out_iot_poll_becomes_critical_placeholder() {
        let mut services = ServicesConfig::default();
        services.iot.base_url = crate::client::testing::silent_base_url().await;
        let client = DetectionClient::new(services, Duration::from_secs(1)).unwrap();

        let err = client.latest(Domain::Iot).await.unwrap_err();
        assert!(err.is_timeout());

        let started = std::time::Instant::now();
        let event = poll_latest(&client, Domain::Iot).await;
        let elapsed = started.elapsed();

        assert!(event.is_placeholder());
        assert!(event.label.contains("IoT security breach"));
        assert_eq!(SeverityClassifier::default().classify_event(&event), SeverityLevel::Critical);
        assert!(elapsed >= Duration::from_millis(900), "returned after {:?}", elapsed);
        assert!(elapsed < Duration::from_secs(3), "returned after {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_placeholders_per_domain() {
        let source = FakeSource::new(&[]);
        let events = poll_all(&source).await;
        let classifier = SeverityClassifier::default();

        let severities: Vec<SeverityLevel> = events.iter().map(|e| classifier.classify_event(e)).collect();
        assert_eq!(
            severities,
            vec![SeverityLevel::Critical, SeverityLevel::High, SeverityLevel::High]
        );
        assert!(events[1].label.starts_with("WARNING: Cyber attack vectors"));
        assert!(events[2].label.starts_with("CAUTION: Traditional attack signature"));
    }

    #[tokio::test]
    async fn test_one_failing_domain_does_not_block_others() {
        let source = Arc::new(FakeSource::new(&[
            (Domain::Iot, None),
            (Domain::Cyber, Some("DDoS")),
            (Domain::Traditional, Some("Normal")),
        ]));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = Poller::new(source, fast_settings()).without_details().spawn(tx);
        assert_eq!(handle.task_count(), 3);

        let mut seen: HashMap<Domain, DetectionEvent> = HashMap::new();
        while seen.len() < 3 {
            let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
                .await
                .unwrap()
                .unwrap();
            if let WatchEvent::Detection(event) = event {
                seen.insert(event.domain, event);
            }
        }

        assert!(seen[&Domain::Iot].is_placeholder());
        assert_eq!(seen[&Domain::Cyber].label, "DDoS");
        assert_eq!(seen[&Domain::Traditional].label, "Normal");
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_details_are_reported() {
        let source = Arc::new(FakeSource::new(&[(Domain::Cyber, Some("PortScan"))]));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = Poller::new(source, fast_settings())
            .with_domains(&[Domain::Cyber, Domain::Iot])
            .spawn(tx);

        let mut updated = false;
        let mut unavailable = false;
        while !(updated && unavailable) {
            match tokio::time::timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap() {
                WatchEvent::DetailsUpdated { domain, events } => {
                    assert_eq!(domain, Domain::Cyber);
                    assert_eq!(events[0].label, "PortScan");
                    updated = true;
                }
                WatchEvent::DetailsUnavailable { domain, .. } => {
                    assert_eq!(domain, Domain::Iot);
                    unavailable = true;
                }
                _ => {}
            }
        }
        drop(handle);
    }

    #[tokio::test]
    async fn test_shutdown_stops_in_flight_polls() {
        let mut source = FakeSource::new(&[(Domain::Iot, Some("Mirai"))]);
        source.delay = Duration::from_secs(30);
        let source = Arc::new(source);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = Poller::new(source.clone(), fast_settings())
            .with_domains(&[Domain::Iot])
            .without_details()
            .spawn(tx);

        // Let the first poll start and block
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        tokio::time::timeout(Duration::from_secs(1), handle.shutdown())
            .await
            .unwrap();
        // All senders are gone once the tasks have stopped
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_dropping_handle_closes_channel() {
        let source = Arc::new(FakeSource::new(&[(Domain::Iot, Some("Benign"))]));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = Poller::new(source, fast_settings()).spawn(tx);
        drop(handle);

        let drained = tokio::time::timeout(Duration::from_secs(1), async {
            while rx.recv().await.is_some() {}
        })
        .await;
        assert!(drained.is_ok());
    }

    #[tokio::test]
    async fn test_feed_reports_disconnected_state_only_after_connecting() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let source = Arc::new(FakeSource::new(&[]));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = Poller::new(source, fast_settings())
            .with_domains(&[])
            .with_feed(FeedClient::new(Domain::Iot, format!("ws://{}", addr), Duration::from_millis(200)))
            .spawn(tx);
        assert_eq!(handle.task_count(), 1);

        // Nothing listens, so no status change is ever reported
        let next = tokio::time::timeout(Duration::from_millis(150), rx.recv()).await;
        assert!(next.is_err());
        handle.shutdown().await;
    }
}
