// Core watch mode implementation
use anyhow::{Context, Result};
use chrono::Utc;
use crossterm::event::{self, Event};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{info, warn};

use crate::alerts::SeverityClassifier;
use crate::client::{DetectionClient, FeedClient};
use crate::config::Config;
use crate::models::Domain;
use crate::poller::{Poller, PollerSettings};
use crate::utils::date_format::parse_timezone;
use crate::watch::{Dashboard, DashboardState, KeyAction};

/// Assemble the poller for every domain, with a live feed where one is configured
pub fn build_poller(config: &Config) -> Result<Poller> {
    let timeout = Duration::from_secs(config.polling.request_timeout_secs);
    let client = DetectionClient::new(config.services.clone(), timeout)
        .context("Failed to create detection client")?;

    let settings = PollerSettings {
        live_interval: Duration::from_secs(config.polling.live_interval_secs),
        history_interval: Duration::from_secs(config.polling.history_interval_secs),
        feed_retry: Duration::from_secs(config.polling.live_interval_secs),
    };

    let mut poller = Poller::new(Arc::new(client), settings);
    for domain in Domain::ALL {
        if let Some(url) = &config.services.domain(domain).ws_url {
            poller = poller.with_feed(FeedClient::new(domain, url.clone(), timeout));
        }
    }
    Ok(poller)
}

pub struct WatchMode {
    config: Config,
    state: DashboardState,
    refresh_rate: Duration,
}

impl WatchMode {
    pub fn new(config: Config, refresh_rate_ms: u64) -> Result<Self> {
        let timezone = parse_timezone(&config.timezone.timezone)?;
        let classifier = SeverityClassifier::new(&config.classifier);
        let state = DashboardState::new(classifier, config.alerts.clone(), timezone);

        Ok(WatchMode {
            config,
            state,
            refresh_rate: Duration::from_millis(refresh_rate_ms.max(50)),
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        let (event_sender, mut event_receiver) = mpsc::unbounded_channel();
        let handle = build_poller(&self.config)?.spawn(event_sender);

        let mut dashboard = Dashboard::new().context("Failed to initialize terminal")?;
        let result = self.event_loop(&mut dashboard, &mut event_receiver).await;

        handle.shutdown().await;
        dashboard.cleanup()?;
        info!(alerts = self.state.aggregator().raised_total(), "Watch mode stopped");
        result
    }

    async fn event_loop(
        &mut self,
        dashboard: &mut Dashboard,
        event_receiver: &mut mpsc::UnboundedReceiver<crate::watch::WatchEvent>,
    ) -> Result<()> {
        let mut refresh_timer = interval(self.refresh_rate);

        loop {
            tokio::select! {
                Some(watch_event) = event_receiver.recv() => {
                    self.state.apply(watch_event, Utc::now());
                }

                _ = refresh_timer.tick() => {
                    let now = Utc::now();
                    self.state.tick(now);

                    if !self.state.paused {
                        dashboard.draw(&self.state, now)?;
                    }

                    // Check for keyboard input with a short timeout
                    if event::poll(Duration::from_millis(10))? {
                        match event::read()? {
                            Event::Key(key) => {
                                if self.state.handle_key(key, now) == KeyAction::Quit {
                                    break;
                                }
                            }
                            Event::Resize(_, _) => {
                                if let Err(e) = dashboard.clear() {
                                    warn!(error = %e, "Failed to clear terminal after resize");
                                }
                            }
                            _ => {}
                        }
                    }
                }
            }
        }

        Ok(())
    }
}
