use crate::alerts::{
    patterns::ClassifiedEvent,
    queue::{PendingAlert, PendingQueue, PushOutcome},
    thresholds::AlertSettings,
};
use crate::models::{Domain, SeverityLevel};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

/// The alert currently on screen
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveAlert {
    pub id: Uuid,
    pub domain: Domain,
    pub label: String,
    pub severity: SeverityLevel,
    /// Detection timestamp as reported by the service
    pub timestamp: String,
    pub placeholder: bool,
    pub raised_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl ActiveAlert {
    pub fn title(&self) -> &'static str {
        self.domain.alert_title()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).max(Duration::zero())
    }

    /// Banner text, cut to 50 characters
    pub fn summary(&self) -> String {
        let short: String = self.label.chars().take(50).collect();
        if self.label.chars().count() > 50 {
            format!("ALERT: {}...", short)
        } else {
            format!("ALERT: {}", short)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AggregatorState {
    Idle,
    AlertActive,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    /// Normal traffic, never alerts
    Suppressed,
    Raised(ActiveAlert),
    Queued,
    /// Same domain and label as the active alert
    Duplicate,
    /// Alert active and the pending queue refused the event
    Dropped,
}

/// Result of advancing the expiry clock
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutcome {
    pub expired: Option<ActiveAlert>,
    pub promoted: Option<ActiveAlert>,
}

/// Merges classified detections from every domain into a single alert
/// stream: at most one active alert, auto-expiring by severity, with a
/// bounded queue of pending alerts behind it.
#[derive(Debug, Clone)]
pub struct AlertAggregator {
    settings: AlertSettings,
    active: Option<ActiveAlert>,
    pending: PendingQueue,
    raised_total: u64,
}

impl AlertAggregator {
    pub fn new(settings: AlertSettings) -> Self {
        let pending = PendingQueue::new(settings.queue_capacity);
        Self {
            settings,
            active: None,
            pending,
            raised_total: 0,
        }
    }

    pub fn state(&self) -> AggregatorState {
        if self.active.is_some() {
            AggregatorState::AlertActive
        } else {
            AggregatorState::Idle
        }
    }

    pub fn active(&self) -> Option<&ActiveAlert> {
        self.active.as_ref()
    }

    pub fn pending(&self) -> &PendingQueue {
        &self.pending
    }

    pub fn raised_total(&self) -> u64 {
        self.raised_total
    }

    pub fn ingest(&mut self, classified: &ClassifiedEvent, now: DateTime<Utc>) -> IngestOutcome {
        let event = &classified.event;
        if !classified.severity.is_alerting() {
            return IngestOutcome::Suppressed;
        }

        let pending = PendingAlert {
            domain: event.domain,
            label: event.label.clone(),
            severity: classified.severity,
            timestamp: event.timestamp.clone(),
            placeholder: event.is_placeholder(),
            received_at: now,
        };

        match &self.active {
            None => {
                let alert = self.activate(pending, now);
                IngestOutcome::Raised(alert)
            }
            Some(active) if active.domain == event.domain && active.label == event.label => {
                IngestOutcome::Duplicate
            }
            Some(_) => match self.pending.push(pending) {
                PushOutcome::Queued | PushOutcome::Refreshed => IngestOutcome::Queued,
                PushOutcome::Evicted(evicted) => {
                    debug!(domain = %evicted.domain, label = %evicted.label, "Evicted pending alert");
                    IngestOutcome::Queued
                }
                PushOutcome::Rejected => IngestOutcome::Dropped,
            },
        }
    }

    /// Expire the active alert if its time is up and promote the next pending one
    pub fn tick(&mut self, now: DateTime<Utc>) -> TickOutcome {
        let expired = match &self.active {
            Some(active) if active.is_expired(now) => self.active.take(),
            _ => None,
        };

        if let Some(alert) = &expired {
            debug!(domain = %alert.domain, severity = %alert.severity, "Alert expired");
        }

        let promoted = if self.active.is_none() {
            self.promote_next(now)
        } else {
            None
        };

        TickOutcome { expired, promoted }
    }

    /// Operator dismissal. Returns the dismissed alert; the next pending one
    /// (if any) becomes active immediately.
    pub fn dismiss(&mut self, now: DateTime<Utc>) -> Option<ActiveAlert> {
        let dismissed = self.active.take();
        if dismissed.is_some() {
            self.promote_next(now);
        }
        dismissed
    }

    fn promote_next(&mut self, now: DateTime<Utc>) -> Option<ActiveAlert> {
        let next = self.pending.pop_next()?;
        Some(self.activate(next, now))
    }

    fn activate(&mut self, pending: PendingAlert, now: DateTime<Utc>) -> ActiveAlert {
        let alert = ActiveAlert {
            id: Uuid::new_v4(),
            domain: pending.domain,
            label: pending.label,
            severity: pending.severity,
            timestamp: pending.timestamp,
            placeholder: pending.placeholder,
            raised_at: now,
            expires_at: now + self.settings.expiry_for(pending.severity),
        };
        self.raised_total += 1;
        info!(
            domain = %alert.domain,
            severity = %alert.severity,
            label = %alert.label,
            "Alert raised"
        );
        self.active = Some(alert.clone());
        alert
    }
}

impl Default for AlertAggregator {
    fn default() -> Self {
        Self::new(AlertSettings::default())
    }
}
