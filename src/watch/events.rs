// Event system for watch mode
use crate::models::{DetectionEvent, Domain, SeverityLevel};
use ratatui::style::Color;

/// Everything the background tasks report to the watch loop
#[derive(Debug, Clone)]
pub enum WatchEvent {
    /// Latest label of a domain, from a poll, the live feed, or a failed poll's placeholder
    Detection(DetectionEvent),
    DetailsUpdated {
        domain: Domain,
        events: Vec<DetectionEvent>,
    },
    DetailsUnavailable {
        domain: Domain,
        error: String,
    },
    FeedStatus {
        domain: Domain,
        connected: bool,
    },
}

impl WatchEvent {
    pub fn domain(&self) -> Domain {
        match self {
            WatchEvent::Detection(event) => event.domain,
            WatchEvent::DetailsUpdated { domain, .. }
            | WatchEvent::DetailsUnavailable { domain, .. }
            | WatchEvent::FeedStatus { domain, .. } => *domain,
        }
    }
}

/// Terminal styling of severity levels
pub trait SeverityStyle {
    fn to_color(&self) -> Color;
    fn to_symbol(&self) -> &'static str;
}

impl SeverityStyle for SeverityLevel {
    fn to_color(&self) -> Color {
        match self {
            SeverityLevel::Critical => Color::Red,
            SeverityLevel::High => Color::LightRed,
            SeverityLevel::Medium => Color::Yellow,
            SeverityLevel::Low => Color::Cyan,
            SeverityLevel::Normal => Color::Green,
        }
    }

    fn to_symbol(&self) -> &'static str {
        match self {
            SeverityLevel::Critical => "⚡",
            SeverityLevel::High => "⚠",
            SeverityLevel::Medium => "●",
            SeverityLevel::Low => "·",
            SeverityLevel::Normal => "✓",
        }
    }
}
