// HTTP and WebSocket clients for the backend services
pub mod auth;
pub mod feed;
pub mod http;
pub mod scan;

#[cfg(test)]
pub(crate) mod testing;

pub use auth::{AuthClient, AuthOutcome, LoginRequest, RegisterRequest};
pub use feed::{FeedClient, FeedConnection, parse_feed_message};
pub use http::{DetectionClient, DetectionSource};
pub use scan::{RetryPolicy, ScanClient, ScanCompletion, validate_network_range};
