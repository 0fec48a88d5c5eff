// Models module
pub mod device;
pub mod domain;
pub mod event;

pub use device::{Device, ScanProgress, ScanRequest};
pub use domain::{Domain, SeverityLevel};
pub use event::{DetectionEvent, EventOrigin, FeatureValue, RawFeatures, WireRecord};
