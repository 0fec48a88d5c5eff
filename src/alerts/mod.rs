pub mod patterns;
pub mod queue;
pub mod system;
pub mod thresholds;

pub use patterns::{ClassifiedEvent, ClassifierConfig, KeywordTable, SeverityClassifier};
pub use queue::{PendingAlert, PendingQueue, PushOutcome};
pub use system::{ActiveAlert, AggregatorState, AlertAggregator, IngestOutcome, TickOutcome};
pub use thresholds::AlertSettings;
