// Live security dashboard
pub mod dashboard;
pub mod events;
pub mod watch_mode;

pub use dashboard::{ActivityEntry, Dashboard, DashboardState, DomainPanel, KeyAction};
pub use events::{SeverityStyle, WatchEvent};
pub use watch_mode::{WatchMode, build_poller};
