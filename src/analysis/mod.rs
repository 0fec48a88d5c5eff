// Analysis module
pub mod devices;
pub mod history;

pub use devices::{DeviceFilter, DeviceSort, DeviceStats, device_stats, select_devices};
pub use history::{
    DEFAULT_PAGE_SIZE, DistributionEntry, HistoryFilter, HistoryRecord, HistoryReport, Page, SeverityStats,
    attack_types, build_records, paginate, severity_stats, top_distribution,
};
