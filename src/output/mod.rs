// Output module
pub mod export;
pub mod table;

pub use export::{Column, columns_for, export_history_csv, history_csv};
pub use table::{
    DetailsView, DeviceReport, LatestStatusList, OutputFormat, TableType, apply_table_style_with_color,
    format_number, severity_cell,
};
