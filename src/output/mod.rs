// Output module
pub mod report;
pub mod table;

pub use report::{BranchRow, CustomerRow, MenuItemRow, MetricRow, PeakHourRow};
pub use table::{AlertRow, AnomalyRow, OutputFormat, apply_table_style_with_color, summary_line};
