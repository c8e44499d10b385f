//! Built-in record consumers: durable CSV log and rolling window.

mod csv_log;
mod window;

pub use csv_log::CsvLogSink;
pub use window::{ChannelStats, RollingWindowStore, SharedWindow, WindowSink, WindowSummary};
