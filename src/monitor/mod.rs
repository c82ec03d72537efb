//! Log-derived monitoring: parse the bot's log file, aggregate it, and show
//! the result as text, JSON, or an HTML page.

pub mod aggregate;
pub mod log_parser;
pub mod page;
pub mod report;
pub mod server;

pub use aggregate::{ActivityStatus, LogStats, UserMessageLine};
pub use log_parser::{DEFAULT_TAIL_LINES, LogEntry, load_tail, parse_log_line};
pub use page::{CredentialFlags, Dashboard, render_page};
pub use report::render_text;
pub use server::{MonitorState, run_monitor, run_monitor_with_listener};

use std::path::Path;

/// The log tail and the statistics computed from it.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub lines: Vec<String>,
    pub stats: LogStats,
}

impl Snapshot {
    pub async fn load(log_file: &Path, tail_lines: usize) -> anyhow::Result<Self> {
        let lines = load_tail(log_file, tail_lines).await?;
        let stats = LogStats::from_lines(lines.iter().map(String::as_str));
        Ok(Self { lines, stats })
    }
}
