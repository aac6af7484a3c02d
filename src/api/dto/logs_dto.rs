//! DTOs for the `/api/logs` endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::trades_dto::default_limit;

/// Query parameters of `GET /api/logs`.
#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
pub struct LogQuery {
    /// Log stream: `app`, `error` or `trade`. Defaults to `app`.
    #[serde(default = "default_log_type")]
    pub log_type: String,
    /// Day (`YYYY-MM-DD`), defaults to today.
    pub date: Option<String>,
    /// Level substring filter, e.g. `ERROR`.
    pub level: Option<String>,
    /// Case-insensitive keyword filter.
    pub keyword: Option<String>,
    /// Maximum lines, 1..=1000. Defaults to 100.
    #[serde(default = "default_limit")]
    pub limit: u32,
}

/// Query parameters of `GET /api/logs/files`.
#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
pub struct LogFilesQuery {
    /// Log stream: `app`, `error` or `trade`. Defaults to `app`.
    #[serde(default = "default_log_type")]
    pub log_type: String,
}

fn default_log_type() -> String {
    "app".to_string()
}

/// Filters echoed back with a log query.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LogFilters {
    /// Level filter applied.
    pub level: Option<String>,
    /// Keyword filter applied.
    pub keyword: Option<String>,
}

/// Result of `GET /api/logs`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LogQueryResult {
    /// Matching lines, newest first.
    pub logs: Vec<String>,
    /// Number of lines returned.
    pub total: usize,
    /// Queried stream.
    pub log_type: String,
    /// Queried day.
    pub date: String,
    /// Applied filters.
    pub filters: LogFilters,
}

/// One log file on disk.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LogFileInfo {
    /// File name.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time.
    pub modified: Option<String>,
}

/// Result of `GET /api/logs/files`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LogFileList {
    /// Files, newest name first.
    pub files: Vec<LogFileInfo>,
    /// Listed stream.
    pub log_type: String,
    /// Number of files.
    pub total: usize,
}

/// Per-stream statistics of `GET /api/logs/stats`.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct LogTypeStats {
    /// Number of log files.
    pub file_count: usize,
    /// Combined size in bytes.
    pub total_size: u64,
    /// Combined size in MiB, two decimals.
    pub total_size_mb: f64,
    /// Newest file name.
    pub latest_file: Option<String>,
}
