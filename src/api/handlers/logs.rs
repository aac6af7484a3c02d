//! Log file query endpoints.
//!
//! Logs live under `<LOG_DIR>/<type>/<type>_<YYYY-MM-DD>.log` for the three
//! streams `app`, `error` and `trade`. Both the stream and the date are
//! validated before any path is built.

use std::collections::BTreeMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Router;
use axum::routing::get;
use chrono::{DateTime, Utc};

use super::resolve_date;
use crate::api::dto::{
    ApiResponse, LogFileInfo, LogFileList, LogFilesQuery, LogFilters, LogQuery, LogQueryResult,
    LogTypeStats,
};
use crate::app_state::AppState;
use crate::auth::AuthUser;
use crate::clock;
use crate::error::ApiError;

/// Lines scanned per requested result line, counted from the end of the file.
const SCAN_FACTOR: usize = 10;

/// A queryable log stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogType {
    /// General application log.
    App,
    /// Errors only.
    Error,
    /// Trade activity.
    Trade,
}

impl LogType {
    /// Every stream, in reporting order.
    pub const ALL: [Self; 3] = [Self::App, Self::Error, Self::Trade];

    /// Directory and file-name prefix of this stream.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::App => "app",
            Self::Error => "error",
            Self::Trade => "trade",
        }
    }

    fn dir(self, root: &Path) -> PathBuf {
        root.join(self.as_str())
    }

    fn is_own_file(self, name: &str) -> bool {
        name.strip_prefix(self.as_str())
            .and_then(|rest| rest.strip_prefix('_'))
            .is_some_and(|rest| rest.ends_with(".log"))
    }
}

impl fmt::Display for LogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LogType {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                ApiError::InvalidRequest(format!(
                    "unknown log_type {s:?}; expected app, error or trade"
                ))
            })
    }
}

/// `GET /logs`: Tail one day of a log stream with optional filters.
///
/// # Errors
///
/// Returns [`ApiError::InvalidRequest`] on an unknown stream, malformed date
/// or out-of-range limit, and [`ApiError::Io`] if the file cannot be read.
#[utoipa::path(
    get,
    path = "/api/logs",
    tag = "Logs",
    summary = "Query log lines",
    params(LogQuery),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Matching lines (code 404 in body if the file is missing)", body = ApiResponse<LogQueryResult>),
        (status = 400, description = "Invalid parameters"),
        (status = 401, description = "Missing or invalid token"),
    )
)]
pub async fn query_logs(
    _user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<LogQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let log_type: LogType = query.log_type.parse()?;
    let date = resolve_date(query.date.as_deref())?;
    if !(1..=1000).contains(&query.limit) {
        return Err(ApiError::InvalidRequest(format!(
            "limit must be within 1..=1000, got {}",
            query.limit
        )));
    }
    let limit = usize::try_from(query.limit).map_err(|e| ApiError::Internal(e.to_string()))?;

    let path = log_type.dir(&state.log_dir).join(format!("{log_type}_{date}.log"));
    let filters = LogFilters {
        level: query.level,
        keyword: query.keyword,
    };

    let content = match tokio::fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "log file not found");
            return Ok(ApiResponse::with_code(
                404,
                format!("Log file not found for {log_type} on {date}"),
                LogQueryResult {
                    logs: Vec::new(),
                    total: 0,
                    log_type: log_type.to_string(),
                    date: date.to_string(),
                    filters,
                },
            ));
        }
        Err(err) => return Err(err.into()),
    };

    let logs = filter_lines(
        &content,
        filters.level.as_deref(),
        filters.keyword.as_deref(),
        limit,
    );
    Ok(ApiResponse::ok(
        "Logs retrieved successfully",
        LogQueryResult {
            total: logs.len(),
            logs,
            log_type: log_type.to_string(),
            date: date.to_string(),
            filters,
        },
    ))
}

/// `GET /logs/files`: List the files of one stream.
///
/// # Errors
///
/// Returns [`ApiError::InvalidRequest`] on an unknown stream and
/// [`ApiError::Io`] if the directory cannot be read.
#[utoipa::path(
    get,
    path = "/api/logs/files",
    tag = "Logs",
    summary = "List log files",
    params(LogFilesQuery),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Files (code 404 in body if the directory is missing)", body = ApiResponse<LogFileList>),
        (status = 400, description = "Unknown stream"),
        (status = 401, description = "Missing or invalid token"),
    )
)]
pub async fn list_log_files(
    _user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<LogFilesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let log_type: LogType = query.log_type.parse()?;
    let Some(files) = scan_dir(&state.log_dir, log_type).await? else {
        return Ok(ApiResponse::with_code(
            404,
            format!("Log directory not found for {log_type}"),
            LogFileList {
                files: Vec::new(),
                log_type: log_type.to_string(),
                total: 0,
            },
        ));
    };

    Ok(ApiResponse::ok(
        "Log files listed successfully",
        LogFileList {
            total: files.len(),
            files,
            log_type: log_type.to_string(),
        },
    ))
}

/// `GET /logs/stats`: File count and size per stream.
///
/// # Errors
///
/// Returns [`ApiError::Io`] if a log directory exists but cannot be read.
#[utoipa::path(
    get,
    path = "/api/logs/stats",
    tag = "Logs",
    summary = "Log statistics",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Per-stream statistics", body = ApiResponse<BTreeMap<String, LogTypeStats>>),
        (status = 401, description = "Missing or invalid token"),
    )
)]
pub async fn get_log_stats(
    _user: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let mut stats = BTreeMap::new();
    for log_type in LogType::ALL {
        let files = scan_dir(&state.log_dir, log_type).await?.unwrap_or_default();
        stats.insert(log_type.to_string(), summarize(&files));
    }
    Ok(ApiResponse::ok("Log statistics retrieved successfully", stats))
}

/// Scans the last `limit * SCAN_FACTOR` lines oldest to newest, keeps the
/// first `limit` matches and returns them newest first.
fn filter_lines(
    content: &str,
    level: Option<&str>,
    keyword: Option<&str>,
    limit: usize,
) -> Vec<String> {
    let level = level.map(str::to_ascii_uppercase);
    let keyword = keyword.map(str::to_lowercase);
    let lines: Vec<&str> = content.lines().collect();
    let window = lines.len().saturating_sub(limit.saturating_mul(SCAN_FACTOR));

    let mut matched: Vec<String> = lines
        .get(window..)
        .unwrap_or_default()
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .filter(|line| level.as_deref().is_none_or(|l| line.contains(l)))
        .filter(|line| {
            keyword
                .as_deref()
                .is_none_or(|k| line.to_lowercase().contains(k))
        })
        .take(limit)
        .map(str::to_string)
        .collect();
    matched.reverse();
    matched
}

/// Files of `log_type`, newest name first. `None` if the directory is absent.
async fn scan_dir(
    root: &Path,
    log_type: LogType,
) -> Result<Option<Vec<LogFileInfo>>, ApiError> {
    let mut entries = match tokio::fs::read_dir(log_type.dir(root)).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !log_type.is_own_file(&name) {
            continue;
        }
        let meta = entry.metadata().await?;
        if !meta.is_file() {
            continue;
        }
        files.push(LogFileInfo {
            name,
            size: meta.len(),
            modified: meta
                .modified()
                .ok()
                .map(|t| clock::format_iso(DateTime::<Utc>::from(t))),
        });
    }
    files.sort_by(|a, b| b.name.cmp(&a.name));
    Ok(Some(files))
}

fn summarize(files: &[LogFileInfo]) -> LogTypeStats {
    let total_size: u64 = files.iter().map(|f| f.size).sum();
    #[allow(clippy::cast_precision_loss)]
    let mb = total_size as f64 / 1024.0 / 1024.0;
    LogTypeStats {
        file_count: files.len(),
        total_size,
        total_size_mb: (mb * 100.0).round() / 100.0,
        latest_file: files.first().map(|f| f.name.clone()),
    }
}

/// Log routes, mounted under `/api/logs`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(query_logs))
        .route("/files", get(list_log_files))
        .route("/stats", get(get_log_stats))
}
