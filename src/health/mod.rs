//! Upstream health checks.
//!
//! A background task probes every upstream on a fixed interval and keeps the latest snapshot
//! behind a lock. `/health` reports that snapshot; it never calls an upstream itself.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::clients::{BabbageClient, DatasetClient, UpstreamError, ZebedeeClient};
use crate::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Ok,
    Warning,
    Critical,
}

impl Status {
    pub fn http_status(self) -> StatusCode {
        match self {
            Status::Ok => StatusCode::OK,
            Status::Warning => StatusCode::TOO_MANY_REQUESTS,
            Status::Critical => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Something that can be probed for liveness.
#[async_trait]
pub trait Checker: Send + Sync {
    fn name(&self) -> &'static str;
    async fn check(&self) -> Result<(), UpstreamError>;
}

#[async_trait]
impl Checker for DatasetClient {
    fn name(&self) -> &'static str {
        self.service()
    }

    async fn check(&self) -> Result<(), UpstreamError> {
        self.check_health().await
    }
}

#[async_trait]
impl Checker for ZebedeeClient {
    fn name(&self) -> &'static str {
        self.service()
    }

    async fn check(&self) -> Result<(), UpstreamError> {
        self.check_health().await
    }
}

#[async_trait]
impl Checker for BabbageClient {
    fn name(&self) -> &'static str {
        self.service()
    }

    async fn check(&self) -> Result<(), UpstreamError> {
        self.check_health().await
    }
}

/// Latest result of one checker.
#[derive(Debug, Clone)]
struct CheckState {
    name: &'static str,
    healthy: bool,
    message: String,
    last_checked: Option<DateTime<Utc>>,
    last_success: Option<DateTime<Utc>>,
    last_failure: Option<DateTime<Utc>>,
    last_success_at: Option<Instant>,
}

impl CheckState {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            healthy: false,
            message: "not checked yet".to_string(),
            last_checked: None,
            last_success: None,
            last_failure: None,
            last_success_at: None,
        }
    }

    /// A failing check is a warning until it has been failing longer than `critical_timeout`,
    /// counted from its last success or from startup.
    fn status(&self, now: Instant, started: Instant, critical_timeout: Duration) -> Status {
        if self.healthy {
            return Status::Ok;
        }
        let since = self.last_success_at.unwrap_or(started);
        if now.saturating_duration_since(since) <= critical_timeout {
            Status::Warning
        } else {
            Status::Critical
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub name: String,
    pub status: Status,
    pub message: String,
    pub last_checked: Option<DateTime<Utc>>,
    pub last_success: Option<DateTime<Utc>>,
    pub last_failure: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: Status,
    pub version: String,
    pub start_time: DateTime<Utc>,
    pub uptime_secs: u64,
    pub checks: Vec<CheckReport>,
}

/// Upstream checkers plus their latest results.
pub struct Health {
    checkers: Vec<Arc<dyn Checker>>,
    state: RwLock<Vec<CheckState>>,
    critical_timeout: Duration,
    started: Instant,
    start_time: DateTime<Utc>,
}

impl Health {
    pub fn new(checkers: Vec<Arc<dyn Checker>>, critical_timeout: Duration) -> Self {
        let state = checkers.iter().map(|c| CheckState::new(c.name())).collect();
        Self {
            checkers,
            state: RwLock::new(state),
            critical_timeout,
            started: Instant::now(),
            start_time: Utc::now(),
        }
    }

    /// Probe every checker once and record the results.
    pub async fn run_once(&self) {
        let mut results = Vec::with_capacity(self.checkers.len());
        for checker in &self.checkers {
            results.push(checker.check().await);
        }

        let now = Utc::now();
        let now_instant = Instant::now();
        let mut state = self.state.write().await;
        for (check, result) in state.iter_mut().zip(results) {
            check.last_checked = Some(now);
            match result {
                Ok(()) => {
                    check.healthy = true;
                    check.message = format!("{} is ok", check.name);
                    check.last_success = Some(now);
                    check.last_success_at = Some(now_instant);
                }
                Err(e) => {
                    if check.healthy {
                        tracing::warn!(checker = check.name, "health check failed: {}", e);
                    }
                    check.healthy = false;
                    check.message = e.to_string();
                    check.last_failure = Some(now);
                }
            }
        }
    }

    /// Start polling on `interval`. Abort the returned handle to stop.
    pub fn start(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let health = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                health.run_once().await;
            }
        })
    }

    pub async fn report(&self) -> HealthReport {
        let now = Instant::now();
        let state = self.state.read().await;

        let checks: Vec<CheckReport> = state
            .iter()
            .map(|c| CheckReport {
                name: c.name.to_string(),
                status: c.status(now, self.started, self.critical_timeout),
                message: c.message.clone(),
                last_checked: c.last_checked,
                last_success: c.last_success,
                last_failure: c.last_failure,
            })
            .collect();

        HealthReport {
            status: checks.iter().map(|c| c.status).max().unwrap_or(Status::Ok),
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: self.start_time,
            uptime_secs: now.saturating_duration_since(self.started).as_secs(),
            checks,
        }
    }
}

/// GET /health - Aggregate upstream health.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let report = state.health.report().await;
    (report.status.http_status(), Json(report))
}
