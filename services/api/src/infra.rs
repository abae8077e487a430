use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use campus_placement::config::AuthConfig;
use campus_placement::error::AppError;
use campus_placement::workflows::jobs::Job;
use campus_placement::{MemoryStore, PlacementState};
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use tracing::{info, warn};

/// Operational state behind the health, readiness and metrics endpoints.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Fresh store with every placement service wired against it.
pub(crate) fn placement_state(auth: &AuthConfig) -> Result<PlacementState, AppError> {
    let store = Arc::new(MemoryStore::default());
    Ok(PlacementState::from_store(store, auth)?)
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct MaintenanceReport {
    pub(crate) closed_jobs: Vec<Job>,
    pub(crate) notifications_delivered: usize,
    pub(crate) notifications_pending: usize,
}

/// Close jobs whose online test has passed and retry parked notifications.
pub(crate) fn run_maintenance(
    state: &PlacementState,
    now: DateTime<Utc>,
) -> Result<MaintenanceReport, AppError> {
    let closed_jobs = state.jobs.sweep_expired(now)?;
    let flushed = state.notifications.flush_outbox();
    Ok(MaintenanceReport {
        closed_jobs,
        notifications_delivered: flushed.delivered,
        notifications_pending: flushed.remaining,
    })
}

/// Periodic maintenance for the lifetime of the server.
pub(crate) fn spawn_maintenance(
    state: PlacementState,
    every: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // the first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match run_maintenance(&state, Utc::now()) {
                Ok(report)
                    if !report.closed_jobs.is_empty() || report.notifications_delivered > 0 =>
                {
                    info!(
                        closed_jobs = report.closed_jobs.len(),
                        notifications_delivered = report.notifications_delivered,
                        notifications_pending = report.notifications_pending,
                        "maintenance pass finished"
                    );
                }
                Ok(_) => {}
                Err(error) => warn!(%error, "maintenance pass failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> AuthConfig {
        AuthConfig {
            token_secret: "maintenance-test".to_string(),
            token_ttl_hours: 1,
        }
    }

    #[test]
    fn maintenance_on_an_empty_store_is_a_no_op() {
        let state = placement_state(&auth()).expect("state");
        let report = run_maintenance(&state, Utc::now()).expect("maintenance");
        assert!(report.closed_jobs.is_empty());
        assert_eq!(report.notifications_delivered, 0);
        assert_eq!(report.notifications_pending, 0);
    }
}
