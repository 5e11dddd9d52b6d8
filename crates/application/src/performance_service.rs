use std::sync::Arc;

use chrono::NaiveDate;

use smo_core::AppResult;
use smo_domain::{AuditAction, PerformanceDelta, PerformanceReport, ReportPeriod};

use crate::manifest_ports::{Clock, PerformanceLogRepository};

/// Application service for daily performance counters.
#[derive(Clone)]
pub struct PerformanceService {
    repository: Arc<dyn PerformanceLogRepository>,
    clock: Arc<dyn Clock>,
}

impl PerformanceService {
    /// Creates a performance service.
    #[must_use]
    pub fn new(repository: Arc<dyn PerformanceLogRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Records one successful board operation against today's row.
    pub async fn record_action(&self, action: &AuditAction, user: &str) -> AppResult<()> {
        let now = self.clock.now();
        self.record(PerformanceDelta::for_action(action, user, now))
            .await
    }

    /// Accumulates an arbitrary delta into the row of its local day.
    pub async fn record(&self, delta: PerformanceDelta) -> AppResult<()> {
        self.repository
            .record_metrics(delta.recorded_at.date(), delta)
            .await
    }

    /// Builds the report for the window of `period` around `date`.
    pub async fn report(&self, period: ReportPeriod, date: NaiveDate) -> AppResult<PerformanceReport> {
        let (from, to) = period.range(date);
        let logs = self.repository.list_logs(from, to).await?;

        Ok(PerformanceReport::aggregate(period, date, logs))
    }
}
