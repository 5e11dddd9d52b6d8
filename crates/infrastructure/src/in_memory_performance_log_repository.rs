use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;

use smo_application::PerformanceLogRepository;
use smo_core::AppResult;
use smo_domain::{PerformanceDelta, PerformanceLog};

/// In-memory daily performance log repository.
#[derive(Debug, Default)]
pub struct InMemoryPerformanceLogRepository {
    logs: RwLock<BTreeMap<NaiveDate, PerformanceLog>>,
}

impl InMemoryPerformanceLogRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PerformanceLogRepository for InMemoryPerformanceLogRepository {
    async fn record_metrics(&self, date: NaiveDate, delta: PerformanceDelta) -> AppResult<()> {
        self.logs
            .write()
            .await
            .entry(date)
            .or_insert_with(|| PerformanceLog::empty(date))
            .accumulate(&delta);

        Ok(())
    }

    async fn list_logs(&self, from: NaiveDate, to: NaiveDate) -> AppResult<Vec<PerformanceLog>> {
        if from > to {
            return Ok(Vec::new());
        }

        Ok(self
            .logs
            .read()
            .await
            .range(from..=to)
            .map(|(_, log)| log.clone())
            .collect())
    }
}
