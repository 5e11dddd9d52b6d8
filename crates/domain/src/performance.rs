use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use smo_core::AppError;

use crate::audit::AuditAction;

/// Action counters tracked per day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionCounter {
    /// Manifest registrations.
    Registration,
    /// Data edits.
    Edit,
    /// Cancellations.
    Cancellation,
    /// Voided cancellations.
    Void,
    /// Operator logins.
    Login,
    /// Operator logoffs.
    Logoff,
}

impl ActionCounter {
    /// Returns the counter bumped by an audit action, if any.
    #[must_use]
    pub fn for_action(action: &AuditAction) -> Option<Self> {
        match action {
            AuditAction::Registration => Some(Self::Registration),
            AuditAction::DataEdit => Some(Self::Edit),
            AuditAction::Cancellation => Some(Self::Cancellation),
            AuditAction::Void => Some(Self::Void),
            AuditAction::StatusUpdate | AuditAction::Delivery | AuditAction::Other(_) => None,
        }
    }
}

/// Per-action totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCounts {
    /// Registrations.
    pub registrations: u64,
    /// Edits.
    pub edits: u64,
    /// Cancellations.
    pub cancellations: u64,
    /// Voids.
    pub voids: u64,
    /// Logins.
    pub logins: u64,
    /// Logoffs.
    pub logoffs: u64,
}

impl ActionCounts {
    /// Returns counts holding a single increment of `counter`.
    #[must_use]
    pub fn single(counter: ActionCounter) -> Self {
        let mut counts = Self::default();
        *counts.slot_mut(counter) += 1;
        counts
    }

    /// Returns the value of one counter.
    #[must_use]
    pub fn get(&self, counter: ActionCounter) -> u64 {
        match counter {
            ActionCounter::Registration => self.registrations,
            ActionCounter::Edit => self.edits,
            ActionCounter::Cancellation => self.cancellations,
            ActionCounter::Void => self.voids,
            ActionCounter::Login => self.logins,
            ActionCounter::Logoff => self.logoffs,
        }
    }

    fn slot_mut(&mut self, counter: ActionCounter) -> &mut u64 {
        match counter {
            ActionCounter::Registration => &mut self.registrations,
            ActionCounter::Edit => &mut self.edits,
            ActionCounter::Cancellation => &mut self.cancellations,
            ActionCounter::Void => &mut self.voids,
            ActionCounter::Login => &mut self.logins,
            ActionCounter::Logoff => &mut self.logoffs,
        }
    }

    fn add(&mut self, other: &Self) {
        self.registrations += other.registrations;
        self.edits += other.edits;
        self.cancellations += other.cancellations;
        self.voids += other.voids;
        self.logins += other.logins;
        self.logoffs += other.logoffs;
    }
}

/// Increments applied to one day's log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceDelta {
    /// Store requests.
    pub requests: u64,
    /// Automation webhook calls.
    pub automation_calls: u64,
    /// Transferred megabytes.
    pub bandwidth_mb: f64,
    /// User credited with the activity.
    pub user: String,
    /// Action counters.
    pub actions: ActionCounts,
    /// Local instant of the activity; selects the hourly bucket.
    pub recorded_at: NaiveDateTime,
}

impl PerformanceDelta {
    /// Builds the delta recorded for one successful board operation.
    #[must_use]
    pub fn for_action(action: &AuditAction, user: &str, recorded_at: NaiveDateTime) -> Self {
        Self {
            requests: 1,
            automation_calls: 1,
            bandwidth_mb: 0.0,
            user: user.to_owned(),
            actions: ActionCounter::for_action(action)
                .map(ActionCounts::single)
                .unwrap_or_default(),
            recorded_at,
        }
    }

    /// Returns the two-digit hour bucket key.
    #[must_use]
    pub fn hour_key(&self) -> String {
        self.recorded_at.format("%H").to_string()
    }
}

/// Accumulated counters for a day or a period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceTotals {
    /// Store requests.
    pub total_requests: u64,
    /// Automation webhook calls.
    pub total_automation_calls: u64,
    /// Transferred megabytes.
    pub bandwidth_mb: f64,
    /// Distinct users seen.
    pub unique_users: BTreeSet<String>,
    /// Action counters.
    pub actions: ActionCounts,
    /// Requests per two-digit hour.
    pub hourly_requests: BTreeMap<String, u64>,
    /// Instant of the latest accumulated delta.
    pub last_updated: Option<NaiveDateTime>,
}

impl PerformanceTotals {
    fn merge(&mut self, other: &Self) {
        self.total_requests += other.total_requests;
        self.total_automation_calls += other.total_automation_calls;
        self.bandwidth_mb += other.bandwidth_mb;
        self.unique_users.extend(other.unique_users.iter().cloned());
        self.actions.add(&other.actions);
        for (hour, requests) in &other.hourly_requests {
            *self.hourly_requests.entry(hour.clone()).or_default() += requests;
        }
        self.last_updated = self.last_updated.max(other.last_updated);
    }
}

/// Daily performance row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceLog {
    /// Calendar day.
    pub date: NaiveDate,
    /// Counters for the day.
    pub totals: PerformanceTotals,
}

impl PerformanceLog {
    /// Creates an empty row for `date`.
    #[must_use]
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            totals: PerformanceTotals::default(),
        }
    }

    /// Adds a delta to the row.
    ///
    /// Users are appended to the unique set if absent and the hourly bucket
    /// grows by the delta's request count. `last_updated` never moves back.
    pub fn accumulate(&mut self, delta: &PerformanceDelta) {
        let totals = &mut self.totals;
        totals.total_requests += delta.requests;
        totals.total_automation_calls += delta.automation_calls;
        totals.bandwidth_mb += delta.bandwidth_mb;
        totals.actions.add(&delta.actions);
        if !delta.user.trim().is_empty() {
            totals.unique_users.insert(delta.user.clone());
        }
        *totals.hourly_requests.entry(delta.hour_key()).or_default() += delta.requests;
        totals.last_updated = totals.last_updated.max(Some(delta.recorded_at));
    }
}

/// Reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportPeriod {
    /// The selected day.
    Day,
    /// Monday to Sunday around the selected day.
    Week,
    /// First to last day of the selected month.
    Month,
}

impl ReportPeriod {
    /// Returns the stable period identifier.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    /// Returns the inclusive date range covering `date`.
    #[must_use]
    pub fn range(&self, date: NaiveDate) -> (NaiveDate, NaiveDate) {
        match self {
            Self::Day => (date, date),
            Self::Week => {
                let offset = u64::from(date.weekday().num_days_from_monday());
                let monday = date.checked_sub_days(Days::new(offset)).unwrap_or(date);
                let sunday = monday.checked_add_days(Days::new(6)).unwrap_or(date);
                (monday, sunday)
            }
            Self::Month => {
                let first = date.with_day(1).unwrap_or(date);
                let last = first
                    .checked_add_months(Months::new(1))
                    .and_then(|next| next.pred_opt())
                    .unwrap_or(date);
                (first, last)
            }
        }
    }

    fn label(&self, date: NaiveDate) -> String {
        match self {
            Self::Day => date.format("%Y-%m-%d").to_string(),
            Self::Week => "Semana".to_owned(),
            Self::Month => date.format("%Y-%m").to_string(),
        }
    }
}

impl Display for ReportPeriod {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for ReportPeriod {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            _ => Err(AppError::Validation(format!(
                "unknown report period '{value}'"
            ))),
        }
    }
}

/// Counters aggregated over a reporting window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    /// Window kind.
    pub period: ReportPeriod,
    /// Window label (`YYYY-MM-DD`, `Semana` or `YYYY-MM`).
    pub label: String,
    /// First day, inclusive.
    pub from: NaiveDate,
    /// Last day, inclusive.
    pub to: NaiveDate,
    /// Summed counters.
    pub totals: PerformanceTotals,
    /// Daily rows inside the window, by date.
    pub daily: Vec<PerformanceLog>,
}

impl PerformanceReport {
    /// Aggregates the rows of `logs` falling inside the window around `date`.
    #[must_use]
    pub fn aggregate(period: ReportPeriod, date: NaiveDate, logs: Vec<PerformanceLog>) -> Self {
        let (from, to) = period.range(date);
        let mut daily: Vec<PerformanceLog> = logs
            .into_iter()
            .filter(|log| log.date >= from && log.date <= to)
            .collect();
        daily.sort_by_key(|log| log.date);

        let mut totals = PerformanceTotals::default();
        for log in &daily {
            totals.merge(&log.totals);
        }

        Self {
            period,
            label: period.label(date),
            from,
            to,
            totals,
            daily,
        }
    }

    /// Returns whether no day in the window has data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.daily.is_empty()
    }
}
