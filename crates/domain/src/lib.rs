//! Manifest lifecycle model: classification, timelines, elapsed counters and audit diffs.
//!
//! Everything here is synchronous and performs no I/O. Functions that depend
//! on the current instant take it as a `now` argument.

#![forbid(unsafe_code)]

mod audit;
mod board;
mod date_parsing;
mod elapsed;
mod manifest;
mod performance;
mod status;
mod timeline;

pub use audit::{
    AuditAction, EventWithDiff, FieldChange, ManifestEvent, MonitoredField, NewManifestEvent,
    diff_events, status_before_cancellation,
};
pub use board::{Board, BoardCard, BoardColumn};
pub use date_parsing::{parse_flexible_date, prefer_swapped_reading};
pub use elapsed::{ElapsedTime, elapsed_time};
pub use manifest::{
    Carrier, Manifest, ManifestEdit, ManifestInput, RegisterManifest, STORAGE_FORMAT,
    format_storage,
};
pub use performance::{
    ActionCounter, ActionCounts, PerformanceDelta, PerformanceLog, PerformanceReport,
    PerformanceTotals, ReportPeriod,
};
pub use status::{Classification, ManifestStatus, Stage, UNRECOGNIZED_STATUS_STAGE, classify};
pub use timeline::{
    DISPLAY_FORMAT, NOT_RECORDED, Timeline, TimelineField, format_display_timestamp,
};
