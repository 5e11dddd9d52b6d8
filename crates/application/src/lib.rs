//! Application services and ports.

#![forbid(unsafe_code)]

mod board_service;
mod manifest_ports;
mod manifest_service;
mod performance_service;

pub use board_service::{BoardService, BoardSnapshot, ManifestHistory, TimelineRow};
pub use manifest_ports::{
    Clock, DEFAULT_BOARD_FETCH_LIMIT, ManifestEventRepository, ManifestRepository,
    PerformanceLogRepository,
};
pub use manifest_service::{ManifestChange, ManifestService};
pub use performance_service::PerformanceService;
