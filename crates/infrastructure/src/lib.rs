//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_manifest_repository;
mod in_memory_performance_log_repository;
mod postgres_manifest_repository;
mod postgres_performance_log_repository;
mod system_clock;

pub use in_memory_manifest_repository::InMemoryManifestRepository;
pub use in_memory_performance_log_repository::InMemoryPerformanceLogRepository;
pub use postgres_manifest_repository::PostgresManifestRepository;
pub use postgres_performance_log_repository::PostgresPerformanceLogRepository;
pub use system_clock::SystemClock;
