use smo_application::{BoardService, ManifestService, PerformanceService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub board_service: BoardService,
    pub manifest_service: ManifestService,
    pub performance_service: PerformanceService,
}
