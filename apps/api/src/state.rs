use std::sync::Arc;

use crate::analysis::orchestrator::{AnalysisService, ServiceStatus};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub analysis: Arc<AnalysisService>,
    /// Snapshot taken by `AnalysisService::initialize` at startup.
    pub assistant_status: ServiceStatus,
}
