//! Shared axum handler state, analogous to the teacher's
//! `UnifiedAppState`.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::context::ContextManager;
use crate::orchestrator::Orchestrator;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub context: Arc<ContextManager>,
    pub orchestrator: Arc<Orchestrator>,
}
