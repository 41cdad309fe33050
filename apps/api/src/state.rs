use std::sync::Arc;

use crate::config::Config;
use crate::context::ContextStore;
use crate::llm_client::TextGenerator;
use crate::scheduling::SchedulingService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Handle to the single-writer context store.
    pub store: ContextStore,
    /// Pluggable text generator. Default: `LlmGateway` over HTTP.
    pub llm: Arc<dyn TextGenerator>,
    pub scheduling: Arc<SchedulingService>,
    pub config: Config,
}
