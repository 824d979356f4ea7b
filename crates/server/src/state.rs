//! Application State
//!
//! Shared state across all handlers.

use std::sync::Arc;

use deal_sim_config::{ConfigResolver, Settings};
use deal_sim_core::ReasoningService;
use deal_sim_llm::{GeminiClient, GeminiConfig};
use deal_sim_pipeline::Orchestrator;
use deal_sim_session::SessionAnalyzer;

use crate::ServerError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    /// Settings as loaded at startup
    pub config: Arc<Settings>,
    /// The analysis session
    pub analyzer: Arc<SessionAnalyzer>,
}

impl AppState {
    /// Create state backed by the Gemini client
    pub fn new(config: Settings) -> Result<Self, ServerError> {
        let client = GeminiClient::new(GeminiConfig::from_settings(&config.reasoning))?;
        tracing::info!(
            endpoint = %client.config().endpoint,
            extraction_model = %config.reasoning.extraction_model,
            reasoning_model = %config.reasoning.reasoning_model,
            "Reasoning backend initialized"
        );
        Ok(Self::with_service(config, Arc::new(client)))
    }

    /// Create state with a custom reasoning backend
    pub fn with_service(config: Settings, service: Arc<dyn ReasoningService>) -> Self {
        let resolver = ConfigResolver::from_settings(&config);
        Self::with_resolver(config, service, resolver)
    }

    /// Create state with an explicit config resolver
    pub fn with_resolver(
        config: Settings,
        service: Arc<dyn ReasoningService>,
        resolver: ConfigResolver,
    ) -> Self {
        let orchestrator = Arc::new(Orchestrator::from_settings(service, &config.reasoning));
        Self {
            config: Arc::new(config),
            analyzer: Arc::new(SessionAnalyzer::new(orchestrator, resolver)),
        }
    }
}
