//! HTTP Endpoints
//!
//! REST API over the analysis session. Handlers only read snapshots and
//! issue session commands; all state changes go through the session machine.

use std::time::Duration;

use axum::{
    extract::{Json, State},
    http::{HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use deal_sim_config::OverridesView;
use deal_sim_core::{
    Clause, Credential, Document, FocusTheme, RiskRecord, ADVERSARIAL_PATTERNS,
    SYSTEM_LIMITATIONS,
};
use deal_sim_session::{EvidenceView, SessionSnapshot, Transition};

use crate::state::AppState;
use crate::ServerError;

const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let server = &state.config.server;
    let cors_layer = build_cors_layer(&server.cors_origins, server.cors_enabled);
    let timeout = Duration::from_secs(server.timeout_seconds);

    Router::new()
        // Analysis
        .route("/api/analysis", post(start_analysis))
        .route("/api/clauses", get(list_clauses))
        .route("/api/risks", get(list_risks))
        // Session
        .route("/api/session", get(get_session))
        .route("/api/session/select", post(select_risk))
        .route("/api/session/highlight", post(set_highlight))
        .route("/api/session/reset", post(reset_session))
        .route("/api/session/evidence", get(get_evidence))
        // User overrides
        .route("/api/settings", get(get_settings).put(update_settings))
        // Reference material
        .route("/api/patterns", get(list_patterns))
        // Health check
        .route("/health", get(health_check))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(timeout))
                .layer(CompressionLayer::new())
                .layer(cors_layer),
        )
        .with_state(state)
}

/// Build CORS layer from configured origins
///
/// - If cors_enabled is false, returns permissive layer (for dev)
/// - If cors_origins is empty or all invalid, defaults to localhost:3000
/// - Otherwise, uses the configured origins
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::PUT, Method::OPTIONS];

    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins (NOT FOR PRODUCTION)");
        return CorsLayer::permissive();
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    if parsed_origins.is_empty() {
        tracing::info!("No usable CORS origins configured, defaulting to localhost:3000");
        return CorsLayer::new()
            .allow_origin(HeaderValue::from_static(DEFAULT_CORS_ORIGIN))
            .allow_methods(methods)
            .allow_headers(Any);
    }

    tracing::info!("CORS configured with {} origins", parsed_origins.len());
    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods(methods)
        .allow_headers(Any)
}

/// Analysis request
#[derive(Debug, Deserialize)]
struct AnalysisRequest {
    #[serde(default)]
    name: String,
    content: String,
}

/// Start an analysis run
///
/// POST /api/analysis
///
/// The run continues in the background; a newer upload supersedes it.
async fn start_analysis(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Result<impl IntoResponse, ServerError> {
    if request.content.trim().is_empty() {
        return Err(ServerError::InvalidRequest(
            "document content is empty".to_string(),
        ));
    }

    let name = match request.name.trim() {
        "" => "untitled".to_string(),
        name => name.to_string(),
    };

    let document = Document::new(name, request.content);
    let text = document.content().to_string();
    let analyzer = state.analyzer.clone();
    let token = analyzer.begin_run(document);

    tokio::spawn(async move {
        // Failures are recorded in the session and logged by the analyzer
        let _ = analyzer.drive(token, &text).await;
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({
            "status": "started",
            "generation": token.generation(),
        })),
    ))
}

async fn get_session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.analyzer.snapshot())
}

async fn list_clauses(State(state): State<AppState>) -> Json<Vec<Clause>> {
    Json(state.analyzer.clauses())
}

async fn list_risks(State(state): State<AppState>) -> Json<Vec<RiskRecord>> {
    Json(state.analyzer.risks())
}

#[derive(Debug, Deserialize)]
struct SelectRequest {
    risk_id: String,
}

/// Select a risk
///
/// POST /api/session/select
async fn select_risk(
    State(state): State<AppState>,
    Json(request): Json<SelectRequest>,
) -> Result<Json<SessionSnapshot>, ServerError> {
    let transition = state.analyzer.select(request.risk_id);
    applied_or_conflict(transition)?;
    Ok(Json(state.analyzer.snapshot()))
}

#[derive(Debug, Deserialize)]
struct HighlightRequest {
    enabled: bool,
}

/// Toggle adversarial highlighting
///
/// POST /api/session/highlight
async fn set_highlight(
    State(state): State<AppState>,
    Json(request): Json<HighlightRequest>,
) -> Result<Json<SessionSnapshot>, ServerError> {
    let transition = state.analyzer.set_highlight(request.enabled);
    applied_or_conflict(transition)?;
    Ok(Json(state.analyzer.snapshot()))
}

async fn reset_session(State(state): State<AppState>) -> StatusCode {
    state.analyzer.reset();
    StatusCode::NO_CONTENT
}

/// Evidence of the selected risk
///
/// GET /api/session/evidence
async fn get_evidence(State(state): State<AppState>) -> Result<Json<EvidenceView>, ServerError> {
    state
        .analyzer
        .evidence()
        .map(Json)
        .ok_or_else(|| ServerError::NotFound("no risk selected".to_string()))
}

#[derive(Debug, Serialize)]
struct SettingsResponse {
    overrides: OverridesView,
    default_credential_available: bool,
}

/// Override update; an empty string clears the value, an absent field keeps it
#[derive(Debug, Default, Deserialize)]
struct SettingsUpdate {
    api_key: Option<String>,
    extraction_model: Option<String>,
    reasoning_model: Option<String>,
}

fn settings_response(state: &AppState, overrides: OverridesView) -> Json<SettingsResponse> {
    Json(SettingsResponse {
        overrides,
        default_credential_available: state.analyzer.has_default_credential(),
    })
}

async fn get_settings(State(state): State<AppState>) -> Json<SettingsResponse> {
    settings_response(&state, state.analyzer.overrides())
}

/// Update user overrides
///
/// PUT /api/settings
///
/// Takes effect from the next run. The credential is never echoed back.
async fn update_settings(
    State(state): State<AppState>,
    Json(update): Json<SettingsUpdate>,
) -> Json<SettingsResponse> {
    let view = state.analyzer.update_overrides(|overrides| {
        if let Some(key) = update.api_key {
            overrides.credential = non_blank(key).map(Credential::new);
        }
        if let Some(model) = update.extraction_model {
            overrides.extraction_model = non_blank(model);
        }
        if let Some(model) = update.reasoning_model {
            overrides.reasoning_model = non_blank(model);
        }
    });
    settings_response(&state, view)
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Adversarial pattern catalogue
///
/// GET /api/patterns
async fn list_patterns() -> Json<serde_json::Value> {
    let focus: Vec<&str> = FocusTheme::ALL.iter().map(FocusTheme::as_str).collect();

    Json(serde_json::json!({
        "patterns": ADVERSARIAL_PATTERNS,
        "limitations": SYSTEM_LIMITATIONS,
        "focus": focus,
    }))
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let snapshot = state.analyzer.snapshot();

    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "phase": snapshot.phase.as_str(),
        "default_credential_available": state.analyzer.has_default_credential(),
    }))
}

fn applied_or_conflict(transition: Transition) -> Result<(), ServerError> {
    match transition {
        Transition::Applied => Ok(()),
        Transition::Ignored(reason) => Err(ServerError::Conflict(format!("{reason:?}"))),
        Transition::Stale => Err(ServerError::Conflict("stale command".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use deal_sim_config::{ConfigResolver, Settings};
    use deal_sim_core::{ReasoningService, Result};
    use deal_sim_session::AnalysisPhase;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const EVIDENCE: &str = "Investments in Unrestricted Subsidiaries in an unlimited amount";

    struct FixedService;

    #[async_trait]
    impl ReasoningService for FixedService {
        async fn extract(
            &self,
            _credential: &Credential,
            _model_id: &str,
            _document_text: &str,
        ) -> Result<Value> {
            Ok(json!([{
                "id": "c1",
                "category": "Investments",
                "sectionReference": "7.02(j)",
                "text": EVIDENCE,
                "summary": "Uncapped basket"
            }]))
        }

        async fn detect_risks(
            &self,
            _credential: &Credential,
            _model_id: &str,
            _clauses: &[Clause],
        ) -> Result<Value> {
            Ok(json!([{
                "id": "r1",
                "title": "Unrestricted subsidiary drop-down",
                "category": "Unrestricted Subsidiaries",
                "description": "IP can leave the collateral package",
                "severity": "Critical",
                "affectedClauses": ["c1"],
                "ruleLogic": "Investments basket x Unrestricted Subsidiary definition",
                "ruleLabel": "J.CREW-01",
                "evidenceSnippet": EVIDENCE,
                "scenarioTitle": "The IP Drop-Down",
                "scenarioNarrative": "Borrower moves trademarks to an unrestricted entity",
                "scenarioImpact": "Collateral stripped",
                "recoveryRisk": "High",
                "controlRisk": "High",
                "timingRisk": "Medium",
                "adversarialHighlight": "in an unlimited amount"
            }]))
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn test_state() -> AppState {
        let resolver = ConfigResolver::new(Some(Credential::new("process-key")), "flash", "pro");
        AppState::with_resolver(Settings::default(), Arc::new(FixedService), resolver)
    }

    async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                request = request.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn wait_for_ready(state: &AppState) {
        for _ in 0..100 {
            if state.analyzer.phase() == AnalysisPhase::Ready {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("analysis did not complete");
    }

    #[test]
    fn test_router_creation() {
        let _ = create_router(test_state());
    }

    #[tokio::test]
    async fn test_analysis_flow() {
        let state = test_state();
        let router = create_router(state.clone());

        let (status, body) = send(
            &router,
            Method::POST,
            "/api/analysis",
            Some(json!({"name": "credit_agreement.txt", "content": EVIDENCE})),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["status"], "started");

        wait_for_ready(&state).await;

        let (status, session) = send(&router, Method::GET, "/api/session", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(session["phase"], "Ready");
        assert_eq!(session["progress"], 100);
        assert_eq!(session["selectedRiskId"], "r1");
        assert_eq!(session["dealRating"], "CRITICAL");
        assert_eq!(session["documentName"], "credit_agreement.txt");

        let (_, risks) = send(&router, Method::GET, "/api/risks", None).await;
        assert_eq!(risks[0]["severity"], "Critical");

        let (_, clauses) = send(&router, Method::GET, "/api/clauses", None).await;
        assert_eq!(clauses[0]["sectionReference"], "7.02(j)");

        let (status, evidence) = send(&router, Method::GET, "/api/session/evidence", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(evidence["segments"].as_array().unwrap().len(), 3);
        assert_eq!(evidence["segments"][1]["text"], "in an unlimited amount");
        assert_eq!(evidence["segments"][1]["isHighlighted"], true);
        assert_eq!(evidence["risk_id"], "r1");
        assert_eq!(evidence["section_reference"], "c1");
        assert_eq!(evidence["impact_bars"], json!([3, 3, 2]));
        assert_eq!(evidence["highlight_mode_enabled"], true);

        let (status, _) = send(
            &router,
            Method::POST,
            "/api/session/highlight",
            Some(json!({"enabled": false})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (_, evidence) = send(&router, Method::GET, "/api/session/evidence", None).await;
        assert_eq!(evidence["segments"].as_array().unwrap().len(), 1);
        assert_eq!(evidence["segments"][0]["isHighlighted"], false);
        assert_eq!(evidence["highlight_mode_enabled"], false);

        let (status, _) = send(
            &router,
            Method::POST,
            "/api/session/select",
            Some(json!({"risk_id": "missing"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(&router, Method::POST, "/api/session/reset", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, body) = send(&router, Method::GET, "/api/session/evidence", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_empty_content_rejected() {
        let router = create_router(test_state());
        let (status, body) = send(
            &router,
            Method::POST,
            "/api/analysis",
            Some(json!({"name": "blank.txt", "content": "   "})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "INVALID_REQUEST");
    }

    #[tokio::test]
    async fn test_settings_never_echo_credential() {
        let router = create_router(test_state());

        let (status, body) = send(
            &router,
            Method::PUT,
            "/api/settings",
            Some(json!({"api_key": "user-secret", "reasoning_model": "gemini-custom"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["overrides"]["credential_set"], true);
        assert_eq!(body["overrides"]["reasoning_model"], "gemini-custom");
        assert!(!body.to_string().contains("user-secret"));

        let (_, body) = send(
            &router,
            Method::PUT,
            "/api/settings",
            Some(json!({"api_key": ""})),
        )
        .await;
        assert_eq!(body["overrides"]["credential_set"], false);
        assert_eq!(body["overrides"]["reasoning_model"], "gemini-custom");
        assert_eq!(body["default_credential_available"], true);
    }

    #[tokio::test]
    async fn test_patterns_and_health() {
        let router = create_router(test_state());

        let (status, body) = send(&router, Method::GET, "/api/patterns", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["patterns"].as_array().unwrap().len(), ADVERSARIAL_PATTERNS.len());
        assert_eq!(body["limitations"].as_array().unwrap().len(), SYSTEM_LIMITATIONS.len());

        let (status, body) = send(&router, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["phase"], "idle");
    }
}
