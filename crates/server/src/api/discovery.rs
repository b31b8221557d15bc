//! Path discovery API handlers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use plexsubs_core::paths::{
    DiscoveryError, DiscoveryStatus, MappingSuggestion, PathMapping, ValidationReport,
};
use plexsubs_core::player::{Library, PlayerError};

use super::handlers::ErrorResponse;
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ValidatePathsRequest {
    pub test_paths: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct LibrariesResponse {
    pub libraries: Vec<Library>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<SuggestionResponse>,
    pub configured: Vec<PathMapping>,
}

#[derive(Debug, Serialize)]
pub struct SuggestionResponse {
    #[serde(flatten)]
    pub suggestion: MappingSuggestion,
    /// The pair is already in the mapping table.
    pub configured: bool,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error_response(e: DiscoveryError) -> ApiError {
    let status = match &e {
        DiscoveryError::Player(PlayerError::NotFound(_)) => StatusCode::NOT_FOUND,
        DiscoveryError::Player(_) => StatusCode::BAD_GATEWAY,
        DiscoveryError::ScanFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/discover/status
pub async fn status(State(state): State<Arc<AppState>>) -> Json<DiscoveryStatus> {
    Json(state.discovery().status())
}

/// GET /api/v1/discover/libraries
pub async fn libraries(
    State(state): State<Arc<AppState>>,
) -> Result<Json<LibrariesResponse>, ApiError> {
    let libraries = state.discovery().libraries().await.map_err(error_response)?;
    Ok(Json(LibrariesResponse {
        count: libraries.len(),
        libraries,
    }))
}

/// GET /api/v1/discover/validate-paths
///
/// Validates a few files sampled from every movie and show library.
pub async fn validate_sampled(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ValidationReport>, ApiError> {
    let report = state
        .discovery()
        .validate(None)
        .await
        .map_err(error_response)?;
    Ok(Json(report))
}

/// POST /api/v1/discover/validate-paths
pub async fn validate_given(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ValidatePathsRequest>,
) -> Result<Json<ValidationReport>, ApiError> {
    if request.test_paths.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "test_paths cannot be empty".to_string(),
            }),
        ));
    }

    let report = state
        .discovery()
        .validate(Some(request.test_paths))
        .await
        .map_err(error_response)?;
    Ok(Json(report))
}

/// GET /api/v1/discover/suggest-mappings
pub async fn suggest_mappings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SuggestionsResponse>, ApiError> {
    let suggestions = state
        .discovery()
        .suggest()
        .await
        .map_err(error_response)?;

    let configured = state.config().path_mappings.clone();
    let mapper = plexsubs_core::PathMapper::new(configured.clone());
    Ok(Json(SuggestionsResponse {
        suggestions: suggestions
            .into_iter()
            .map(|suggestion| SuggestionResponse {
                configured: suggestion.is_configured(&mapper),
                suggestion,
            })
            .collect(),
        configured,
    }))
}
