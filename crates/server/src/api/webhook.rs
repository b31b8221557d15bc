//! Plex webhook intake.
//!
//! Plex posts `multipart/form-data` with the event JSON in a `payload`
//! field (plus a thumbnail for some events). A raw JSON body is accepted
//! as well, which is what most test tools send.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use plexsubs_core::{AcquisitionStatus, MediaStarted, RunReport, ServiceError};

use super::handlers::ErrorResponse;
use crate::metrics::WEBHOOK_EVENTS_TOTAL;
use crate::state::AppState;

/// Events that start a run; everything else is acknowledged and ignored.
const HANDLED_EVENTS: &[&str] = &["media.play", "media.resume"];

// ============================================================================
// Payload types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    pub event: String,
    #[serde(rename = "Metadata")]
    pub metadata: Option<WebhookMetadata>,
    #[serde(rename = "Player")]
    pub player: Option<WebhookPlayer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookMetadata {
    pub rating_key: Option<String>,
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookPlayer {
    pub title: Option<String>,
    pub uuid: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IgnoredResponse {
    pub status: String,
    pub event: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(error: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}

// ============================================================================
// Handler
// ============================================================================

/// POST {server.webhook_path}
pub async fn receive(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let payload = match read_payload(&state, request).await {
        Ok(payload) => payload,
        Err(e) => {
            WEBHOOK_EVENTS_TOTAL
                .with_label_values(&["unknown", "rejected"])
                .inc();
            return e.into_response();
        }
    };

    if !HANDLED_EVENTS.contains(&payload.event.as_str()) {
        debug!(event = %payload.event, "Ignoring webhook event");
        WEBHOOK_EVENTS_TOTAL
            .with_label_values(&[&payload.event, "ignored"])
            .inc();
        return Json(IgnoredResponse {
            status: "ignored".to_string(),
            event: payload.event,
        })
        .into_response();
    }

    let Some(rating_key) = payload
        .metadata
        .as_ref()
        .and_then(|m| m.rating_key.clone())
        .filter(|k| !k.is_empty())
    else {
        WEBHOOK_EVENTS_TOTAL
            .with_label_values(&[&payload.event, "rejected"])
            .inc();
        return bad_request("Metadata.ratingKey is required").into_response();
    };

    let event = MediaStarted {
        rating_key,
        session_id: None,
        player: payload.player.as_ref().and_then(|p| p.title.clone()),
    };
    info!(
        event = %payload.event,
        rating_key = %event.rating_key,
        title = payload.metadata.as_ref().and_then(|m| m.title.as_deref()).unwrap_or(""),
        "Webhook received"
    );

    let cancel = state.shutdown_token().child_token();
    match state.service().handle_media_started(&event, &cancel).await {
        Ok(report) => {
            let status = status_for(&report);
            WEBHOOK_EVENTS_TOTAL
                .with_label_values(&[&payload.event, report.acquisition.status.as_label()])
                .inc();
            (status, Json(report)).into_response()
        }
        Err(ServiceError::Player(e)) => {
            warn!(rating_key = %event.rating_key, error = %e, "Player unavailable");
            WEBHOOK_EVENTS_TOTAL
                .with_label_values(&[&payload.event, "player_error"])
                .inc();
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// HTTP status reported for a finished run.
pub fn status_for(report: &RunReport) -> StatusCode {
    match report.acquisition.status {
        AcquisitionStatus::Done | AcquisitionStatus::AlreadySatisfied => StatusCode::OK,
        AcquisitionStatus::NoSubtitleFound { .. } => StatusCode::NOT_FOUND,
        AcquisitionStatus::PathUnresolvable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        AcquisitionStatus::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
    }
}

async fn read_payload(
    state: &Arc<AppState>,
    request: Request,
) -> Result<WebhookPayload, ApiError> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    let raw = if is_multipart {
        let mut multipart = Multipart::from_request(request, state)
            .await
            .map_err(|e| bad_request(format!("Invalid multipart body: {}", e)))?;

        let mut payload = None;
        while let Ok(Some(field)) = multipart.next_field().await {
            if field.name() == Some("payload") {
                let text = field
                    .text()
                    .await
                    .map_err(|e| bad_request(format!("Failed to read payload: {}", e)))?;
                payload = Some(text.into_bytes());
                break;
            }
        }
        payload.ok_or_else(|| bad_request("Multipart body has no payload field"))?
    } else {
        Bytes::from_request(request, state)
            .await
            .map_err(|e| bad_request(format!("Failed to read body: {}", e)))?
            .to_vec()
    };

    serde_json::from_slice(&raw).map_err(|e| bad_request(format!("Invalid payload JSON: {}", e)))
}
