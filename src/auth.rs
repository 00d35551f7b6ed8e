use crate::state::AppState;
use axum::Json;
use axum::extract::{Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::collections::HashMap;
use tracing::warn;

/// Shared-secret gate on the webhook endpoint. When an API key is configured,
/// it is expected in the configured query parameter; requests without a
/// matching key are turned away with a 401. Without configured auth the
/// endpoint is open and this middleware is a pass-through.
///
/// The query string is percent-decoded by the extractor, so keys containing
/// reserved characters compare against their decoded form.
pub async fn require_api_key(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(auth) = state.config.auth.as_ref() else {
        return next.run(request).await;
    };

    let provided = params.get(&auth.api_key_param_name).map(String::as_str);
    if provided == Some(auth.api_key.expose_secret()) {
        next.run(request).await
    } else {
        warn!("Rejecting webhook request without a valid API key");
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "message": "You are not authorised to access this webhook endpoint"
            })),
        )
            .into_response()
    }
}
