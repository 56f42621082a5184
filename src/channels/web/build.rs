//! Build API routes.
//!
//! - `GET /`: liveness probe
//! - `POST /api/build`: compile a project, answering with a `BuildResult`
//!
//! A failed compile is still a `200`; only malformed requests (`400`) and
//! host failures (`500`) change the status code.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::AppState;
use crate::build::BuildRequest;

/// GET / - Liveness probe.
pub async fn health() -> &'static str {
    "ok"
}

/// POST /api/build - Compile and link the posted sources.
pub async fn build(
    State(state): State<AppState>,
    payload: Result<Json<BuildRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::warn!("Rejected build request: {}", rejection.body_text());
            return bad_request();
        }
    };

    if let Err(e) = request.validate() {
        tracing::warn!("Rejected build request: {}", e);
        return bad_request();
    }

    match state.orchestrator.clone().build_blocking(request).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) if e.is_validation() => {
            tracing::warn!("Rejected build request: {}", e);
            bad_request()
        }
        Err(e) => {
            tracing::error!("Build aborted: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "500 Internal server error",
            )
                .into_response()
        }
    }
}

/// Any method other than POST on `/api/build`.
pub async fn method_not_allowed() -> Response {
    (StatusCode::METHOD_NOT_ALLOWED, "405 Method Not Allowed").into_response()
}

fn bad_request() -> Response {
    (StatusCode::BAD_REQUEST, "400 Bad Request").into_response()
}
