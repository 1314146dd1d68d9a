use super::{Gateway, Params};
use crate::render;

use axum::extract::Query;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use std::sync::Arc;

/// `GET /` — the SRU/FCS endpoint. Every validation failure still renders a
/// complete envelope in the negotiated packing; only a renderer breakdown
/// produces a bare HTTP error.
pub async fn handle_fcs(
    Query(params): Query<Params>,
    Extension(gateway): Extension<Arc<Gateway>>,
) -> Response {
    let outcome = gateway.handle(&params).await;
    let content_type = outcome.response.record_packing.content_type();

    match render::render(&outcome.response) {
        Ok(body) => (
            outcome.status,
            [(header::CONTENT_TYPE, content_type)],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to render response envelope");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// `GET /health` — process liveness and a corpus count.
pub async fn handle_health(
    Extension(gateway): Extension<Arc<Gateway>>,
) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "server": gateway.general.server_name,
        "version": env!("CARGO_PKG_VERSION"),
        "resources": gateway.registry.len(),
    }))
}
