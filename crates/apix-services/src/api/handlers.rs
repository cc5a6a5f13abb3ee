//! HTTP request handlers for the gateway.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::Instrument;

use apix_core::pipeline::{PipelineOutcome, PipelineRun};
use apix_types::error::PipelineError;
use apix_types::request::{PipelineRequest, StageResult};

use super::GatewayState;

/// Header carrying the per-request id on every pipeline response.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Returns health status, version and the size of the loaded configuration.
pub async fn health(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "routes": state.orchestrator.routes().len(),
        "extensions": state.orchestrator.registry().len(),
    }))
}

/// Built-in validation service.
pub async fn validation(State(state): State<GatewayState>, body: Bytes) -> Response {
    match state.validation {
        Some(svc) => stage_response(svc.handle(&body)),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Built-in store service.
pub async fn store(State(state): State<GatewayState>, body: Bytes) -> Response {
    match state.store {
        Some(svc) => stage_response(svc.handle(&body).await),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Run any other request through the extension pipeline.
pub async fn pipeline(
    State(state): State<GatewayState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = to_pipeline_request(&method, &uri, &headers, body);
    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!(
        "pipeline",
        %request_id,
        method = %request.method,
        uri = %request.uri,
    );

    let result = state
        .orchestrator
        .handle(&request, &state.shutdown)
        .instrument(span)
        .await;

    let mut response = pipeline_response(result);
    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Build a [`PipelineRequest`] from the parts of an inbound HTTP request.
///
/// Header names are already lower-case in [`HeaderMap`]; repeated headers
/// are joined with `", "` and values that are not valid UTF-8 are dropped.
pub fn to_pipeline_request(
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    body: Bytes,
) -> PipelineRequest {
    let uri = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.to_string());
    let mut request = PipelineRequest::new(method.as_str(), uri).with_payload(body.to_vec());

    for name in headers.keys() {
        let values: Vec<&str> = headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        if !values.is_empty() {
            request = request.with_header(name.as_str(), values.join(", "));
        }
    }
    request
}

/// Map an engine result to the HTTP response sent to the client.
///
/// A completed pipeline answers with the last stage's status and the final
/// payload; a rejection answers with the fixed 400 response. Fatal errors
/// map to distinct statuses with a JSON body naming the failure kind.
pub fn pipeline_response(result: Result<PipelineRun, PipelineError>) -> Response {
    match result {
        Ok(run) => match run.outcome {
            PipelineOutcome::Completed { payload, status } => match StatusCode::from_u16(status) {
                Ok(code) => (code, payload).into_response(),
                Err(_) => {
                    tracing::error!(route = %run.route, status, "pipeline completed with an invalid status code");
                    error_body(
                        StatusCode::BAD_GATEWAY,
                        "invalid_status",
                        format!("extension returned invalid status code {status}"),
                    )
                }
            },
            rejected @ PipelineOutcome::Rejected { .. } => (
                StatusCode::BAD_REQUEST,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                rejected.body().to_vec(),
            )
                .into_response(),
        },
        Err(err) => {
            let status = error_status(&err);
            if status.is_server_error() {
                tracing::error!(kind = err.kind(), error = %err, "pipeline aborted");
            } else {
                tracing::warn!(kind = err.kind(), error = %err, "pipeline aborted");
            }
            error_body(status, err.kind(), err.to_string())
        }
    }
}

/// HTTP status for a fatal pipeline error.
pub fn error_status(err: &PipelineError) -> StatusCode {
    match err {
        PipelineError::NoRouteMatched { .. } => StatusCode::NOT_FOUND,
        PipelineError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        PipelineError::ServiceUnavailable { .. } => StatusCode::BAD_GATEWAY,
        PipelineError::DeadlineExceeded { .. } => StatusCode::GATEWAY_TIMEOUT,
        PipelineError::Cancelled { .. } => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_body(status: StatusCode, kind: &str, message: String) -> Response {
    (
        status,
        Json(serde_json::json!({ "error": message, "kind": kind })),
    )
        .into_response()
}

fn stage_response(result: StageResult) -> Response {
    let status = StatusCode::from_u16(result.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, result.body).into_response()
}
