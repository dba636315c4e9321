//! HTTP application assembly shared by the server binary and tests.

use std::time::Duration;

use axum::{
    Json, Router,
    http::{HeaderName, Request, Response, StatusCode, Uri},
    routing::get,
};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{
        DefaultOnBodyChunk, DefaultOnEos, DefaultOnFailure, MakeSpan, OnRequest, OnResponse,
        TraceLayer,
    },
};

use crate::{
    response::{ApiResponse, Meta},
    routes::{create_api_router, doc::scalar_docs, health},
    state::AppState,
};

const REQUEST_ID: &str = "x-request-id";
const MAX_IN_FLIGHT: usize = 100;

pub fn build_app(state: AppState, max_upload_bytes: usize) -> Router {
    let request_id_header = HeaderName::from_static(REQUEST_ID);

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", create_api_router(max_upload_bytes))
        .merge(scalar_docs())
        .fallback(not_found)
        .layer(trace_layer())
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .layer(ConcurrencyLimitLayer::new(MAX_IN_FLIGHT))
        .with_state(state)
}

fn request_id<B>(request: &Request<B>) -> &str {
    request
        .headers()
        .get(REQUEST_ID)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-")
}

#[derive(Clone, Copy)]
struct HttpSpan;

impl<B> MakeSpan<B> for HttpSpan {
    fn make_span(&mut self, request: &Request<B>) -> tracing::Span {
        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id(request)
        )
    }
}

#[derive(Clone, Copy)]
struct LogRequest;

impl<B> OnRequest<B> for LogRequest {
    fn on_request(&mut self, request: &Request<B>, _span: &tracing::Span) {
        tracing::info!(method = %request.method(), uri = %request.uri(), "request started");
    }
}

#[derive(Clone, Copy)]
struct LogResponse;

impl<B> OnResponse<B> for LogResponse {
    fn on_response(self, response: &Response<B>, latency: Duration, _span: &tracing::Span) {
        tracing::info!(
            status = %response.status(),
            ms = %latency.as_millis(),
            "request finished"
        );
    }
}

type HttpTrace = TraceLayer<
    SharedClassifier<ServerErrorsAsFailures>,
    HttpSpan,
    LogRequest,
    LogResponse,
    DefaultOnBodyChunk,
    DefaultOnEos,
    DefaultOnFailure,
>;

fn trace_layer() -> HttpTrace {
    TraceLayer::new_for_http()
        .make_span_with(HttpSpan)
        .on_request(LogRequest)
        .on_response(LogResponse)
}

async fn not_found(uri: Uri) -> (StatusCode, Json<ApiResponse<serde_json::Value>>) {
    let body = ApiResponse::success(
        "Not Found",
        serde_json::json!({ "path": uri.path() }),
        Some(Meta::empty()),
    );
    (StatusCode::NOT_FOUND, Json(body))
}
