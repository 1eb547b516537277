//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "realcheck_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "realcheck_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "realcheck_http_requests_in_flight";

    // Upload metrics
    pub const UPLOADS_TOTAL: &str = "realcheck_uploads_total";
    pub const UPLOAD_BYTES: &str = "realcheck_upload_bytes";
    pub const ANALYSIS_DURATION_SECONDS: &str = "realcheck_analysis_duration_seconds";
    pub const CLASSIFIER_FALLBACKS_TOTAL: &str = "realcheck_classifier_fallbacks_total";
    pub const VERDICTS_TOTAL: &str = "realcheck_verdicts_total";
    pub const CLEANUP_FAILURES_TOTAL: &str = "realcheck_cleanup_failures_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", route_label(path).to_string()),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record an accepted upload.
pub fn record_upload(kind: &str, bytes: u64) {
    let labels = [("kind", kind.to_string())];
    counter!(names::UPLOADS_TOTAL, &labels).increment(1);
    histogram!(names::UPLOAD_BYTES, &labels).record(bytes as f64);
}

/// Record analysis duration.
pub fn record_analysis_duration(kind: &str, model_used: bool, duration_secs: f64) {
    let labels = [
        ("kind", kind.to_string()),
        ("model_used", model_used.to_string()),
    ];
    histogram!(names::ANALYSIS_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a random-score fallback.
pub fn record_fallback(reason: &str) {
    let labels = [("reason", reason.to_string())];
    counter!(names::CLASSIFIER_FALLBACKS_TOTAL, &labels).increment(1);
}

/// Record a verdict.
pub fn record_verdict(label: &str) {
    let labels = [("label", label.to_string())];
    counter!(names::VERDICTS_TOTAL, &labels).increment(1);
}

/// Record a staged file that could not be deleted.
pub fn record_cleanup_failure() {
    counter!(names::CLEANUP_FAILURES_TOTAL).increment(1);
}

/// Collapse unknown paths so scanners cannot blow up label cardinality.
fn route_label(path: &str) -> &'static str {
    match path {
        "/upload" => "/upload",
        "/health" => "/health",
        "/healthz" => "/healthz",
        "/metrics" => "/metrics",
        _ => "other",
    }
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}
