//! Router-level tests for the upload and health endpoints.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use image::{Rgb, RgbImage};
use serde_json::Value;
use tokio::sync::Notify;
use tower::ServiceExt;

use realcheck_api::{create_router, ApiConfig, AppState};
use realcheck_classifier::{Classifier, ClassifierError, ClassifierHandle, ClassifierResult};
use realcheck_media::{Frame, FrameDecoder, MediaResult};
use realcheck_storage::{StagingArea, StagingConfig};

const BOUNDARY: &str = "realcheck-test-boundary";

/// Returns queued scores in order, then repeats the last one. Records every
/// path it was asked about and the first pixel of each image it could read.
struct Scripted {
    scores: Vec<f64>,
    calls: Mutex<Vec<PathBuf>>,
    pixels: Mutex<Vec<u8>>,
}

impl Scripted {
    fn new(scores: &[f64]) -> Arc<Self> {
        Arc::new(Self {
            scores: scores.to_vec(),
            calls: Mutex::new(Vec::new()),
            pixels: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Classifier for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn classify(&self, path: &Path) -> ClassifierResult<f64> {
        assert!(path.exists(), "classifier saw a missing file");

        if let Ok(img) = image::open(path) {
            self.pixels.lock().unwrap().push(img.to_rgb8().get_pixel(0, 0)[0]);
        }

        let mut calls = self.calls.lock().unwrap();
        calls.push(path.to_path_buf());
        let i = (calls.len() - 1).min(self.scores.len() - 1);
        Ok(self.scores[i])
    }
}

struct Failing;

#[async_trait]
impl Classifier for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    async fn classify(&self, _path: &Path) -> ClassifierResult<f64> {
        Err(ClassifierError::inference("model exploded"))
    }
}

/// Signals when scoring starts, then never finishes.
struct Stalled {
    entered: Notify,
}

#[async_trait]
impl Classifier for Stalled {
    fn name(&self) -> &str {
        "stalled"
    }

    async fn classify(&self, _path: &Path) -> ClassifierResult<f64> {
        self.entered.notify_one();
        std::future::pending().await
    }
}

/// Ten solid-colour frames; frame `i` has red channel `i * 10`.
struct TenFrames;

#[async_trait]
impl FrameDecoder for TenFrames {
    async fn decode_all(&self, _path: &Path) -> MediaResult<Vec<Frame>> {
        Ok((0..10)
            .map(|i| Frame::new(i, RgbImage::from_pixel(8, 8, Rgb([(i * 10) as u8, 0, 0]))))
            .collect())
    }
}

async fn app(dir: &Path, handle: ClassifierHandle) -> Router {
    app_with_config(dir, handle, ApiConfig::default()).await
}

async fn app_with_config(dir: &Path, handle: ClassifierHandle, config: ApiConfig) -> Router {
    let staging = StagingArea::open(&StagingConfig {
        upload_dir: dir.to_path_buf(),
    })
    .await
    .unwrap();

    let state = AppState::with_parts(
        config,
        staging,
        Arc::new(handle),
        Arc::new(TenFrames),
    );
    create_router(state, None)
}

fn multipart_body(field: &str, filename: Option<&str>, data: &[u8]) -> Vec<u8> {
    let disposition = match filename {
        Some(name) => format!("form-data; name=\"{}\"; filename=\"{}\"", field, name),
        None => format!("form-data; name=\"{}\"", field),
    };

    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(format!("Content-Disposition: {}\r\n", disposition).as_bytes());
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload_request(field: &str, filename: Option<&str>, data: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(field, filename, data)))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn staged_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_image_upload_is_scored_and_removed() {
    let tmp = tempfile::tempdir().unwrap();
    let classifier = Scripted::new(&[12.5]);
    let app = app(tmp.path(), ClassifierHandle::ready(classifier.clone())).await;

    let (status, body) = send(app, upload_request("file", Some("My Photo.png"), b"pixels")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "File uploaded successfully");
    assert_eq!(body["filename"], "My_Photo.png");
    assert_eq!(body["percentage"], 12.5);
    assert_eq!(body["analysis_result"], "87.5% sure this is AI");
    assert_eq!(body["model_used"], true);

    let filepath = PathBuf::from(body["filepath"].as_str().unwrap());
    assert_eq!(filepath, tmp.path().join("My_Photo.png"));
    assert_eq!(*classifier.calls.lock().unwrap(), vec![filepath.clone()]);
    assert!(!filepath.exists());
    assert!(staged_names(tmp.path()).is_empty());
}

#[tokio::test]
async fn test_human_verdict() {
    let tmp = tempfile::tempdir().unwrap();
    let app = app(tmp.path(), ClassifierHandle::ready(Scripted::new(&[73.24]))).await;

    let (status, body) = send(app, upload_request("file", Some("shot.JPG"), b"x")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["percentage"], 73.2);
    assert_eq!(body["analysis_result"], "73.2% sure this is human");
}

#[tokio::test]
async fn test_name_collision_gets_suffix() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("photo.png"), b"already here").unwrap();
    let app = app(tmp.path(), ClassifierHandle::ready(Scripted::new(&[60.0]))).await;

    let (status, body) = send(app, upload_request("file", Some("photo.png"), b"new")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["filename"], "photo.png");
    assert_eq!(
        PathBuf::from(body["filepath"].as_str().unwrap()),
        tmp.path().join("photo_1.png")
    );
    assert_eq!(staged_names(tmp.path()), vec!["photo.png".to_string()]);
    assert_eq!(std::fs::read(tmp.path().join("photo.png")).unwrap(), b"already here");
}

#[tokio::test]
async fn test_disallowed_extension_is_rejected_without_staging() {
    let tmp = tempfile::tempdir().unwrap();
    let classifier = Scripted::new(&[50.0]);
    let app = app(tmp.path(), ClassifierHandle::ready(classifier.clone())).await;

    let (status, body) = send(app, upload_request("file", Some("notes.txt"), b"hi")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "File type not allowed");
    assert!(staged_names(tmp.path()).is_empty());
    assert!(classifier.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_video_only_extension_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let app = app(tmp.path(), ClassifierHandle::ready(Scripted::new(&[50.0]))).await;

    let (status, body) = send(app, upload_request("file", Some("clip.mkv"), b"x")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "File type not allowed");
}

#[tokio::test]
async fn test_empty_filename_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let app = app(tmp.path(), ClassifierHandle::ready(Scripted::new(&[50.0]))).await;

    let (status, body) = send(app, upload_request("file", Some(""), b"x")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file selected");
    assert!(staged_names(tmp.path()).is_empty());
}

#[tokio::test]
async fn test_missing_file_field_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let app = app(tmp.path(), ClassifierHandle::ready(Scripted::new(&[50.0]))).await;

    let (status, body) = send(app, upload_request("document", Some("photo.png"), b"x")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file provided");
}

#[tokio::test]
async fn test_path_components_are_sanitized_away() {
    let tmp = tempfile::tempdir().unwrap();
    let app = app(tmp.path(), ClassifierHandle::ready(Scripted::new(&[50.0]))).await;

    let (status, body) =
        send(app, upload_request("file", Some("../../etc/photo.png"), b"x")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["filename"], "etc_photo.png");
    assert_eq!(
        PathBuf::from(body["filepath"].as_str().unwrap()),
        tmp.path().join("etc_photo.png")
    );
    assert!(staged_names(tmp.path()).is_empty());
}

#[tokio::test]
async fn test_non_multipart_body_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let app = app(tmp.path(), ClassifierHandle::ready(Scripted::new(&[50.0]))).await;

    let request = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_oversized_body_gets_json_413() {
    let tmp = tempfile::tempdir().unwrap();
    let config = ApiConfig {
        max_body_size: 64,
        ..ApiConfig::default()
    };
    let app = app_with_config(tmp.path(), ClassifierHandle::ready(Scripted::new(&[50.0])), config)
        .await;

    let response = app
        .oneshot(upload_request("file", Some("big.png"), &[0u8; 500]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].is_string());
    assert!(staged_names(tmp.path()).is_empty());
}

#[tokio::test]
async fn test_staging_failure_gets_json_500() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("uploads");
    let classifier = Scripted::new(&[50.0]);
    let app = app(&dir, ClassifierHandle::ready(classifier.clone())).await;

    std::fs::remove_dir_all(&dir).unwrap();

    let (status, body) = send(app, upload_request("file", Some("photo.png"), b"x")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body["error"].as_str().unwrap().is_empty());
    assert!(classifier.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_cancelled_request_still_removes_upload() {
    let tmp = tempfile::tempdir().unwrap();
    let classifier = Arc::new(Stalled {
        entered: Notify::new(),
    });
    let app = app(tmp.path(), ClassifierHandle::ready(classifier.clone())).await;

    let task = tokio::spawn(app.oneshot(upload_request("file", Some("photo.png"), b"pixels")));

    classifier.entered.notified().await;
    assert_eq!(staged_names(tmp.path()), vec!["photo.png".to_string()]);

    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());
    assert!(staged_names(tmp.path()).is_empty());
}

#[tokio::test]
async fn test_classifier_error_falls_back_to_random_score() {
    let tmp = tempfile::tempdir().unwrap();
    let app = app(tmp.path(), ClassifierHandle::ready(Arc::new(Failing))).await;

    let (status, body) = send(app, upload_request("file", Some("photo.gif"), b"x")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model_used"], false);
    let percentage = body["percentage"].as_f64().unwrap();
    assert!((0.0..=100.0).contains(&percentage));
    assert!(body["analysis_result"].as_str().unwrap().contains("% sure this is "));
    assert!(staged_names(tmp.path()).is_empty());
}

#[tokio::test]
async fn test_unavailable_model_falls_back_to_random_score() {
    let tmp = tempfile::tempdir().unwrap();
    let app = app(tmp.path(), ClassifierHandle::unavailable()).await;

    let (status, body) = send(app, upload_request("file", Some("photo.jpeg"), b"x")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model_used"], false);
    assert!(staged_names(tmp.path()).is_empty());
}

#[tokio::test]
async fn test_video_scores_three_sampled_frames() {
    let tmp = tempfile::tempdir().unwrap();
    let classifier = Scripted::new(&[10.0, 20.0, 30.0]);
    let app = app(tmp.path(), ClassifierHandle::ready(classifier.clone())).await;

    let (status, body) = send(app, upload_request("file", Some("clip.mp4"), b"video")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["percentage"], 20.0);
    assert_eq!(body["analysis_result"], "80.0% sure this is AI");
    assert_eq!(body["model_used"], true);

    let calls = classifier.calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 3);
    assert!(calls.iter().all(|p| p.extension().is_some_and(|e| e == "png")));

    let mut pixels = classifier.pixels.lock().unwrap().clone();
    pixels.sort();
    pixels.dedup();
    assert_eq!(pixels.len(), 3, "sampled frames must be distinct");

    assert!(staged_names(tmp.path()).is_empty());
}

#[tokio::test]
async fn test_health_reports_model_state() {
    let tmp = tempfile::tempdir().unwrap();

    let loaded = app(tmp.path(), ClassifierHandle::ready(Scripted::new(&[50.0]))).await;
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(loaded, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model_available"], true);

    let missing = app(tmp.path(), ClassifierHandle::unavailable()).await;
    let request = Request::builder().uri("/healthz").body(Body::empty()).unwrap();
    let (status, body) = send(missing, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model_available"], false);
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let tmp = tempfile::tempdir().unwrap();
    let app = app(tmp.path(), ClassifierHandle::unavailable()).await;

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "abc-123")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.headers()["x-request-id"], "abc-123");
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
}
