use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use parking_lot::Mutex;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use clipstyler::app::create_app;
use clipstyler::common::error::{AppError, AppResult};
use clipstyler::common::time::TimeRange;
use clipstyler::config::settings::AppConfig;
use clipstyler::infrastructure::downloader::{DownloadedVideo, VideoDownloader, VideoInfo};
use clipstyler::infrastructure::llm::{FormattedText, TextFormatter};
use clipstyler::infrastructure::media::{CompositeJob, PreviewExtractor, TemplateCompositor};
use clipstyler::infrastructure::storage::{JobId, JobStore};
use clipstyler::state::AppState;

const RAW_BYTES: &[u8] = b"raw video bytes";
const RENDERED_BYTES: &[u8] = b"rendered video bytes";

struct FakeDownloader {
    fail: bool,
    reported_ext: &'static str,
    written_ext: &'static str,
    ranges: Mutex<Vec<TimeRange>>,
}

impl FakeDownloader {
    fn ok() -> Self {
        Self {
            fail: false,
            reported_ext: "mp4",
            written_ext: "mp4",
            ranges: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl VideoDownloader for FakeDownloader {
    async fn fetch_info(&self, _url: &str) -> AppResult<VideoInfo> {
        Ok(VideoInfo {
            title: "Test Clip".into(),
            duration: Some(42.0),
            thumbnail: None,
            uploader: Some("someone".into()),
            extractor: Some("generic".into()),
            webpage_url: None,
            width: Some(1280),
            height: Some(720),
        })
    }

    async fn download(&self, _url: &str, output_stem: &Path, range: &TimeRange) -> AppResult<DownloadedVideo> {
        self.ranges.lock().push(*range);
        let stem = output_stem.display();

        if self.fail {
            std::fs::write(format!("{}.mp4.part", stem), b"partial").unwrap();
            std::fs::write(format!("{}.f137.mp4", stem), b"fragment").unwrap();
            return Err(AppError::tool("yt-dlp", "ERROR: Unsupported URL"));
        }

        std::fs::write(format!("{}.{}", stem, self.written_ext), RAW_BYTES).unwrap();
        Ok(DownloadedVideo {
            title: "Test Clip".into(),
            ext: Some(self.reported_ext.into()),
        })
    }
}

struct FakePreview;

#[async_trait]
impl PreviewExtractor for FakePreview {
    async fn extract(&self, _video: &Path, output: &Path) -> AppResult<(u32, u32)> {
        std::fs::write(output, b"jpeg").unwrap();
        Ok((1280, 720))
    }
}

enum FakeFormatter {
    Passthrough,
    Fixed(FormattedText),
}

#[async_trait]
impl TextFormatter for FakeFormatter {
    async fn format(&self, raw: &str) -> AppResult<FormattedText> {
        match self {
            FakeFormatter::Passthrough => Ok(FormattedText::passthrough(raw)),
            FakeFormatter::Fixed(text) => Ok(text.clone()),
        }
    }
}

#[derive(Default)]
struct FakeCompositor {
    fail: bool,
    jobs: Mutex<Vec<CompositeJob>>,
}

#[async_trait]
impl TemplateCompositor for FakeCompositor {
    async fn compose(&self, job: &CompositeJob) -> AppResult<()> {
        self.jobs.lock().push(job.clone());
        if self.fail {
            std::fs::write(&job.output, b"half written").unwrap();
            return Err(AppError::tool("ffmpeg", "Conversion failed!"));
        }
        std::fs::write(&job.output, RENDERED_BYTES).unwrap();
        Ok(())
    }
}

struct TestApp {
    dir: TempDir,
    router: Router,
    store: JobStore,
    downloader: Arc<FakeDownloader>,
    compositor: Arc<FakeCompositor>,
}

impl TestApp {
    fn build(downloader: FakeDownloader, formatter: FakeFormatter, compositor: FakeCompositor) -> Self {
        let dir = TempDir::new().unwrap();
        let downloader = Arc::new(downloader);
        let compositor = Arc::new(compositor);
        let state = AppState::new(
            AppConfig::with_download_dir(dir.path()),
            downloader.clone(),
            Arc::new(FakePreview),
            Arc::new(formatter),
            compositor.clone(),
        );
        Self {
            dir,
            store: state.store.clone(),
            router: create_app(state),
            downloader,
            compositor,
        }
    }

    fn new() -> Self {
        Self::build(FakeDownloader::ok(), FakeFormatter::Passthrough, FakeCompositor::default())
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    async fn call(&self, method: &str, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
        let (status, body) = self.send(request).await;
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    async fn prepare(&self) -> Value {
        let (status, body) = self
            .call("POST", "/prepare?url=https://example.com/watch?v=1&start_time=00:00:05&end_time=00:00:10")
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body
    }

    fn files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn path(&self, name: &str) -> std::path::PathBuf {
        self.dir.path().join(name)
    }
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");
}

#[tokio::test]
async fn test_index_serves_frontend() {
    let app = TestApp::new();
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8_lossy(&body).contains("<html"));
}

#[tokio::test]
async fn test_info_returns_metadata() {
    let app = TestApp::new();
    let (status, body) = app.call("GET", "/info?url=https://example.com/v").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Test Clip");
    assert_eq!(body["duration"], 42.0);
    assert!(body.get("thumbnail").is_none());
}

#[tokio::test]
async fn test_info_rejects_non_http_url() {
    let app = TestApp::new();
    let (status, body) = app.call("GET", "/info?url=ftp://example.com/v").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_missing_url_is_bad_request_with_detail() {
    let app = TestApp::new();
    let (status, body) = app.call("POST", "/prepare").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("url"));
}

#[tokio::test]
async fn test_prepare_then_render_scenario() {
    let app = TestApp::new();

    let prepared = app.prepare().await;
    let id = prepared["video_id"].as_str().unwrap().to_string();
    assert_eq!(prepared["title"], "Test Clip");
    assert_eq!(prepared["preview"], format!("{}_preview.jpg", id));
    assert_eq!(prepared["width"], 1280);
    assert_eq!(prepared["height"], 720);
    assert_eq!(
        app.downloader.ranges.lock().as_slice(),
        &[TimeRange { start: Some(5), end: Some(10) }]
    );
    assert!(app.path(&format!("{}_raw.mp4", id)).exists());
    assert!(app.path(&format!("{}_preview.jpg", id)).exists());

    let (status, rendered) = app
        .call("POST", &format!("/download?video_id={}&overlay_text=hello&username=alice", id))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", rendered);
    assert_eq!(rendered["file"], format!("{}.mp4", id));
    assert_eq!(rendered["title"], "Test Clip");

    // Only the final video remains.
    assert_eq!(app.files(), vec![format!("{}.mp4", id)]);
    assert_eq!(std::fs::read(app.path(&format!("{}.mp4", id))).unwrap(), RENDERED_BYTES);

    let jobs = app.compositor.jobs.lock();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].body, "hello");
    assert_eq!(jobs[0].username, "alice");
    assert!(jobs[0].background_image.is_none());
}

#[tokio::test]
async fn test_prepare_failure_leaves_no_files() {
    let downloader = FakeDownloader { fail: true, ..FakeDownloader::ok() };
    let app = TestApp::build(downloader, FakeFormatter::Passthrough, FakeCompositor::default());

    let (status, body) = app.call("POST", "/prepare?url=https://example.com/v").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("Unsupported URL"));
    assert!(app.files().is_empty(), "left behind: {:?}", app.files());
}

#[tokio::test]
async fn test_prepare_rejects_bad_time() {
    let app = TestApp::new();
    let (status, body) = app
        .call("POST", "/prepare?url=https://example.com/v&start_time=1:2:3:4")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().starts_with("Invalid time format"));
    assert!(app.downloader.ranges.lock().is_empty());
}

#[tokio::test]
async fn test_render_unknown_video_id() {
    let app = TestApp::new();

    for id in ["0b8f3a52-6c1e-4d7a-9a3e-2f1c5d6e7a8b", "nonexistent"] {
        let (status, body) = app.call("POST", &format!("/download?video_id={}&overlay_text=hi", id)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Prepared video not found");
    }
    assert!(app.files().is_empty());
}

#[tokio::test]
async fn test_render_requires_source() {
    let app = TestApp::new();
    let (status, body) = app.call("POST", "/download?overlay_text=hi").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Either url or video_id required");
}

#[tokio::test]
async fn test_render_without_caption_keeps_raw_bytes() {
    let app = TestApp::new();
    let id = app.prepare().await["video_id"].as_str().unwrap().to_string();

    let (status, body) = app.call("POST", &format!("/download?video_id={}", id)).await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    assert_eq!(std::fs::read(app.path(&format!("{}.mp4", id))).unwrap(), RAW_BYTES);
    assert!(!app.path(&format!("{}_raw.mp4", id)).exists());
    assert!(app.compositor.jobs.lock().is_empty());
}

#[tokio::test]
async fn test_empty_formatted_body_without_username_skips_template() {
    let formatter = FakeFormatter::Fixed(FormattedText {
        title: "Headline".into(),
        body: String::new(),
    });
    let app = TestApp::build(FakeDownloader::ok(), formatter, FakeCompositor::default());
    let id = app.prepare().await["video_id"].as_str().unwrap().to_string();

    let (status, _) = app
        .call("POST", &format!("/download?video_id={}&overlay_text=something", id))
        .await;
    assert_eq!(status, StatusCode::OK);

    // The caption was lost and the raw file published as-is.
    assert!(app.compositor.jobs.lock().is_empty());
    assert_eq!(std::fs::read(app.path(&format!("{}.mp4", id))).unwrap(), RAW_BYTES);
}

#[tokio::test]
async fn test_failed_render_removes_raw_and_output() {
    let compositor = FakeCompositor { fail: true, ..Default::default() };
    let app = TestApp::build(FakeDownloader::ok(), FakeFormatter::Passthrough, compositor);
    let id = app.prepare().await["video_id"].as_str().unwrap().to_string();

    let (status, body) = app
        .call("POST", &format!("/download?video_id={}&overlay_text=hello", id))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().starts_with("ffmpeg failed"));

    assert!(!app.path(&format!("{}_raw.mp4", id)).exists());
    assert!(!app.path(&format!("{}.mp4", id)).exists());

    // A second attempt finds nothing to render.
    let (_, body) = app
        .call("POST", &format!("/download?video_id={}&overlay_text=hello", id))
        .await;
    assert_eq!(body["detail"], "Prepared video not found");
}

#[tokio::test]
async fn test_extension_mismatch_resolved_by_scan() {
    let downloader = FakeDownloader {
        reported_ext: "mp4",
        written_ext: "webm",
        ..FakeDownloader::ok()
    };
    let app = TestApp::build(downloader, FakeFormatter::Passthrough, FakeCompositor::default());
    let id = app.prepare().await["video_id"].as_str().unwrap().to_string();
    assert!(app.path(&format!("{}_raw.webm", id)).exists());

    let (status, _) = app
        .call("POST", &format!("/download?video_id={}&username=alice", id))
        .await;
    assert_eq!(status, StatusCode::OK);

    let jobs = app.compositor.jobs.lock();
    assert!(jobs[0].input.to_string_lossy().ends_with("_raw.webm"));
}

#[tokio::test]
async fn test_render_from_fresh_url() {
    let app = TestApp::new();
    let (status, body) = app
        .call(
            "POST",
            "/download?url=https://example.com/v&overlay_text=hello&platform=tiktok&color1=%23ff0000&gradient_angle=vertical&crop_x=10&crop_w=80",
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["title"], "Test Clip");

    let file = body["file"].as_str().unwrap();
    assert_eq!(app.files(), vec![file.to_string()]);

    let jobs = app.compositor.jobs.lock();
    assert_eq!(jobs[0].platform.label(), "TikTok");
    assert_eq!(jobs[0].color1.to_string(), "#ff0000");
    assert_eq!(jobs[0].crop.x, 10.0);
    assert_eq!(jobs[0].crop.w, 80.0);
}

#[tokio::test]
async fn test_render_rejects_bad_options() {
    let app = TestApp::new();
    for query in [
        "url=https://example.com/v&crop_x=50&crop_w=60",
        "url=https://example.com/v&crop_h=150",
        "url=https://example.com/v&platform=myspace",
        "url=https://example.com/v&color2=purple",
    ] {
        let (status, body) = app.call("POST", &format!("/download?{}", query)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", query);
        assert!(body["detail"].is_string());
    }
    assert!(app.downloader.ranges.lock().is_empty());
}

#[tokio::test]
async fn test_file_rejects_traversal() {
    let app = TestApp::new();
    let outside = app.dir.path().parent().unwrap().join("outside.txt");

    for uri in ["/file/..%2Foutside.txt", "/file/a%2Fb", "/file/.."] {
        let (status, body) = app.call("GET", uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["detail"], "Invalid filename");
    }
    assert!(!outside.exists());
}

#[tokio::test]
async fn test_file_missing() {
    let app = TestApp::new();
    let (status, body) = app.call("GET", "/file/nothing.mp4").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "File not found");
}

#[tokio::test]
async fn test_file_streams_content() {
    let app = TestApp::new();
    let preview = app.prepare().await["preview"].as_str().unwrap().to_string();

    let request = Request::builder().uri(format!("/file/{}", preview)).body(Body::empty()).unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
    assert!(response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .contains(&preview));

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"jpeg");
}

fn multipart_request(file_name: &str, content_type: &str, data: &[u8]) -> Request<Body> {
    let boundary = "XBOUNDARYX";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            file_name, content_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/upload-bg")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_upload_background_and_render_with_it() {
    let app = TestApp::new();

    let (status, body) = app.send(multipart_request("beach.JPG", "image/jpeg", b"fake jpeg")).await;
    assert_eq!(status, StatusCode::OK);
    let uploaded: Value = serde_json::from_slice(&body).unwrap();
    let bg_id = uploaded["id"].as_str().unwrap().to_string();
    assert!(bg_id.starts_with("bg_") && bg_id.ends_with(".jpg"));
    assert_eq!(std::fs::read(app.path(&bg_id)).unwrap(), b"fake jpeg");

    let (status, _) = app
        .call(
            "POST",
            &format!("/download?url=https://example.com/v&username=alice&bg_type=image&bg_image_id={}", bg_id),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let jobs = app.compositor.jobs.lock();
    assert_eq!(jobs[0].background_image.as_deref(), Some(app.path(&bg_id).as_path()));
}

#[tokio::test]
async fn test_upload_rejects_non_image() {
    let app = TestApp::new();
    let (status, body) = app.send(multipart_request("notes.txt", "text/plain", b"hello")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert!(body["detail"].as_str().unwrap().contains("image/*"));
    assert!(app.files().is_empty());
}

#[tokio::test]
async fn test_render_with_missing_background() {
    let app = TestApp::new();
    let (status, body) = app
        .call(
            "POST",
            "/download?url=https://example.com/v&username=alice&bg_type=image&bg_image_id=bg_missing.png",
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Background image not found");
    assert!(app.downloader.ranges.lock().is_empty());
}

#[tokio::test]
async fn test_repeated_render_keeps_finished_video() {
    let app = TestApp::new();
    let id = app.prepare().await["video_id"].as_str().unwrap().to_string();
    let uri = format!("/download?video_id={}&overlay_text=hello&username=alice", id);

    let (status, _) = app.call("POST", &uri).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.call("POST", &uri).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Prepared video not found");

    assert_eq!(std::fs::read(app.path(&format!("{}.mp4", id))).unwrap(), RENDERED_BYTES);
}

#[tokio::test]
async fn test_render_releases_index_entry() {
    let app = TestApp::new();
    let id = app.prepare().await["video_id"].as_str().unwrap().to_string();
    let job = JobId::parse(&id).unwrap();
    assert_eq!(app.store.title(job).as_deref(), Some("Test Clip"));

    let (status, _) = app
        .call("POST", &format!("/download?video_id={}&username=alice", id))
        .await;
    assert_eq!(status, StatusCode::OK);

    assert!(app.store.files(job).raw.is_none());
    assert_eq!(app.store.tracked_jobs(), 0);

    let (status, _) = app.call("POST", "/download?url=https://example.com/v&username=bob").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.store.tracked_jobs(), 0);
}

#[tokio::test]
async fn test_fresh_render_download_failure_leaves_no_files() {
    let downloader = FakeDownloader { fail: true, ..FakeDownloader::ok() };
    let app = TestApp::build(downloader, FakeFormatter::Passthrough, FakeCompositor::default());

    let (status, body) = app
        .call("POST", "/download?url=https://example.com/v&overlay_text=hello")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().starts_with("yt-dlp failed"));
    assert!(app.files().is_empty(), "left behind: {:?}", app.files());
    assert!(app.compositor.jobs.lock().is_empty());
    assert_eq!(app.store.tracked_jobs(), 0);
}

#[tokio::test]
async fn test_file_name_with_quote_is_escaped() {
    let app = TestApp::new();
    std::fs::write(app.path("a\"b.mp4"), b"video").unwrap();

    let request = Request::builder().uri("/file/a%22b.mp4").body(Body::empty()).unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"a\\\"b.mp4\""
    );
}
