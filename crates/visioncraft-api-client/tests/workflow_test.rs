//! Upload and transform workflows against a mocked service.
//!
//! Run with: `cargo test -p visioncraft-api-client --test workflow_test`

use base64::{engine::general_purpose::STANDARD, Engine as _};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use std::io::Write;
use std::time::Duration;
use visioncraft_api_client::{
    ApiClient, EditorSession, FilterStep, ImageFile, UploadWorkflow, UpscaleMethod,
    WatermarkPlacement,
};
use visioncraft_core::{
    ClientConfig, ClientError, DecodedImage, ErrorKind, ImageMime, Operation, OperationState,
};

const JPEG_BYTES: [u8; 6] = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
const PNG_BYTES: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

fn client(server: &ServerGuard) -> ApiClient {
    ApiClient::new(&ClientConfig::default().with_base_url(server.url())).unwrap()
}

fn photo() -> ImageFile {
    ImageFile::from_bytes("photo.png", b"raw png bytes".to_vec())
}

async fn mock_upload(server: &mut ServerGuard, filename: &str) -> mockito::Mock {
    server
        .mock("POST", "/api/upload")
        .match_header(
            "content-type",
            Matcher::Regex("^multipart/form-data; boundary=".to_string()),
        )
        .match_body(Matcher::Regex(format!(
            r#"name="image"; filename="{}""#,
            filename
        )))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "filename": filename, "message": "Image uploaded successfully" }).to_string())
        .create_async()
        .await
}

fn png_body() -> String {
    json!({ "success": true, "img": STANDARD.encode(PNG_BYTES) }).to_string()
}

fn compress_body(original: f64, compressed: f64) -> String {
    json!({
        "success": true,
        "img": STANDARD.encode(JPEG_BYTES),
        "original_size": original,
        "compressed_size": compressed,
    })
    .to_string()
}

#[tokio::test]
async fn test_upload_then_compress() {
    let mut server = Server::new_async().await;
    let upload = mock_upload(&mut server, "photo.png").await;
    let compress = server
        .mock("POST", "/api/compress")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({ "filename": "photo.png", "quality": 100 })))
        .with_status(200)
        .with_body(compress_body(200.0, 120.0))
        .create_async()
        .await;

    let session = EditorSession::new(client(&server));
    let asset = session.upload(photo()).await.unwrap();
    assert_eq!(asset.filename(), "photo.png");

    let outcome = session.compress(150).await.unwrap();
    assert_eq!(outcome.saved_percentage(), Some(40));
    assert_eq!(outcome.image.mime(), ImageMime::Jpeg);
    assert_eq!(outcome.image.bytes().as_ref(), &JPEG_BYTES);
    assert!(matches!(
        session.state(Operation::Compress),
        OperationState::Succeeded(_)
    ));

    upload.assert_async().await;
    compress.assert_async().await;
}

#[tokio::test]
async fn test_repeated_compress_is_not_cached() {
    let mut server = Server::new_async().await;
    let _upload = mock_upload(&mut server, "photo.png").await;
    let compress = server
        .mock("POST", "/api/compress")
        .match_body(Matcher::Json(json!({ "filename": "photo.png", "quality": 85 })))
        .with_status(200)
        .with_body(compress_body(100.0, 50.0))
        .expect(2)
        .create_async()
        .await;

    let session = EditorSession::new(client(&server));
    session.upload(photo()).await.unwrap();

    let first = session.compress(85).await.unwrap();
    let second = session.compress(85).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(
        session.state(Operation::Compress),
        OperationState::Succeeded(second)
    );
    compress.assert_async().await;
}

#[tokio::test]
async fn test_failed_upload_keeps_transforms_gated() {
    let mut server = Server::new_async().await;
    let _upload = server
        .mock("POST", "/api/upload")
        .with_status(400)
        .with_body(r#"{"error":"No selected image"}"#)
        .create_async()
        .await;
    let compress = server
        .mock("POST", "/api/compress")
        .expect(0)
        .create_async()
        .await;

    let session = EditorSession::new(client(&server));
    let err = session.upload(photo()).await.unwrap_err();
    assert_eq!(err.to_string(), "No selected image");

    let failure = session.upload_state().failure().cloned().unwrap();
    assert_eq!(failure.kind, ErrorKind::HttpStatus);
    assert!(session.asset().is_none());

    let err = session.compress(85).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoAsset);
    compress.assert_async().await;
}

#[tokio::test]
async fn test_application_failure_is_surfaced() {
    let mut server = Server::new_async().await;
    let _upload = mock_upload(&mut server, "photo.png").await;
    let _compress = server
        .mock("POST", "/api/compress")
        .with_status(200)
        .with_body(r#"{"success":false,"error":"Compression failed"}"#)
        .create_async()
        .await;

    let session = EditorSession::new(client(&server));
    session.upload(photo()).await.unwrap();

    let err = session.compress(85).await.unwrap_err();
    assert!(matches!(err, ClientError::Application(_)));

    let state = session.state(Operation::Compress);
    let failure = state.failure().unwrap();
    assert_eq!(failure.kind, ErrorKind::Application);
    assert_eq!(failure.message, "Compression failed");
}

#[tokio::test]
async fn test_crop_bounds_forwarded_and_server_rejection_surfaced() {
    let mut server = Server::new_async().await;
    let _upload = mock_upload(&mut server, "photo.png").await;
    let _crop = server
        .mock("POST", "/api/crop")
        .match_body(Matcher::Json(json!({
            "filename": "photo.png",
            "left": 10, "top": 10, "right": 200, "bottom": 150
        })))
        .with_status(400)
        .with_body(r#"{"success":false,"error":"Coordinate 'right' is less than 'left'"}"#)
        .create_async()
        .await;

    let session = EditorSession::new(client(&server));
    session.upload(photo()).await.unwrap();

    let err = session.crop(10, 10, 200, 150).await.unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert_eq!(err.to_string(), "Coordinate 'right' is less than 'left'");
}

#[tokio::test]
async fn test_resize_and_convert_read_image_field() {
    let mut server = Server::new_async().await;
    let _upload = mock_upload(&mut server, "photo.png").await;
    let _resize = server
        .mock("POST", "/api/resize")
        .match_body(Matcher::Json(json!({ "filename": "photo.png", "width": 320, "height": 240 })))
        .with_status(200)
        .with_body(json!({ "image": STANDARD.encode(JPEG_BYTES) }).to_string())
        .create_async()
        .await;
    let _convert = server
        .mock("POST", "/api/convert-to-jpg")
        .match_body(Matcher::Json(json!({ "filename": "photo.png" })))
        .with_status(200)
        .with_body(json!({ "image": STANDARD.encode(JPEG_BYTES), "message": "ok" }).to_string())
        .create_async()
        .await;

    let session = EditorSession::new(client(&server));
    session.upload(photo()).await.unwrap();

    let resized = session.resize(320, 240).await.unwrap();
    assert!(resized.sizes.is_none());
    assert_eq!(resized.default_download_name(), "resized_image.jpg");

    let converted = session.convert_to_jpg().await.unwrap();
    assert!(converted.data_uri().starts_with("data:image/jpeg;base64,"));
}

#[tokio::test]
async fn test_malformed_artifact_is_decode_error() {
    let mut server = Server::new_async().await;
    let _upload = mock_upload(&mut server, "photo.png").await;
    let _crop = server
        .mock("POST", "/api/crop")
        .with_status(200)
        .with_body(r#"{"success":true,"img":"%%%not-base64%%%"}"#)
        .create_async()
        .await;

    let session = EditorSession::new(client(&server));
    session.upload(photo()).await.unwrap();

    let err = session.crop(0, 0, 1, 1).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
    assert_eq!(
        session.state(Operation::Crop).failure().map(|f| f.kind),
        Some(ErrorKind::Decode)
    );
}

#[tokio::test]
async fn test_watermark_needs_overlay_upload() {
    let mut server = Server::new_async().await;
    let _upload = mock_upload(&mut server, "photo.png").await;

    let session = EditorSession::new(client(&server));
    session.upload(photo()).await.unwrap();

    let placement = WatermarkPlacement::new(32, 32);
    let err = session.watermark(placement).await.unwrap_err();
    assert!(matches!(err, ClientError::NoAsset("watermark")));
}

#[tokio::test]
async fn test_upload_reset_clears_asset() {
    let mut server = Server::new_async().await;
    let _upload = server
        .mock("POST", "/api/upload")
        .with_status(200)
        .with_body(r#"{"filename":"first.png"}"#)
        .create_async()
        .await;

    let workflow = UploadWorkflow::new(client(&server));
    workflow.upload(photo()).await.unwrap();
    assert_eq!(workflow.asset().unwrap().filename(), "first.png");

    workflow.reset();
    assert!(workflow.asset().is_none());
    assert_eq!(workflow.state(), OperationState::Idle);
}

#[tokio::test]
async fn test_ping_and_filters() {
    let mut server = Server::new_async().await;
    let _ping = server
        .mock("GET", "/api/test")
        .with_status(200)
        .with_body(r#"{"status":"success","message":"Server is running"}"#)
        .create_async()
        .await;
    let _filters = server
        .mock("GET", "/api/filters")
        .with_status(200)
        .with_body(r#"{"threshold":{"methods":["binary","otsu"]},"edge_detection":{"methods":["canny"]}}"#)
        .create_async()
        .await;

    let client = client(&server);
    let status = client.ping().await.unwrap();
    assert_eq!(status.status, "success");

    let filters = client.filters().await.unwrap();
    assert_eq!(filters.len(), 2);
    assert!(filters.contains_key("threshold"));
}

#[tokio::test]
async fn test_overlapping_compress_keeps_newest_result() {
    let mut server = Server::new_async().await;
    let _upload = mock_upload(&mut server, "photo.png").await;
    let slow_body = compress_body(100.0, 10.0);
    let _slow = server
        .mock("POST", "/api/compress")
        .match_body(Matcher::Json(json!({ "filename": "photo.png", "quality": 10 })))
        .with_status(200)
        .with_chunked_body(move |w| {
            std::thread::sleep(Duration::from_millis(600));
            w.write_all(slow_body.as_bytes())
        })
        .create_async()
        .await;
    let _fast = server
        .mock("POST", "/api/compress")
        .match_body(Matcher::Json(json!({ "filename": "photo.png", "quality": 90 })))
        .with_status(200)
        .with_body(compress_body(100.0, 90.0))
        .create_async()
        .await;

    let session = EditorSession::new(client(&server));
    session.upload(photo()).await.unwrap();

    let (older, newer) = tokio::join!(session.compress(10), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        session.compress(90).await
    });

    // Each caller still gets its own answer.
    assert_eq!(older.unwrap().saved_percentage(), Some(90));
    assert_eq!(newer.unwrap().saved_percentage(), Some(10));

    let state = session.state(Operation::Compress);
    assert_eq!(
        state.succeeded().and_then(|outcome| outcome.saved_percentage()),
        Some(10)
    );
}

#[tokio::test]
async fn test_upscale_sends_method_and_saves_artifact() {
    let mut server = Server::new_async().await;
    let _upload = mock_upload(&mut server, "photo.png").await;
    let upscale = server
        .mock("POST", "/api/upscale")
        .match_body(Matcher::Json(json!({ "filename": "photo.png", "method": "bicubic" })))
        .with_status(200)
        .with_body(png_body())
        .create_async()
        .await;

    let session = EditorSession::new(client(&server));
    session.upload(photo()).await.unwrap();

    let outcome = session.upscale(UpscaleMethod::Bicubic).await.unwrap();
    assert_eq!(outcome.image.mime(), ImageMime::Png);

    let dir = tempfile::tempdir().unwrap();
    let path = outcome
        .image
        .save_to_dir(dir.path(), outcome.operation)
        .await
        .unwrap();
    assert_eq!(path, dir.path().join("upscaled_image.png"));
    assert_eq!(std::fs::read(&path).unwrap(), PNG_BYTES);

    upscale.assert_async().await;
}

#[tokio::test]
async fn test_remove_background_returns_png() {
    let mut server = Server::new_async().await;
    let _upload = mock_upload(&mut server, "photo.png").await;
    let _remove = server
        .mock("POST", "/api/remove-background")
        .match_body(Matcher::Json(json!({ "filename": "photo.png" })))
        .with_status(200)
        .with_body(png_body())
        .create_async()
        .await;

    let session = EditorSession::new(client(&server));
    session.upload(photo()).await.unwrap();

    let outcome = session.remove_background().await.unwrap();
    assert!(outcome.data_uri().starts_with("data:image/png;base64,"));
    assert_eq!(outcome.default_download_name(), "no_background.png");
}

#[tokio::test]
async fn test_watermark_sends_overlay_and_clamped_opacity() {
    let mut server = Server::new_async().await;
    let _upload = mock_upload(&mut server, "photo.png").await;
    let _overlay = mock_upload(&mut server, "logo.png").await;
    let watermark = server
        .mock("POST", "/api/watermark")
        .match_body(Matcher::Json(json!({
            "filename": "photo.png",
            "watermark_filename": "logo.png",
            "x": 5, "y": 6, "width": 64, "height": 32, "opacity": 1.0
        })))
        .with_status(200)
        .with_body(png_body())
        .create_async()
        .await;

    let session = EditorSession::new(client(&server));
    session.upload(photo()).await.unwrap();
    session
        .upload_watermark(ImageFile::from_bytes("logo.png", b"raw logo bytes".to_vec()))
        .await
        .unwrap();

    let placement = WatermarkPlacement::new(64, 32).at(5, 6).with_opacity(2.5);
    let outcome = session.watermark(placement).await.unwrap();
    assert_eq!(outcome.default_download_name(), "watermarked_image.png");

    watermark.assert_async().await;
}

#[tokio::test]
async fn test_blur_face() {
    let mut server = Server::new_async().await;
    let _upload = mock_upload(&mut server, "photo.png").await;
    let _blur = server
        .mock("POST", "/api/blur-face")
        .match_body(Matcher::Json(json!({ "filename": "photo.png" })))
        .with_status(200)
        .with_body(compress_body(80.0, 80.0))
        .create_async()
        .await;

    let session = EditorSession::new(client(&server));
    session.upload(photo()).await.unwrap();

    let outcome = session.blur_face().await.unwrap();
    assert_eq!(outcome.saved_percentage(), Some(0));
    assert_eq!(outcome.default_download_name(), "blurred_image.jpg");
    assert!(matches!(
        session.state(Operation::BlurFace),
        OperationState::Succeeded(_)
    ));
}

#[tokio::test]
async fn test_process_runs_filter_pipeline() {
    let mut server = Server::new_async().await;
    let source = DecodedImage::from_bytes(JPEG_BYTES.to_vec(), ImageMime::Jpeg);
    let process = server
        .mock("POST", "/api/process")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({
            "image": source.data_uri(),
            "operations": [
                { "type": "threshold", "params": { "method": "otsu" } },
                { "type": "edge_detection", "params": { "method": "canny", "low": 50 } }
            ]
        })))
        .with_status(200)
        .with_body(
            json!({
                "status": "success",
                "image": format!("data:image/png;base64,{}", STANDARD.encode(PNG_BYTES)),
            })
            .to_string(),
        )
        .create_async()
        .await;

    let steps = [
        FilterStep::new("threshold").param("method", "otsu"),
        FilterStep::new("edge_detection")
            .param("method", "canny")
            .param("low", 50),
    ];
    let processed = client(&server).process(&source, &steps).await.unwrap();

    assert_eq!(processed.mime(), ImageMime::Png);
    assert_eq!(processed.bytes().as_ref(), &PNG_BYTES);
    process.assert_async().await;
}

#[tokio::test]
async fn test_process_error_message_is_surfaced() {
    let mut server = Server::new_async().await;
    let _process = server
        .mock("POST", "/api/process")
        .with_status(400)
        .with_body(r#"{"status":"error","message":"Missing required fields"}"#)
        .create_async()
        .await;

    let source = DecodedImage::from_bytes(JPEG_BYTES.to_vec(), ImageMime::Jpeg);
    let err = client(&server)
        .process(&source, &[FilterStep::new("threshold")])
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(400));
    assert_eq!(err.to_string(), "Missing required fields");
}
