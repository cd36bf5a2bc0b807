use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use ingest::pose::PoseFrame;
use ingest::trainer::{EpochUpdate, TrainerEvent};
use ingest::{InlineData, MediaToolkit, PoseEstimator, RankingSource, Result, Trainer, VideoMetadata, VisionModel};
use serde_json::{Value, json};
use storage::Database;
use storage::dto::training::TrainRequest;
use storage::models::RankingCategory;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;
use web::state::{AppState, Collaborators, Settings};

struct FakeMedia;

#[async_trait::async_trait]
impl MediaToolkit for FakeMedia {
    async fn video_duration(&self, _video: &Path) -> Result<f64> {
        Ok(4.0)
    }

    async fn extract_frame(&self, _video: &Path, _at_seconds: f64, output: &Path) -> Result<()> {
        tokio::fs::write(output, b"jpeg").await?;
        Ok(())
    }

    async fn download(&self, _url: &str, output: &Path) -> Result<VideoMetadata> {
        tokio::fs::create_dir_all(output.parent().unwrap()).await?;
        tokio::fs::write(output, b"full match").await?;
        Ok(VideoMetadata::default())
    }

    async fn video_info(&self, _url: &str) -> Result<VideoMetadata> {
        Ok(VideoMetadata {
            title: "WANG Chuqin vs FAN Zhendong | Final".to_string(),
            duration: Some(1800.0),
            ..Default::default()
        })
    }

    async fn trim(&self, _input: &Path, _start: f64, _duration: f64, output: &Path) -> Result<()> {
        tokio::fs::create_dir_all(output.parent().unwrap()).await?;
        tokio::fs::write(output, b"clip").await?;
        Ok(())
    }
}

struct FakePose;

#[async_trait::async_trait]
impl PoseEstimator for FakePose {
    async fn estimate(&self, _media: &Path) -> Result<Vec<PoseFrame>> {
        Ok(vec![PoseFrame {
            frame_number: 0,
            landmarks: None,
        }])
    }
}

struct FakeRankings;

#[async_trait::async_trait]
impl RankingSource for FakeRankings {
    async fn fetch(&self, category: RankingCategory) -> Result<Value> {
        Ok(json!({"Result": [
            {"SubEventCode": category.sub_event_code(), "CurrentRank": 1, "PlayerName": "WANG Chuqin",
             "CountryName": "China", "CountryCode": "CHN", "RankingPointsYTD": 9000, "IttfId": "121558"},
            {"SubEventCode": category.sub_event_code(), "CurrentRank": 2, "PlayerName": "FAN Zhendong",
             "CountryName": "China", "CountryCode": "CHN", "RankingPointsYTD": 8000, "IttfId": "101929"}
        ]}))
    }
}

struct FakeModel;

#[async_trait::async_trait]
impl VisionModel for FakeModel {
    fn model_name(&self) -> &str {
        "fake"
    }

    async fn generate_json(&self, _prompt: &str, _media: &[InlineData]) -> Result<Value> {
        Ok(json!({
            "match_summary": {"overall_performance": "sharp forehand"},
            "scoring_clips": [
                {"start_seconds": 40.0, "end_seconds": 47.0, "technique": "forehand loop", "quality_label": "good"},
                {"start_seconds": 12.0, "end_seconds": 18.0, "technique": "serve", "quality_label": "normal"}
            ],
            "losing_clips": [
                {"start_seconds": 70.0, "end_seconds": 76.0, "technique": "push", "quality_label": "bad", "quality_reason": "too high"}
            ]
        }))
    }
}

struct FakeTrainer;

#[async_trait::async_trait]
impl Trainer for FakeTrainer {
    async fn run(&self, config: &TrainRequest, events: mpsc::UnboundedSender<TrainerEvent>) -> Result<()> {
        for epoch in 1..=config.epochs {
            let _ = events.send(TrainerEvent::Epoch(EpochUpdate {
                epoch,
                total_epochs: Some(config.epochs),
                accuracy: Some(0.8),
                val_accuracy: None,
                loss: Some(0.2),
                val_loss: None,
            }));
        }
        let _ = events.send(TrainerEvent::Result(json!({"accuracy": 0.8})));
        Ok(())
    }
}

struct TestApp {
    router: Router,
    _dir: TempDir,
    training_dir: PathBuf,
}

async fn test_app() -> TestApp {
    test_app_with(None).await
}

async fn test_app_with(model: Option<Arc<dyn VisionModel>>) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::in_memory().await.unwrap();
    db.run_migrations().await.unwrap();

    let collaborators = Collaborators {
        media: Arc::new(FakeMedia),
        pose: Arc::new(FakePose),
        model,
        rankings: Arc::new(FakeRankings),
        trainer: Arc::new(FakeTrainer),
    };

    let settings = Settings {
        data_dir: dir.path().join("data"),
        training_dir: dir.path().join("training"),
        upload_dir: dir.path().join("data/uploads"),
        gemini_model: "gemini-2.5-pro".to_string(),
    };
    let training_dir = settings.training_dir.clone();

    let state = AppState::new(db, collaborators, settings);

    TestApp {
        router: web::build_app(state, &["*".to_string()]),
        _dir: dir,
        training_dir,
    }
}

impl TestApp {
    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn send_text(&self, method: Method, uri: &str, body: &'static str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap();
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn upload(&self, uri: &str, files: &[(&str, &str, &[u8])]) -> (StatusCode, Value) {
        let boundary = "clipboundary";
        let mut body = Vec::new();
        for (field, filename, data) in files {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                    boundary, field, filename
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
            .body(Body::from(body))
            .unwrap();
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body)).await
    }
}

fn match_analysis() -> Value {
    json!({
        "video_url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
        "point_losses": [
            {"start_seconds": 10.0, "end_seconds": 16.0, "loss_type": "net", "description": "push into the net"},
            {"timestamp_display": "1:05", "loss_type": "out", "description": "long"}
        ],
        "point_wins": [
            {"start_seconds": 30.0, "end_seconds": 36.0, "win_type": "loop", "description": "forehand"}
        ]
    })
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = test_app().await;

    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (_, body) = app.get("/api/health").await;
    assert_eq!(body["message"], "Server is running");

    let (_, body) = app.get("/api/auto-train/health").await;
    assert_eq!(body["service"], "auto_training");
}

#[tokio::test]
async fn test_clip_review_flow() {
    let app = test_app().await;

    let (status, body) = app
        .post("/api/auto-train/import", json!({"analysis_result": match_analysis()}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["imported_count"], 3);

    let (_, body) = app.get("/api/auto-train/clips?status=pending").await;
    assert_eq!(body["total"], 3);
    let ids: Vec<String> = body["clips"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["clip_id"].as_str().unwrap().to_string())
        .collect();

    let (status, body) = app
        .post(&format!("/api/auto-train/clips/{}/approve", ids[0]), json!({"label": "normal"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["clip"]["status"], "approved");
    assert_eq!(body["clip"]["label"], "normal");
    assert_eq!(body["clip"]["label_confidence"], 1.0);

    // approving twice is a no-op
    let (status, _) = app
        .send(Method::POST, &format!("/api/auto-train/clips/{}/approve", ids[0]), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send(Method::POST, &format!("/api/auto-train/clips/{}/reject", ids[0]), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);

    let (status, _) = app
        .send(Method::POST, &format!("/api/auto-train/clips/{}/reject", ids[1]), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(Method::POST, &format!("/api/auto-train/clips/{}/approve", ids[1]), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .send(Method::DELETE, &format!("/api/auto-train/clips/{}", ids[2]), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get(&format!("/api/auto-train/clips/{}", ids[2])).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app.get("/api/auto-train/clips").await;
    assert_eq!(body["total"], 2);

    let (_, body) = app.get("/api/auto-train/statistics").await;
    let stats = &body["statistics"];
    assert_eq!(stats["total"], 2);
    assert_eq!(stats["by_status"]["approved"], 1);
    assert_eq!(stats["by_status"]["rejected"], 1);
    let label_sum: u64 = stats["by_label"].as_object().unwrap().values().map(|v| v.as_u64().unwrap()).sum();
    assert_eq!(label_sum, 2);

    let (status, _) = app.get("/api/auto-train/clips?status=archived").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

fn assert_error_body(status: StatusCode, body: &Value) {
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false, "unexpected body {}", body);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_rejected_bodies_use_error_envelope() {
    let app = test_app().await;

    let (_, body) = app
        .post("/api/auto-train/import", json!({"analysis_result": match_analysis()}))
        .await;
    let id = body["clips"][0]["clip_id"].as_str().unwrap().to_string();
    let label = body["clips"][0]["label"].clone();

    let (status, body) = app
        .post(&format!("/api/auto-train/clips/{}/approve", id), json!({"label": "great"}))
        .await;
    assert_error_body(status, &body);

    let (_, body) = app.get(&format!("/api/auto-train/clips/{}", id)).await;
    assert_eq!(body["clip"]["status"], "pending");
    assert_eq!(body["clip"]["label"], label);

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/auto-train/clips/{}/label", id),
            Some(json!({"label": "great"})),
        )
        .await;
    assert_error_body(status, &body);

    let (status, body) = app
        .send_text(Method::POST, "/api/auto-train/import", "{\"analysis_result\": ")
        .await;
    assert_error_body(status, &body);

    let (status, body) = app.get("/api/players?page=first").await;
    assert_error_body(status, &body);

    // an empty approve body still approves
    let (status, body) = app
        .send(Method::POST, &format!("/api/auto-train/clips/{}/approve", id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["clip"]["status"], "approved");
}

#[tokio::test]
async fn test_process_and_export() {
    let app = test_app().await;

    let (_, body) = app
        .post(
            "/api/auto-train/import",
            json!({"analysis_result": match_analysis(), "auto_approve": true, "confidence_threshold": 0.0}),
        )
        .await;
    let clips = body["clips"].as_array().unwrap().clone();
    assert!(clips.iter().all(|c| c["status"] == "approved"));

    let first = clips[0]["clip_id"].as_str().unwrap();
    let (status, body) = app
        .send(Method::POST, &format!("/api/auto-train/clips/{}/process", first), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["clip"]["status"], "processed");

    // already processed clips cannot be processed again
    let (status, _) = app
        .send(Method::POST, &format!("/api/auto-train/clips/{}/process", first), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = app.send(Method::POST, "/api/auto-train/process-all", None).await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["success"], 2);
    assert_eq!(body["failed"], 0);
    assert!(body["details"][0]["skeleton_path"].as_str().unwrap().ends_with("skeleton.json"));

    let (status, body) = app.send(Method::POST, "/api/auto-train/export", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["exported"]["bad"], 2);
    assert_eq!(body["exported"]["good"], 1);
    assert!(app.training_dir.join("good_input_movid").is_dir());

    let (_, again) = app.send(Method::POST, "/api/auto-train/export", None).await;
    assert_eq!(again["exported"], body["exported"]);

    let (_, batch) = app.get("/api/auto-train/training-batch?label=good").await;
    assert_eq!(batch["total"], 1);

    let (_, body) = app.send(Method::DELETE, "/api/auto-train/clips", None).await;
    assert_eq!(body["deleted"], 3);
}

#[tokio::test]
async fn test_prediction_is_symmetric() {
    let app = test_app().await;

    let (status, forward) = app
        .post("/api/predict/match", json!({"player1": "Fan Zhendong", "player2": "Ma Long"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, reverse) = app
        .post("/api/predict/match", json!({"player1": "Ma Long", "player2": "Fan Zhendong"}))
        .await;

    let f = &forward["prediction"];
    let r = &reverse["prediction"];
    assert_eq!(f["player1_win_prob"], r["player2_win_prob"]);
    assert_eq!(f["player2_win_prob"], r["player1_win_prob"]);
    assert_eq!(f["predicted_winner"], r["predicted_winner"]);

    let sum = f["player1_win_prob"].as_f64().unwrap() + f["player2_win_prob"].as_f64().unwrap();
    assert!((sum - 1.0).abs() < 1e-9);

    let (status, _) = app
        .post("/api/predict/match", json!({"player1": "Ma Long", "player2": "ma long"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post("/api/predict/match", json!({"player1": "Ma Long", "player2": "Nobody"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.get("/api/predict/stats/Ma%20Long").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app.get("/api/predict/h2h?player1=Ma%20Long&player2=Fan%20Zhendong").await;
    assert!(body["head_to_head"].is_null());
    assert!(body["message"].is_string());

    let (_, body) = app.get("/api/predict/players?gender=women").await;
    assert_eq!(body["total"], 10);
    assert_eq!(body["players"][0]["rank"], 1);
}

#[tokio::test]
async fn test_rankings_fetched_on_cache_miss() {
    let app = test_app().await;

    let (status, _) = app.get("/api/rankings/JUNIOR").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.get("/api/rankings/SEN_SINGLES").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_records"], 2);
    assert_eq!(body["players"][0]["name"], "WANG Chuqin");

    let (_, body) = app.get("/api/players?search=fan").await;
    assert_eq!(body["pagination"]["total_items"], 1);
    assert_eq!(body["data"][0]["ittf_id"], "101929");

    let (status, _) = app.get("/api/players/404").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app.send(Method::POST, "/api/update", None).await;
    assert_eq!(body["results"].as_object().unwrap().len(), 5);
    assert!(body["results"].as_object().unwrap().values().all(|v| v == "success"));
}

#[tokio::test]
async fn test_youtube_endpoints_without_model() {
    let app = test_app().await;

    let (_, body) = app
        .post("/api/youtube/validate", json!({"url": "https://youtu.be/dQw4w9WgXcQ"}))
        .await;
    assert_eq!(body["valid"], true);
    assert_eq!(body["video_id"], "dQw4w9WgXcQ");

    let (status, _) = app
        .post("/api/youtube/analyze", json!({"url": "https://youtu.be/dQw4w9WgXcQ"}))
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (_, body) = app.get("/api/analyze-failure/config").await;
    assert_eq!(body["gemini_available"], false);
    assert_eq!(body["max_duration_seconds"], 10);

    let (status, _) = app.get("/api/youtube/history/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .post(
            "/api/youtube/analyze-player",
            json!({"url": "https://youtu.be/dQw4w9WgXcQ", "player_name": "FAN Zhendong"}),
        )
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (_, body) = app.get("/api/youtube/info").await;
    assert_eq!(body["enabled"], false);
    assert_eq!(body["limitations"]["max_duration_minutes"], 10);

    let (status, body) = app
        .post("/api/youtube/info", json!({"url": "https://youtu.be/dQw4w9WgXcQ"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["video_info"]["video_id"], "dQw4w9WgXcQ");
    assert_eq!(body["video_info"]["title"], "WANG Chuqin vs FAN Zhendong | Final");
    assert_eq!(body["video_info"]["duration"], 1800.0);

    let (status, body) = app
        .post("/api/youtube/info", json!({"url": "https://example.org/match.mp4"}))
        .await;
    assert_error_body(status, &body);
}

#[tokio::test]
async fn test_player_review_feeds_player_import() {
    let app = test_app_with(Some(Arc::new(FakeModel))).await;

    let (_, body) = app.get("/api/youtube/info").await;
    assert_eq!(body["enabled"], true);

    let (status, body) = app
        .post(
            "/api/youtube/analyze-player",
            json!({"url": "https://youtu.be/dQw4w9WgXcQ", "player_name": "FAN Zhendong", "player_description": "red shirt"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "unexpected body {}", body);
    assert_eq!(body["player_name"], "FAN Zhendong");
    assert_eq!(body["video_info"]["video_id"], "dQw4w9WgXcQ");
    assert_eq!(body["analysis"]["scoring_clips"][0]["technique"], "serve");
    assert_eq!(body["analysis"]["quality_distribution"]["total"], 3);
    let record_id = body["record_id"].as_str().unwrap().to_string();

    let (_, history) = app.get("/api/youtube/history?player=FAN").await;
    assert_eq!(history["total"], 1);
    assert_eq!(history["records"][0]["record_id"], record_id.as_str());

    let (status, body) = app
        .post(
            "/api/auto-train/import-player",
            json!({"analysis_result": body["analysis"], "player_name": "FAN Zhendong"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["imported_count"], 3);
    assert_eq!(body["scoring_count"], 2);
    assert_eq!(body["losing_count"], 1);
    assert_eq!(body["clips"][0]["source_video"], "https://youtu.be/dQw4w9WgXcQ");

    let (status, body) = app
        .post(
            "/api/youtube/analyze-player",
            json!({"url": "https://youtu.be/dQw4w9WgXcQ", "player_name": ""}),
        )
        .await;
    assert_error_body(status, &body);
}

#[tokio::test]
async fn test_failure_batch_reports_each_file() {
    let app = test_app().await;

    let (status, body) = app
        .upload(
            "/api/analyze-failure/batch",
            &[("files", "point one.mp4", b"video"), ("files", "notes.txt", b"text")],
        )
        .await;
    assert_eq!(status, StatusCode::OK, "unexpected body {}", body);
    assert_eq!(body["total"], 2);
    assert_eq!(body["analyzed"], 1);

    let results = body["results"].as_array().unwrap();
    assert_eq!(results[0]["filename"], "point_one.mp4");
    assert_eq!(results[0]["success"], true);
    assert_eq!(results[0]["analysis"]["ai_analysis"]["source"], "basic");
    assert_eq!(results[1]["filename"], "notes.txt");
    assert_eq!(results[1]["success"], false);
    assert!(results[1]["error"].as_str().unwrap().contains("Unsupported video format"));

    let (status, body) = app.upload("/api/analyze-failure/batch", &[("file", "a.mp4", b"video")]).await;
    assert_error_body(status, &body);
}

#[tokio::test]
async fn test_training_job_lifecycle() {
    let app = test_app().await;

    let (status, _) = app.get("/api/train/status/not-a-uuid").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .get("/api/train/status/6f0c1a8e-6a57-4c1b-9f0e-2d3c4b5a6978")
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .post(
            "/api/train",
            json!({"model_type": "lstm", "epochs": 0, "batch_size": 8, "learning_rate": 0.01}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .post(
            "/api/train",
            json!({"model_type": "lstm", "epochs": 3, "batch_size": 8, "learning_rate": 0.01}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let task_id = body["task_id"].as_str().unwrap().to_string();

    let mut last = Value::Null;
    for _ in 0..50 {
        let (_, body) = app.get(&format!("/api/train/status/{}", task_id)).await;
        if body["status"] == "completed" {
            last = body;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert_eq!(last["status"], "completed");
    assert_eq!(last["current_epoch"], 3);
    assert_eq!(last["result"]["accuracy"], 0.8);

    // cancelling a finished job leaves it completed
    let (_, body) = app
        .send(Method::POST, &format!("/api/train/cancel/{}", task_id), None)
        .await;
    assert_eq!(body["status"], "completed");
}
