use async_trait::async_trait;
use infer_lens::commands::inference as commands;
use infer_lens::models::view_types::{BatchView, SingleImageView, StatsView, StatusKind};
use infer_lens::services::bridge::CommandBridge;
use infer_lens::services::stager::ImageStager;
use infer_lens::{AppError, AppState, ModelConfig, ModelKind};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Stand-in backend answering by command name and recording every call.
#[derive(Default)]
struct FakeBackend {
    calls: Mutex<Vec<String>>,
    unreachable: bool,
}

#[async_trait]
impl CommandBridge for FakeBackend {
    async fn invoke(&self, command: &str, args: Value) -> Result<Value, AppError> {
        self.calls.lock().await.push(command.to_string());
        if self.unreachable {
            return Err(AppError::Transport("backend process exited".into()));
        }

        match command {
            "load_model" => Ok(json!({"success": true, "message": "loaded"})),
            "infer_single_image" => Ok(json!({
                "success": true,
                "message": format!("classified {}", args["image_path"].as_str().unwrap_or("")),
                "results": [{"class_id": 3, "class_name": "cat", "probability": 97.5}]
            })),
            "batch_inference" => Ok(json!({
                "success": true,
                "message": "batch done",
                "stats": {
                    "total_images": 10,
                    "successful_images": 9,
                    "total_time_ms": 900.0,
                    "average_time_ms": 90.0,
                    "fps": 11.11
                },
                "batch_results": {
                    "a.jpg": {
                        "image_name": "a.jpg",
                        "result": {"class_id": 1, "class_name": "dog", "probability": 88.0},
                        "inference_time_ms": 90.0
                    }
                }
            })),
            other => Err(AppError::Transport(format!("unknown command {}", other))),
        }
    }
}

fn app(backend: Arc<FakeBackend>, dir: &tempfile::TempDir) -> AppState {
    AppState::new(backend, ImageStager::new(dir.path().join("staging")))
}

#[tokio::test]
async fn load_stage_and_infer() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(FakeBackend::default());
    let state = app(backend.clone(), &dir);

    let (status, _) = commands::load_model(&state, ModelConfig::new("model.onnx", ModelKind::Onnx)).await;
    assert_eq!(status.kind, StatusKind::Success);
    assert!(commands::get_model_status(&state).await.model_loaded);

    let image = dir.path().join("cat.png");
    tokio::fs::write(&image, b"\x89PNG\r\n\x1a\n").await.unwrap();
    let status = commands::stage_image_path(&state, image.to_str().unwrap()).await;
    assert_eq!(status.kind, StatusKind::Success);

    match commands::infer_single_image(&state).await {
        SingleImageView::Ranked { message, rows } => {
            assert_eq!(message, format!("classified {}", image.display()));
            assert_eq!(rows.len(), 1);
            assert_eq!((rows[0].rank, rows[0].class_name.as_str()), (1, "cat"));
            assert_eq!(rows[0].probability, 97.5);
        }
        other => panic!("unexpected view: {:?}", other),
    }

    assert_eq!(
        backend.calls.lock().await.clone(),
        vec!["load_model".to_string(), "infer_single_image".to_string()]
    );
}

#[tokio::test]
async fn invalid_model_never_reaches_backend() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(FakeBackend::default());
    let state = app(backend.clone(), &dir);

    let (status, response) =
        commands::load_model(&state, ModelConfig::new("model.xyz", ModelKind::Onnx)).await;
    assert_eq!(status.kind, StatusKind::Error);
    assert!(!response.is_success());
    assert!(!commands::get_model_status(&state).await.model_loaded);
    assert!(backend.calls.lock().await.is_empty());
}

#[tokio::test]
async fn batch_runs_alongside_single_inference() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(FakeBackend::default());
    let state = app(backend, &dir);

    commands::load_model(&state, ModelConfig::new("model.pth", ModelKind::TorchScript)).await;
    commands::stage_image_bytes(&state, b"\x89PNG\r\n\x1a\nrest").await;

    let (single, batch) = futures::join!(
        commands::infer_single_image(&state),
        commands::batch_inference(&state, "/images")
    );

    assert!(matches!(single, SingleImageView::Ranked { .. }));
    match batch {
        BatchView::Summary { stats, rows, .. } => {
            assert_eq!(
                stats,
                Some(StatsView {
                    total_images: 10,
                    successful_images: 9,
                    total_time_ms: 900.0,
                    average_time_ms: 90.0,
                    fps: 11.11,
                })
            );
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].image_name, "a.jpg");
        }
        other => panic!("unexpected view: {:?}", other),
    }

    state.shutdown().await;
}

#[tokio::test]
async fn unreachable_backend_surfaces_message() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(FakeBackend {
        unreachable: true,
        ..Default::default()
    });
    let state = app(backend, &dir);

    let (status, response) =
        commands::load_model(&state, ModelConfig::new("model.onnx", ModelKind::Onnx)).await;
    assert_eq!(response.message(), "backend process exited");
    assert_eq!(status.text, "backend process exited");
    assert!(!commands::get_model_status(&state).await.model_loaded);
}
