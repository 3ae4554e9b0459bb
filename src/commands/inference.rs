use crate::app::AppState;
use crate::error::AppError;
use crate::models::file_types::{class_names_file_filters, image_file_filters, model_file_filters};
use crate::models::inference_types::{InferenceResponse, ModelConfig, OperationKind};
use crate::models::status_types::{DialogFilters, ModelStatus};
use crate::models::view_types::{BatchView, SingleImageView, StatusLine};
use crate::services::projector;
use crate::services::stager::StagedImage;

pub async fn get_model_status(state: &AppState) -> ModelStatus {
    let session = state.session.lock().await;
    ModelStatus {
        model_loaded: session.model_loaded(),
        model_path: session.active_model().map(|m| m.path.clone()),
        model_type: session.active_model().map(|m| m.kind.to_string()),
        staged_image: session.staged_image().map(|i| i.path_string()),
        load_phase: state.gateway.phase(OperationKind::LoadModel),
        single_phase: state.gateway.phase(OperationKind::InferSingle),
        batch_phase: state.gateway.phase(OperationKind::InferBatch),
    }
}

pub fn get_dialog_filters() -> DialogFilters {
    DialogFilters {
        model: model_file_filters(),
        class_names: class_names_file_filters(),
        images: image_file_filters(),
    }
}

pub async fn load_model(state: &AppState, config: ModelConfig) -> (StatusLine, InferenceResponse) {
    let response = state.gateway.load_model(&config).await;

    let status = match &response {
        InferenceResponse::Success { .. } => {
            let mut session = state.session.lock().await;
            session.record_model_loaded();
            session.record_model_config(config);
            StatusLine::success("Model loaded")
        }
        InferenceResponse::Failure { message, .. } => StatusLine::error(message.clone()),
    };
    (status, response)
}

pub async fn stage_image_path(state: &AppState, path: &str) -> StatusLine {
    let staged = state.stager.stage_path(path).await;
    record_staged(state, staged).await
}

pub async fn stage_image_data_url(state: &AppState, url: &str) -> StatusLine {
    let staged = state.stager.stage_data_url(url).await;
    record_staged(state, staged).await
}

pub async fn stage_image_bytes(state: &AppState, bytes: &[u8]) -> StatusLine {
    let staged = state.stager.stage_bytes(bytes).await;
    record_staged(state, staged).await
}

async fn record_staged(state: &AppState, staged: Result<StagedImage, AppError>) -> StatusLine {
    match staged {
        Ok(image) => {
            let text = format!("Image ready: {}", image.path().display());
            let replaced = state.session.lock().await.stage_image(image);
            if let Some(previous) = replaced {
                state.stager.discard(&previous).await;
            }
            StatusLine::success(text)
        }
        Err(e) => {
            tracing::warn!("Image staging failed: {}", e);
            StatusLine::error(e.message())
        }
    }
}

pub async fn infer_single_image(state: &AppState) -> SingleImageView {
    // Work on a snapshot so the session lock is never held across the backend call.
    let session = state.session.lock().await.clone();
    let response = state.gateway.infer_single(&session).await;
    projector::project_single(&response)
}

pub async fn batch_inference(state: &AppState, image_dir: &str) -> BatchView {
    let session = state.session.lock().await.clone();
    let response = state.gateway.infer_batch(&session, image_dir).await;
    projector::project_batch(&response)
}
