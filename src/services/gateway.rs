use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use tracing::instrument;

use crate::models::file_types::{has_suffix, CLASS_NAMES_EXTENSIONS, MODEL_EXTENSIONS};
use crate::models::inference_types::{
    BackendCommand, BatchInferenceRequest, FailureCause, InferSingleRequest, InferenceResponse,
    LoadModelRequest, ModelConfig, OperationKind,
};
use crate::services::bridge::{invoke_command, CommandBridge};
use crate::services::session::SessionState;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationPhase {
    Idle,
    Requested,
    Succeeded,
    Failed,
}

impl OperationPhase {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => OperationPhase::Requested,
            2 => OperationPhase::Succeeded,
            3 => OperationPhase::Failed,
            _ => OperationPhase::Idle,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            OperationPhase::Idle => 0,
            OperationPhase::Requested => 1,
            OperationPhase::Succeeded => 2,
            OperationPhase::Failed => 3,
        }
    }
}

#[derive(Default)]
struct OperationSlot {
    in_flight: AtomicBool,
    phase: AtomicU8,
}

impl OperationSlot {
    fn try_acquire(&self) -> Option<InFlightGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard { slot: self })
    }

    fn set_phase(&self, phase: OperationPhase) {
        self.phase.store(phase.as_u8(), Ordering::Release);
    }
}

struct InFlightGuard<'a> {
    slot: &'a OperationSlot,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.slot.in_flight.store(false, Ordering::Release);
    }
}

/// Typed entry point for the three backend operations.
///
/// Every call resolves to an [`InferenceResponse`]; validation, busy, transport
/// and backend failures all come back as `InferenceResponse::Failure`.
/// At most one call per [`OperationKind`] is in flight; a second one is
/// rejected with [`FailureCause::Busy`] rather than queued.
pub struct CommandGateway {
    bridge: Arc<dyn CommandBridge>,
    slots: [OperationSlot; 3],
}

impl CommandGateway {
    pub fn new(bridge: Arc<dyn CommandBridge>) -> Self {
        Self {
            bridge,
            slots: Default::default(),
        }
    }

    /// `Requested` while a call is out, otherwise the outcome of the last call.
    pub fn phase(&self, kind: OperationKind) -> OperationPhase {
        OperationPhase::from_u8(self.slots[kind.index()].phase.load(Ordering::Acquire))
    }

    pub fn is_in_flight(&self, kind: OperationKind) -> bool {
        self.slots[kind.index()].in_flight.load(Ordering::Acquire)
    }

    #[instrument(skip(self, config), fields(model = %config.path, kind = %config.kind))]
    pub async fn load_model(&self, config: &ModelConfig) -> InferenceResponse {
        if let Err(message) = validate_model_config(config) {
            return InferenceResponse::failure(FailureCause::Validation, message);
        }

        let mut request = LoadModelRequest::from(config);
        request.class_names_path = request
            .class_names_path
            .filter(|p| !p.trim().is_empty());
        self.dispatch(&request).await
    }

    #[instrument(skip(self, session))]
    pub async fn infer_single(&self, session: &SessionState) -> InferenceResponse {
        if !session.model_loaded() {
            return InferenceResponse::failure(
                FailureCause::Validation,
                "Please load a model first",
            );
        }
        let image = match session.staged_image() {
            Some(image) if session.can_infer_single() => image,
            _ => {
                return InferenceResponse::failure(
                    FailureCause::Validation,
                    "Please choose an image first",
                )
            }
        };

        let request = InferSingleRequest {
            image_path: image.path_string(),
        };
        self.dispatch(&request).await
    }

    #[instrument(skip(self, session))]
    pub async fn infer_batch(&self, session: &SessionState, directory: &str) -> InferenceResponse {
        if directory.trim().is_empty() {
            return InferenceResponse::failure(
                FailureCause::Validation,
                "Please choose an image directory",
            );
        }
        if !session.can_infer_batch() {
            return InferenceResponse::failure(
                FailureCause::Validation,
                "Please load a model first",
            );
        }

        let request = BatchInferenceRequest {
            image_dir: directory.to_string(),
        };
        self.dispatch(&request).await
    }

    async fn dispatch<C: BackendCommand>(&self, request: &C) -> InferenceResponse {
        let slot = &self.slots[C::KIND.index()];
        let _guard = match slot.try_acquire() {
            Some(guard) => guard,
            None => {
                tracing::warn!(command = C::NAME, "Rejected while a previous call is pending");
                return InferenceResponse::failure(
                    FailureCause::Busy,
                    format!("Another {} request is still in progress", C::KIND),
                );
            }
        };

        slot.set_phase(OperationPhase::Requested);
        tracing::debug!(command = C::NAME, "Invoking backend");

        let response = match invoke_command(self.bridge.as_ref(), request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(command = C::NAME, "Backend call failed: {}", e);
                InferenceResponse::failure(FailureCause::Transport, e.to_string())
            }
        };

        if let InferenceResponse::Failure { message, .. } = &response {
            tracing::info!(command = C::NAME, "Command failed: {}", message);
            slot.set_phase(OperationPhase::Failed);
        } else {
            slot.set_phase(OperationPhase::Succeeded);
        }
        response
    }
}

pub fn validate_model_config(config: &ModelConfig) -> Result<(), String> {
    if config.path.trim().is_empty() {
        return Err("Please choose a model file".into());
    }
    if !has_suffix(&config.path, &MODEL_EXTENSIONS) {
        return Err("Please choose a valid model file (.onnx, .pt, .pth)".into());
    }
    if let Some(class_names) = config.class_names_path.as_deref() {
        if !class_names.trim().is_empty() && !has_suffix(class_names, &CLASS_NAMES_EXTENSIONS) {
            return Err("Class names file must be .json or .txt".into());
        }
    }
    Ok(())
}
