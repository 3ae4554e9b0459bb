use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Onnx,
    TorchScript,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Onnx => "onnx",
            ModelKind::TorchScript => "torchscript",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "onnx" => Ok(Self::Onnx),
            "torchscript" => Ok(Self::TorchScript),
            other => Err(format!(
                "{} is not a supported model type. Use either `onnx` or `torchscript`.",
                other
            )),
        }
    }
}

/// What the user submitted when asking for a model load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub path: String,
    pub kind: ModelKind,
    #[serde(default)]
    pub class_names_path: Option<String>,
}

impl ModelConfig {
    pub fn new(path: impl Into<String>, kind: ModelKind) -> Self {
        Self {
            path: path.into(),
            kind,
            class_names_path: None,
        }
    }

    pub fn with_class_names(mut self, path: impl Into<String>) -> Self {
        self.class_names_path = Some(path.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceResult {
    pub class_id: usize,
    pub class_name: String,
    pub probability: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub image_name: String,
    pub result: InferenceResult,
    pub inference_time_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceStats {
    pub total_images: usize,
    pub successful_images: usize,
    pub total_time_ms: f64,
    pub average_time_ms: f64,
    pub fps: f64,
}

/// The response exactly as the backend puts it on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub results: Option<Vec<InferenceResult>>,
    #[serde(default)]
    pub batch_results: Option<HashMap<String, BatchResult>>,
    #[serde(default)]
    pub stats: Option<InferenceStats>,
}

/// Which of the error classes produced a failed response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureCause {
    /// Local precondition failure; the backend was never contacted.
    Validation,
    /// Another call of the same kind was still in flight.
    Busy,
    /// The bridge call itself failed to complete.
    Transport,
    /// The backend answered with `success: false`.
    Backend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ResponseEnvelope", into = "ResponseEnvelope")]
pub enum InferenceResponse {
    Success {
        message: String,
        results: Option<Vec<InferenceResult>>,
        batch_results: Option<HashMap<String, BatchResult>>,
        stats: Option<InferenceStats>,
    },
    Failure {
        message: String,
        cause: FailureCause,
    },
}

impl InferenceResponse {
    pub fn failure(cause: FailureCause, message: impl Into<String>) -> Self {
        InferenceResponse::Failure {
            message: message.into(),
            cause,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, InferenceResponse::Success { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            InferenceResponse::Success { message, .. } => message,
            InferenceResponse::Failure { message, .. } => message,
        }
    }

    pub fn cause(&self) -> Option<FailureCause> {
        match self {
            InferenceResponse::Success { .. } => None,
            InferenceResponse::Failure { cause, .. } => Some(*cause),
        }
    }
}

impl From<ResponseEnvelope> for InferenceResponse {
    fn from(envelope: ResponseEnvelope) -> Self {
        // Payload fields of a failed response are never trusted.
        if envelope.success {
            InferenceResponse::Success {
                message: envelope.message,
                results: envelope.results,
                batch_results: envelope.batch_results,
                stats: envelope.stats,
            }
        } else {
            InferenceResponse::Failure {
                message: envelope.message,
                cause: FailureCause::Backend,
            }
        }
    }
}

impl From<InferenceResponse> for ResponseEnvelope {
    fn from(response: InferenceResponse) -> Self {
        match response {
            InferenceResponse::Success {
                message,
                results,
                batch_results,
                stats,
            } => ResponseEnvelope {
                success: true,
                message,
                results,
                batch_results,
                stats,
            },
            InferenceResponse::Failure { message, .. } => ResponseEnvelope {
                success: false,
                message,
                results: None,
                batch_results: None,
                stats: None,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    LoadModel,
    InferSingle,
    InferBatch,
}

impl OperationKind {
    pub(crate) fn index(&self) -> usize {
        match self {
            OperationKind::LoadModel => 0,
            OperationKind::InferSingle => 1,
            OperationKind::InferBatch => 2,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::LoadModel => "model loading",
            OperationKind::InferSingle => "single-image inference",
            OperationKind::InferBatch => "batch inference",
        };
        f.write_str(name)
    }
}

/// A remote command with its own argument shape.
pub trait BackendCommand: Serialize + Send + Sync {
    const NAME: &'static str;
    const KIND: OperationKind;
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadModelRequest {
    pub model_path: String,
    pub model_type: ModelKind,
    pub class_names_path: Option<String>,
}

impl BackendCommand for LoadModelRequest {
    const NAME: &'static str = "load_model";
    const KIND: OperationKind = OperationKind::LoadModel;
}

impl From<&ModelConfig> for LoadModelRequest {
    fn from(config: &ModelConfig) -> Self {
        Self {
            model_path: config.path.clone(),
            model_type: config.kind,
            class_names_path: config.class_names_path.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InferSingleRequest {
    pub image_path: String,
}

impl BackendCommand for InferSingleRequest {
    const NAME: &'static str = "infer_single_image";
    const KIND: OperationKind = OperationKind::InferSingle;
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchInferenceRequest {
    pub image_dir: String,
}

impl BackendCommand for BatchInferenceRequest {
    const NAME: &'static str = "batch_inference";
    const KIND: OperationKind = OperationKind::InferBatch;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn model_kind_parses_case_insensitively() {
        assert_eq!("ONNX".parse::<ModelKind>(), Ok(ModelKind::Onnx));
        assert_eq!("TorchScript".parse::<ModelKind>(), Ok(ModelKind::TorchScript));
        assert!("tflite".parse::<ModelKind>().is_err());
    }

    #[test]
    fn load_request_uses_wire_names() {
        let config = ModelConfig::new("model.pt", ModelKind::TorchScript);
        let value = serde_json::to_value(LoadModelRequest::from(&config)).unwrap();
        assert_eq!(
            value,
            json!({
                "model_path": "model.pt",
                "model_type": "torchscript",
                "class_names_path": null,
            })
        );
    }

    #[test]
    fn failed_envelope_drops_stale_payload() {
        let response: InferenceResponse = serde_json::from_value(json!({
            "success": false,
            "message": "file not found",
            "results": [{"class_id": 1, "class_name": "dog", "probability": 50.0}],
            "stats": {
                "total_images": 1,
                "successful_images": 1,
                "total_time_ms": 1.0,
                "average_time_ms": 1.0,
                "fps": 1000.0
            }
        }))
        .unwrap();

        assert_eq!(
            response,
            InferenceResponse::failure(FailureCause::Backend, "file not found")
        );
    }

    #[test]
    fn success_envelope_keeps_results() {
        let response: InferenceResponse = serde_json::from_value(json!({
            "success": true,
            "message": "done",
            "results": [{"class_id": 3, "class_name": "cat", "probability": 97.5}]
        }))
        .unwrap();

        match response {
            InferenceResponse::Success {
                results: Some(results),
                batch_results: None,
                stats: None,
                ..
            } => {
                assert_eq!(results.len(), 1);
                assert_eq!(results[0].class_name, "cat");
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[test]
    fn failure_serializes_back_to_wire_shape() {
        let value =
            serde_json::to_value(InferenceResponse::failure(FailureCause::Transport, "boom"))
                .unwrap();
        assert_eq!(value["success"], json!(false));
        assert_eq!(value["message"], json!("boom"));
        assert_eq!(value["results"], json!(null));
    }
}
