use serde::Serialize;

use crate::models::file_types::FileFilter;
use crate::services::gateway::OperationPhase;

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ModelStatus {
    pub model_loaded: bool,
    pub model_path: Option<String>,
    pub model_type: Option<String>,
    pub staged_image: Option<String>,
    pub load_phase: OperationPhase,
    pub single_phase: OperationPhase,
    pub batch_phase: OperationPhase,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct DialogFilters {
    pub model: Vec<FileFilter>,
    pub class_names: Vec<FileFilter>,
    pub images: Vec<FileFilter>,
}
