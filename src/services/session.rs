use crate::models::inference_types::ModelConfig;
use crate::services::stager::StagedImage;

/// Whether inference is currently permitted, and on what.
#[derive(Debug, Default, Clone)]
pub struct SessionState {
    model_loaded: bool,
    active_model: Option<ModelConfig>,
    staged_image: Option<StagedImage>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only call after a load response that succeeded.
    pub fn record_model_loaded(&mut self) {
        self.model_loaded = true;
    }

    pub fn record_model_config(&mut self, config: ModelConfig) {
        self.active_model = Some(config);
    }

    /// Returns the image this one replaces.
    pub fn stage_image(&mut self, image: StagedImage) -> Option<StagedImage> {
        self.staged_image.replace(image)
    }

    pub fn model_loaded(&self) -> bool {
        self.model_loaded
    }

    pub fn active_model(&self) -> Option<&ModelConfig> {
        self.active_model.as_ref()
    }

    pub fn staged_image(&self) -> Option<&StagedImage> {
        self.staged_image.as_ref()
    }

    pub fn can_infer_single(&self) -> bool {
        self.model_loaded && self.staged_image.is_some()
    }

    pub fn can_infer_batch(&self) -> bool {
        self.model_loaded
    }
}
