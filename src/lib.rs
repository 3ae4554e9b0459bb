pub mod app;
pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod telemetry;

pub use app::AppState;
pub use error::AppError;
pub use models::inference_types::{FailureCause, InferenceResponse, ModelConfig, ModelKind};
pub use services::gateway::CommandGateway;
pub use services::session::SessionState;
