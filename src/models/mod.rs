pub mod file_types;
pub mod inference_types;
pub mod status_types;
pub mod view_types;
