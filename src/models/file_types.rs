use serde::Serialize;
use std::path::Path;

/// Extensions accepted by the load-time model check.
pub const MODEL_EXTENSIONS: [&str; 3] = ["onnx", "pt", "pth"];

/// Extensions offered by the model picker. `tflite` is offered but not accepted.
pub const MODEL_PICKER_EXTENSIONS: [&str; 4] = ["onnx", "pt", "pth", "tflite"];

pub const CLASS_NAMES_EXTENSIONS: [&str; 2] = ["json", "txt"];

pub const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "webp"];

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct FileFilter {
    pub name: String,
    pub extensions: Vec<String>,
}

impl FileFilter {
    fn new(name: &str, extensions: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
        }
    }
}

pub fn model_file_filters() -> Vec<FileFilter> {
    vec![
        FileFilter::new("Model files", &MODEL_PICKER_EXTENSIONS),
        FileFilter::new("ONNX model", &["onnx"]),
        FileFilter::new("PyTorch model", &["pt", "pth"]),
        FileFilter::new("TensorFlow Lite", &["tflite"]),
    ]
}

pub fn class_names_file_filters() -> Vec<FileFilter> {
    vec![
        FileFilter::new("Text files", &CLASS_NAMES_EXTENSIONS),
        FileFilter::new("JSON file", &["json"]),
        FileFilter::new("Text file", &["txt"]),
    ]
}

pub fn image_file_filters() -> Vec<FileFilter> {
    vec![FileFilter::new("Images", &IMAGE_EXTENSIONS)]
}

/// Literal, case-sensitive suffix check: `model.onnx` passes, `MODEL.ONNX` does not.
pub fn has_suffix(path: &str, allowed: &[&str]) -> bool {
    allowed
        .iter()
        .any(|ext| path.ends_with(&format!(".{}", ext)))
}

/// Case-insensitive extension check against an allow-list, for user images.
pub fn has_extension(path: &str, allowed: &[&str]) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            allowed.iter().any(|a| *a == ext)
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_suffix_is_case_sensitive() {
        assert!(has_suffix("/models/resnet.onnx", &MODEL_EXTENSIONS));
        assert!(has_suffix("weights.pth", &MODEL_EXTENSIONS));
        assert!(has_suffix(".onnx", &MODEL_EXTENSIONS));
        assert!(!has_suffix("MODEL.ONNX", &MODEL_EXTENSIONS));
        assert!(!has_suffix("weights.Pt", &MODEL_EXTENSIONS));
        assert!(!has_suffix("model.tflite", &MODEL_EXTENSIONS));
        assert!(!has_suffix("model", &MODEL_EXTENSIONS));
        assert!(!has_suffix("archive.onnx.zip", &MODEL_EXTENSIONS));
        assert!(!has_suffix("onnx", &MODEL_EXTENSIONS));
    }

    #[test]
    fn image_extension_ignores_case() {
        assert!(has_extension("/photos/IMG_0001.JPG", &IMAGE_EXTENSIONS));
        assert!(has_extension("cat.webp", &IMAGE_EXTENSIONS));
        assert!(!has_extension("notes.txt", &IMAGE_EXTENSIONS));
        assert!(!has_extension("png", &IMAGE_EXTENSIONS));
    }

    #[test]
    fn model_picker_offers_tflite() {
        let filters = model_file_filters();
        assert!(filters[0].extensions.contains(&"tflite".to_string()));
        assert_eq!(filters.len(), 4);
    }
}
