use serde::Serialize;
use std::fmt;

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct RankedRow {
    pub rank: usize,
    pub class_name: String,
    pub probability: f32,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ErrorView {
    pub message: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum SingleImageView {
    Ranked { message: String, rows: Vec<RankedRow> },
    Error(ErrorView),
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct StatsView {
    pub total_images: usize,
    pub successful_images: usize,
    pub total_time_ms: f64,
    pub average_time_ms: f64,
    pub fps: f64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct BatchRow {
    pub image_name: String,
    pub class_name: String,
    pub probability: f32,
    pub inference_time_ms: f64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum BatchView {
    Summary {
        message: String,
        stats: Option<StatsView>,
        rows: Vec<BatchRow>,
    },
    Error(ErrorView),
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Loading,
    Success,
    Error,
}

/// One-line status banner shown next to the model controls.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusLine {
    pub fn loading(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Loading,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            text: text.into(),
        }
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self.kind {
            StatusKind::Loading => "...",
            StatusKind::Success => "ok",
            StatusKind::Error => "error",
        };
        write!(f, "[{}] {}", marker, self.text)
    }
}

impl fmt::Display for ErrorView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error: {}", self.message)
    }
}

impl fmt::Display for RankedRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>2}. {} {:.2}%", self.rank, self.class_name, self.probability)
    }
}

impl fmt::Display for SingleImageView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SingleImageView::Ranked { message, rows } => {
                writeln!(f, "{}", message)?;
                for row in rows {
                    writeln!(f, "{}", row)?;
                }
                Ok(())
            }
            SingleImageView::Error(err) => writeln!(f, "{}", err),
        }
    }
}

impl fmt::Display for StatsView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total images: {}", self.total_images)?;
        writeln!(f, "Successful: {}", self.successful_images)?;
        writeln!(f, "Total time: {:.2} ms", self.total_time_ms)?;
        writeln!(f, "Average time: {:.2} ms", self.average_time_ms)?;
        writeln!(f, "Speed: {:.2} FPS", self.fps)
    }
}

impl fmt::Display for BatchRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} {:.2}% ({:.2}ms)",
            self.image_name, self.class_name, self.probability, self.inference_time_ms
        )
    }
}

impl fmt::Display for BatchView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchView::Summary {
                message,
                stats,
                rows,
            } => {
                writeln!(f, "{}", message)?;
                if let Some(stats) = stats {
                    write!(f, "{}", stats)?;
                }
                for row in rows {
                    writeln!(f, "{}", row)?;
                }
                Ok(())
            }
            BatchView::Error(err) => writeln!(f, "{}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_render_two_decimals() {
        let row = RankedRow {
            rank: 1,
            class_name: "cat".into(),
            probability: 97.5,
        };
        assert_eq!(row.to_string(), " 1. cat 97.50%");

        let batch = BatchRow {
            image_name: "a.jpg".into(),
            class_name: "dog".into(),
            probability: 80.0,
            inference_time_ms: 12.346,
        };
        assert_eq!(batch.to_string(), "a.jpg: dog 80.00% (12.35ms)");
    }

    #[test]
    fn stats_render_fps() {
        let stats = StatsView {
            total_images: 10,
            successful_images: 9,
            total_time_ms: 900.0,
            average_time_ms: 90.0,
            fps: 11.111,
        };
        let text = stats.to_string();
        assert!(text.contains("Successful: 9"));
        assert!(text.contains("Speed: 11.11 FPS"));
    }

    #[test]
    fn error_view_is_tagged() {
        let view = SingleImageView::Error(ErrorView {
            message: "no model".into(),
        });
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["view"], "error");
        assert_eq!(json["message"], "no model");
    }
}
