use crate::models::inference_types::{InferenceResponse, InferenceStats};
use crate::models::view_types::{BatchRow, BatchView, ErrorView, RankedRow, SingleImageView, StatsView};

/// Ranks follow the backend's order; results are never re-sorted here.
pub fn project_single(response: &InferenceResponse) -> SingleImageView {
    match response {
        InferenceResponse::Success {
            message, results, ..
        } => {
            let rows = results
                .iter()
                .flatten()
                .enumerate()
                .map(|(i, result)| RankedRow {
                    rank: i + 1,
                    class_name: result.class_name.clone(),
                    probability: result.probability,
                })
                .collect();
            SingleImageView::Ranked {
                message: message.clone(),
                rows,
            }
        }
        InferenceResponse::Failure { message, .. } => SingleImageView::Error(ErrorView {
            message: message.clone(),
        }),
    }
}

/// Stats pass through untouched. Rows come out sorted by image name so the
/// view is stable, but callers should treat the order as unspecified.
pub fn project_batch(response: &InferenceResponse) -> BatchView {
    match response {
        InferenceResponse::Success {
            message,
            batch_results,
            stats,
            ..
        } => {
            let mut rows: Vec<BatchRow> = batch_results
                .iter()
                .flatten()
                .map(|(image_name, batch)| BatchRow {
                    image_name: image_name.clone(),
                    class_name: batch.result.class_name.clone(),
                    probability: batch.result.probability,
                    inference_time_ms: batch.inference_time_ms,
                })
                .collect();
            rows.sort_by(|a, b| a.image_name.cmp(&b.image_name));

            BatchView::Summary {
                message: message.clone(),
                stats: stats.as_ref().map(stats_view),
                rows,
            }
        }
        InferenceResponse::Failure { message, .. } => BatchView::Error(ErrorView {
            message: message.clone(),
        }),
    }
}

fn stats_view(stats: &InferenceStats) -> StatsView {
    StatsView {
        total_images: stats.total_images,
        successful_images: stats.successful_images,
        total_time_ms: stats.total_time_ms,
        average_time_ms: stats.average_time_ms,
        fps: stats.fps,
    }
}
