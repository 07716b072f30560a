//! Vision module - image preparation and adapters for the external models

pub mod ai;
pub mod detector;
pub mod imaging;

// Re-export main types for convenience
pub use ai::backend::{ChatCompletionsEstimator, CommandEstimator};
pub use ai::prompts::{build_measurement_prompt, PromptContext};
pub use ai::reply::{parse_estimator_reply, EstimatedBody};
pub use detector::{CommandFaceEstimator, CommandPoseDetector, FixedFaceAttributes, LandmarkFileDetector};
pub use imaging::{load_image, PreparedImage, DEFAULT_MAX_DIMENSION};

/// Extract JSON from a model or tool response (handles markdown code blocks
/// and leading/trailing chatter)
pub fn extract_json_from_response(response: &str) -> String {
    let response = response.trim();

    if response.starts_with("```") {
        if let Some(end) = response.rfind("```") {
            let start = response.find('\n').map(|i| i + 1).unwrap_or(3);
            if start < end {
                return response[start..end].trim().to_string();
            }
        }
    }

    if let Some(start) = response.find('{') {
        if let Some(end) = response.rfind('}') {
            if start < end {
                return response[start..=end].to_string();
            }
        }
    }

    response.to_string()
}
