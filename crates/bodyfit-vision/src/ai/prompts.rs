//! Prompt for the height/weight refinement step
//!
//! The JSON template uses placeholders instead of numeric example values so
//! the estimator cannot echo the example back.

use bodyfit_types::{DerivedMeasurements, FaceAttributes};

/// Everything the prompt embeds about one subject
#[derive(Debug, Clone)]
pub struct PromptContext {
    pub face: FaceAttributes,
    pub measurements: DerivedMeasurements,
    /// Height of the analysed image in pixels
    pub image_height: u32,
    /// Free-text warning from an earlier quality check, if any
    pub warning: Option<String>,
}

const JSON_TEMPLATE: &str = r#"{"height_cm": <estimated height in centimeters>, "weight_kg": <estimated weight in kilograms>}"#;

/// Build the refinement prompt
pub fn build_measurement_prompt(ctx: &PromptContext) -> String {
    let m = &ctx.measurements;
    let mut prompt = String::from(
        "This person has the following body metrics derived from computer vision:\n",
    );

    prompt.push_str(&format!("- Apparent age from face: {} years\n", ctx.face.age));
    prompt.push_str(&format!("- Gender: {}\n", ctx.face.gender));
    prompt.push_str(&format!(
        "- Geometric height estimate (advisory): {:.1} cm\n",
        m.height_cm
    ));
    prompt.push_str(&format!("- Shoulder width: {:.4} meters\n", m.shoulder_width_m));
    prompt.push_str(&format!("- Hip width: {:.4} meters\n", m.hip_width_m));
    prompt.push_str(&format!("- Ankle width: {:.4} meters\n", m.ankle_width_m));
    prompt.push_str(&format!(
        "- Vertical nose-to-ankle pixel distance: {:.2}\n",
        m.nose_to_ankle_px
    ));
    prompt.push_str(&format!("- Full image height: {} pixels\n", ctx.image_height));

    if let Some(warning) = ctx.warning.as_deref().map(str::trim).filter(|w| !w.is_empty()) {
        prompt.push_str(&format!("- Warning (based on image analysis): {}\n", warning));
    }

    prompt.push_str(concat!(
        "\nUsing this data, estimate the person's:\n",
        "1. Height (in centimeters)\n",
        "2. Weight (in kilograms)\n\n",
        "Be as accurate as possible; the geometric height can be far off for tall people.\n",
        "Return the result as strict JSON in exactly this format:\n",
    ));
    prompt.push_str(JSON_TEMPLATE);
    prompt.push_str(concat!(
        "\nReplace every <...> placeholder with a number.\n",
        "Do NOT wrap it in triple backticks. Return ONLY the JSON, no explanation or extra text.",
    ));

    prompt
}
