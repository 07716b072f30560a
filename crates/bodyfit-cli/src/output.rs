//! Output formatting module

use bodyfit_types::{
    BatchResults, DerivedMeasurements, ErrorPayload, MeasurementResult, OutputFormat, Result,
    Status, Verdict,
};

const CM_PER_INCH: f64 = 2.54;
const LB_PER_KG: f64 = 2.205;

/// Split a height into whole feet and inches rounded to one decimal
pub fn feet_and_inches(height_cm: f64) -> (u32, f64) {
    let total_inches = height_cm / CM_PER_INCH;
    let feet = (total_inches / 12.0).floor();
    let inches = ((total_inches - feet * 12.0) * 10.0).round() / 10.0;
    (feet as u32, inches)
}

pub fn kg_to_lb(weight_kg: f64) -> f64 {
    (weight_kg * LB_PER_KG * 10.0).round() / 10.0
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn verdict_meaning(status: Status) -> &'static str {
    match status {
        Status::Success => "Your image passed all checks and is ready for body analysis.",
        Status::Note => "Minor issue detected. You can still proceed but results may vary slightly.",
        Status::Warning => {
            "Significant issue detected. Consider retaking the photo for better accuracy."
        }
        Status::Error => {
            "Image did not pass verification. Please retake the photo following the tips below."
        }
    }
}

pub fn print_photo_tips() {
    println!("\nTips for a good photo:");
    println!("  - Stand upright against a plain background");
    println!("  - Make sure your full body is visible (head to feet)");
    println!("  - Face the camera directly");
    println!("  - Good lighting, not too dark or bright");
}

pub fn output_verdict(output_format: OutputFormat, verdict: &Verdict) -> Result<()> {
    if output_format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(verdict)?);
        return Ok(());
    }

    println!("\nVerification Result");
    println!("===================");
    println!("Status:  {}", verdict.status.label().to_uppercase());
    println!("Reason:  {}", verdict.reason);
    println!("Retry?:  {}", verdict.retry.label());
    println!("\n{}", verdict_meaning(verdict.status));
    if verdict.status == Status::Error {
        print_photo_tips();
    }

    Ok(())
}

pub fn output_measurement(output_format: OutputFormat, result: &MeasurementResult) -> Result<()> {
    if output_format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    let (feet, inches) = feet_and_inches(result.height_cm);

    println!("\nMeasurement Result");
    println!("==================");
    println!("Gender:  {}", capitalize(result.gender.label()));
    println!("Age:     {} years", result.age);
    println!("Height:  {:.2} cm  ({}ft {:.1}in)", result.height_cm, feet, inches);
    println!("Weight:  {:.2} kg  ({:.1} lbs)", result.weight, kg_to_lb(result.weight));
    println!("\nNote: these are estimates from computer vision and a language model.");
    println!("Results are approximate and may vary with image quality.");

    Ok(())
}

pub fn output_geometry(output_format: OutputFormat, m: &DerivedMeasurements) -> Result<()> {
    if output_format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(m)?);
        return Ok(());
    }

    println!("\nGeometric Measurements");
    println!("======================");
    println!("Height (geometric):  {:.1} cm", m.height_cm);
    println!("Shoulder width:      {:.4} m", m.shoulder_width_m);
    println!("Hip width:           {:.4} m", m.hip_width_m);
    println!("Ankle width:         {:.4} m", m.ankle_width_m);
    println!("Body ratio:          {:.2}", m.body_ratio);
    println!("Hip angle:           {:.1} deg", m.bend_angle_degrees);
    println!("Nose-to-ankle:       {:.2} px", m.nose_to_ankle_px);

    Ok(())
}

pub fn output_error(output_format: OutputFormat, payload: &ErrorPayload) -> Result<()> {
    if output_format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(payload)?);
    } else {
        println!("\nFailed: {}", payload.message);
    }
    Ok(())
}

pub fn output_batch(output_format: OutputFormat, results: &BatchResults) -> Result<()> {
    println!("\nBatch Verification Complete");
    println!("===========================");
    println!("Total:     {}", results.total_processed);
    println!("Passed:    {}", results.passed);
    println!("Rejected:  {}", results.rejected);
    for status in [Status::Note, Status::Warning, Status::Error] {
        let count = results.count_status(status);
        if count > 0 {
            println!("  {:<8} {}", status.label(), count);
        }
    }
    println!("Failed:    {}", results.failed);
    println!(
        "Duration:  {:.1}s",
        (results.completed_at - results.started_at).num_milliseconds() as f64 / 1000.0
    );

    if output_format == OutputFormat::Json {
        println!("\n{}", serde_json::to_string_pretty(results)?);
    } else {
        for entry in &results.entries {
            let outcome = match (&entry.verdict, &entry.error) {
                (Some(v), _) => format!("{:<8} {}", v.status.label(), v.reason),
                (None, Some(e)) => format!("{:<8} {}", "failed", e),
                (None, None) => "unknown".to_string(),
            };
            println!("{}  {}", entry.image_path, outcome);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feet_and_inches() {
        // 185 cm = 72.83 in
        let (feet, inches) = feet_and_inches(185.0);
        assert_eq!(feet, 6);
        assert!((inches - 0.8).abs() < 1e-9);

        let (feet, inches) = feet_and_inches(170.0);
        assert_eq!(feet, 5);
        assert!((inches - 6.9).abs() < 1e-9);
    }

    #[test]
    fn test_kg_to_lb() {
        assert!((kg_to_lb(72.2) - 159.2).abs() < 1e-9);
        assert_eq!(kg_to_lb(0.0), 0.0);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("female"), "Female");
        assert_eq!(capitalize(""), "");
    }
}
