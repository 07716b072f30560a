//! Parsing of the estimator's height/weight reply

use std::sync::LazyLock;

use bodyfit_types::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Refined stature and weight returned by the text estimator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimatedBody {
    pub height_cm: f64,
    pub weight_kg: f64,
}

static HEIGHT_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""height_cm"\s*:\s*([0-9.]+)"#).expect("valid height regex"));

static WEIGHT_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""weight_kg"\s*:\s*([0-9.]+)"#).expect("valid weight regex"));

/// Parse the reply as strict JSON, falling back to `"key": number` extraction.
///
/// The fallback only recognises the two quoted keys; free text such as
/// `height: 178cm` is rejected.
pub fn parse_estimator_reply(reply: &str) -> Result<EstimatedBody> {
    let trimmed = reply.trim();

    match serde_json::from_str::<EstimatedBody>(trimmed) {
        Ok(body) => Ok(body),
        Err(err) => {
            warn!(error = %err, "estimator reply is not strict JSON, trying field extraction");
            let height_cm = extract_field(&HEIGHT_FIELD, trimmed, "height_cm")?;
            let weight_kg = extract_field(&WEIGHT_FIELD, trimmed, "weight_kg")?;
            Ok(EstimatedBody {
                height_cm,
                weight_kg,
            })
        }
    }
}

fn extract_field(pattern: &Regex, reply: &str, name: &str) -> Result<f64> {
    let raw = pattern
        .captures(reply)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| Error::Estimation(format!("no {} in reply: {}", name, reply)))?;

    raw.parse::<f64>()
        .map_err(|_| Error::Estimation(format!("{} is not a number: {}", name, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_json() {
        let body = parse_estimator_reply(r#"{"height_cm": 178.5, "weight_kg": 72.2}"#).unwrap();
        assert_eq!(
            body,
            EstimatedBody {
                height_cm: 178.5,
                weight_kg: 72.2
            }
        );
    }

    #[test]
    fn test_strict_json_with_whitespace() {
        let body = parse_estimator_reply("  \n{\"height_cm\": 180, \"weight_kg\": 80}\n").unwrap();
        assert_eq!(body.height_cm, 180.0);
        assert_eq!(body.weight_kg, 80.0);
    }

    #[test]
    fn test_fenced_json_uses_fallback() {
        let reply = "```json\n{\"height_cm\": 165.2, \"weight_kg\": 58.9}\n```";
        let body = parse_estimator_reply(reply).unwrap();
        assert!((body.height_cm - 165.2).abs() < 1e-9);
        assert!((body.weight_kg - 58.9).abs() < 1e-9);
    }

    #[test]
    fn test_chatter_around_fields_uses_fallback() {
        let reply = "Sure! Here it is: \"height_cm\": 171, and \"weight_kg\" : 66.5 hope that helps";
        let body = parse_estimator_reply(reply).unwrap();
        assert_eq!(body.height_cm, 171.0);
        assert_eq!(body.weight_kg, 66.5);
    }

    #[test]
    fn test_free_text_is_rejected() {
        let result = parse_estimator_reply("height: 178cm, weight: 72kg");
        assert!(matches!(result, Err(Error::Estimation(_))));
    }

    #[test]
    fn test_single_field_is_rejected() {
        let result = parse_estimator_reply(r#"{"height_cm": 178.5}"#);
        assert!(matches!(result, Err(Error::Estimation(_))));
    }

    #[test]
    fn test_bare_dot_is_rejected() {
        let result = parse_estimator_reply(r#""height_cm": ., "weight_kg": 70"#);
        assert!(matches!(result, Err(Error::Estimation(_))));
    }

    #[test]
    fn test_empty_reply_is_rejected() {
        assert!(parse_estimator_reply("").is_err());
    }
}
