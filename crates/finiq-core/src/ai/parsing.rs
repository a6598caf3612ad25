//! Helpers for pulling structured answers out of model output
//!
//! Models are told to answer with bare JSON but regularly wrap it in a
//! markdown fence or surround it with chatter.

use tracing::debug;

use crate::error::{Error, Result};
use crate::models::CoachingMessages;

use super::types::BucketClassification;

/// Remove a surrounding ```` ``` ```` / ```` ```json ```` fence, if present
pub fn strip_code_fences(response: &str) -> &str {
    let trimmed = response.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }

    let lines: Vec<&str> = trimmed.lines().collect();
    let closed = lines.len() >= 2 && lines.last().is_some_and(|l| l.starts_with("```"));
    if !closed {
        return trimmed;
    }

    // Everything between the opening and closing fence lines
    match (trimmed.find('\n'), trimmed.rfind('\n')) {
        (Some(first_nl), Some(last_nl)) if first_nl < last_nl => trimmed[first_nl + 1..last_nl].trim(),
        _ => "",
    }
}

fn truncate(s: &str) -> String {
    if s.chars().count() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s.to_string()
    }
}

/// Slice from the first `{` to the last `}`
fn json_object(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    (start < end).then(|| &response[start..=end])
}

/// Parse a `{"bucket": ...}` answer
pub fn parse_bucket_classification(response: &str) -> Result<BucketClassification> {
    let response = strip_code_fences(response);

    let json_str = json_object(response).ok_or_else(|| {
        Error::InvalidData(format!(
            "No JSON found in AI bucket response | Raw: {}",
            truncate(response)
        ))
    })?;

    serde_json::from_str(json_str).map_err(|e| {
        Error::InvalidData(format!(
            "Invalid bucket JSON from AI: {} | Raw: {}",
            e,
            truncate(json_str)
        ))
    })
}

/// Parse coaching messages; never fails
///
/// Unparsable output is passed through as the daily message so the user
/// still sees whatever the model said.
pub fn parse_coaching_messages(response: &str) -> CoachingMessages {
    let raw = strip_code_fences(response);

    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Object(map)) => {
            let field = |key: &str| -> String {
                match map.get(key) {
                    Some(serde_json::Value::String(s)) => s.trim().to_string(),
                    Some(serde_json::Value::Null) | None => String::new(),
                    Some(other) => other.to_string().trim().to_string(),
                }
            };
            CoachingMessages {
                daily_message: field("daily_message"),
                weekly_message: field("weekly_message"),
                monthly_message: field("monthly_message"),
            }
        }
        _ => {
            debug!("Coaching response was not a JSON object, using raw text");
            CoachingMessages {
                daily_message: raw.to_string(),
                weekly_message: String::new(),
                monthly_message: String::new(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```\n{\"a\": 1}\n```\n"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("  {\"a\": 1} "), "{\"a\": 1}");
        // Opening fence without a closing one is left alone
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}"), "```json\n{\"a\": 1}");
    }

    #[test]
    fn test_parse_bucket() {
        let result = parse_bucket_classification(r#"{"bucket": "fun"}"#).unwrap();
        assert_eq!(result.bucket, "fun");
        assert_eq!(result.to_bucket(), Some(crate::models::Bucket::Fun));
    }

    #[test]
    fn test_parse_bucket_with_chatter() {
        let response = "Sure! Here you go:\n```json\n{\"bucket\": \"bills\"}\n```";
        let result = parse_bucket_classification(response).unwrap();
        assert_eq!(result.bucket, "bills");
    }

    #[test]
    fn test_parse_bucket_unknown_value() {
        let result = parse_bucket_classification(r#"{"bucket": "luxury"}"#).unwrap();
        assert_eq!(result.to_bucket(), None);
    }

    #[test]
    fn test_parse_bucket_no_json() {
        assert!(matches!(
            parse_bucket_classification("essentials"),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn test_parse_coaching_messages() {
        let response = r#"{"daily_message": " Great job today! ", "weekly_message": "On track.", "monthly_message": "Keep saving."}"#;
        let messages = parse_coaching_messages(response);
        assert_eq!(messages.daily_message, "Great job today!");
        assert_eq!(messages.weekly_message, "On track.");
        assert_eq!(messages.monthly_message, "Keep saving.");
    }

    #[test]
    fn test_parse_coaching_fenced_and_partial() {
        let response = "```json\n{\"daily_message\": \"Slow down today.\"}\n```";
        let messages = parse_coaching_messages(response);
        assert_eq!(messages.daily_message, "Slow down today.");
        assert_eq!(messages.weekly_message, "");
        assert_eq!(messages.monthly_message, "");
    }

    #[test]
    fn test_parse_coaching_raw_fallback() {
        let messages = parse_coaching_messages("You did well today, keep it up!");
        assert_eq!(messages.daily_message, "You did well today, keep it up!");
        assert!(messages.weekly_message.is_empty());
        assert!(messages.monthly_message.is_empty());
    }
}
