//! Request validation and coercion.

use engagement_common::{PredictionPayload, PredictionRequest};
use serde_json::Value;

use crate::error::{Error, Result};

/// Check required fields and coerce a raw request into an inference payload.
///
/// `followers` and `ad_boost` only need to be present: zero and `false` are
/// valid values. Date and time are passed through as sent; the inference
/// script falls back to defaults for values it cannot parse.
pub fn validate(request: PredictionRequest) -> Result<PredictionPayload> {
    let PredictionRequest {
        caption,
        content,
        platform,
        post_date,
        post_time,
        followers,
        ad_boost,
    } = request;

    let missing: Vec<&str> = [
        ("platform", is_blank(&platform)),
        ("post_date", is_blank(&post_date)),
        ("post_time", is_blank(&post_time)),
        ("followers", followers.is_none()),
        ("ad_boost", ad_boost.is_none()),
    ]
    .into_iter()
    .filter_map(|(name, missing)| missing.then_some(name))
    .collect();

    if !missing.is_empty() {
        return Err(Error::Validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    let platform = platform.unwrap_or_default().trim().to_string();
    let post_date = post_date.unwrap_or_default().trim().to_string();
    let post_time = post_time.unwrap_or_default().trim().to_string();

    let followers = followers
        .as_ref()
        .and_then(coerce_followers)
        .ok_or_else(|| Error::Validation("followers must be a non-negative number".to_string()))?;

    let ad_boost = ad_boost
        .as_ref()
        .and_then(coerce_flag)
        .ok_or_else(|| Error::Validation("ad_boost must be 0, 1, true or false".to_string()))?;

    Ok(PredictionPayload {
        caption: caption.unwrap_or_default(),
        content: content.unwrap_or_default(),
        platform,
        post_date,
        post_time,
        followers,
        ad_boost,
    })
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |s| s.trim().is_empty())
}

fn coerce_followers(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (number.is_finite() && number >= 0.0).then_some(number)
}

fn coerce_flag(value: &Value) -> Option<u8> {
    match value {
        Value::Bool(b) => Some(u8::from(*b)),
        Value::Number(n) => match n.as_f64()? {
            x if x == 0.0 => Some(0),
            x if x == 1.0 => Some(1),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "0" | "false" => Some(0),
            "1" | "true" => Some(1),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn complete() -> PredictionRequest {
        PredictionRequest {
            caption: Some("Weekend offer".to_string()),
            content: None,
            platform: Some("Facebook".to_string()),
            post_date: Some("2025-05-10".to_string()),
            post_time: Some("20:15".to_string()),
            followers: Some(json!(1200)),
            ad_boost: Some(json!(true)),
        }
    }

    fn validation_message(request: PredictionRequest) -> String {
        match validate(request) {
            Err(Error::Validation(msg)) => msg,
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_complete_request_is_coerced() {
        let payload = validate(complete()).unwrap();
        assert_eq!(payload.caption, "Weekend offer");
        assert_eq!(payload.content, "");
        assert_eq!(payload.platform, "Facebook");
        assert_eq!(payload.followers, 1200.0);
        assert_eq!(payload.ad_boost, 1);
    }

    #[test]
    fn test_zero_and_false_are_present() {
        let mut request = complete();
        request.followers = Some(json!(0));
        request.ad_boost = Some(json!(false));

        let payload = validate(request).unwrap();
        assert_eq!(payload.followers, 0.0);
        assert_eq!(payload.ad_boost, 0);
    }

    #[test]
    fn test_each_missing_field_is_named() {
        let cases: [(&str, fn(&mut PredictionRequest)); 5] = [
            ("platform", |r| r.platform = None),
            ("post_date", |r| r.post_date = Some(String::new())),
            ("post_time", |r| r.post_time = Some("   ".to_string())),
            ("followers", |r| r.followers = None),
            ("ad_boost", |r| r.ad_boost = None),
        ];

        for (field, strip) in cases {
            let mut request = complete();
            strip(&mut request);
            let msg = validation_message(request);
            assert!(msg.contains(field), "{} not in '{}'", field, msg);
        }
    }

    #[test]
    fn test_all_missing_fields_reported_together() {
        let msg = validation_message(PredictionRequest::default());
        assert_eq!(
            msg,
            "Missing required fields: platform, post_date, post_time, followers, ad_boost"
        );
    }

    #[test]
    fn test_string_numbers_are_coerced() {
        let mut request = complete();
        request.followers = Some(json!(" 350 "));
        request.ad_boost = Some(json!("1"));

        let payload = validate(request).unwrap();
        assert_eq!(payload.followers, 350.0);
        assert_eq!(payload.ad_boost, 1);
    }

    #[test]
    fn test_malformed_values_rejected() {
        let mut request = complete();
        request.followers = Some(json!(-5));
        assert!(validation_message(request).contains("followers"));

        let mut request = complete();
        request.followers = Some(json!("lots"));
        assert!(validation_message(request).contains("followers"));

        let mut request = complete();
        request.ad_boost = Some(json!(2));
        assert!(validation_message(request).contains("ad_boost"));

        let mut request = complete();
        request.ad_boost = Some(json!("maybe"));
        assert!(validation_message(request).contains("ad_boost"));
    }

    #[test]
    fn test_date_and_time_passed_through() {
        let mut request = complete();
        request.post_date = Some(" 10/05/2025 ".to_string());
        request.post_time = Some("8pm".to_string());

        let payload = validate(request).unwrap();
        assert_eq!(payload.post_date, "10/05/2025");
        assert_eq!(payload.post_time, "8pm");
    }
}
