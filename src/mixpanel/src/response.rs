use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tracing::warn;

use crate::error::MixpanelError;
use crate::error::Result;

lazy_static! {
    /// Mixpanel phrases credential problems in terms of the api key.
    static ref API_KEY_RE: Regex = Regex::new(r"(?i)api[ _-]?key").unwrap();
}

/// Mixpanel answers 200 for many logical failures; the `status` field in
/// the body is the real verdict. A falsy status turns the body's error
/// message into a structured rejection.
pub fn interpret(body: Value) -> Result<Value> {
    if truthy(body.get("status")) {
        return Ok(body);
    }

    let message = body
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("destination returned a falsy status")
        .to_string();
    warn!(error = message.as_str(), "destination rejected the call");

    if API_KEY_RE.is_match(&message) {
        Err(MixpanelError::Unauthorized(message))
    } else {
        Err(MixpanelError::BadRequest(message))
    }
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(v)) => *v,
        Some(Value::Number(v)) => v.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Some(Value::String(v)) => !v.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn truthy_status_passes_the_body_through() {
        let body = json!({"status": 1, "error": null});
        assert_eq!(interpret(body.clone()).unwrap(), body);
        assert!(interpret(json!({"status": true})).is_ok());
    }

    #[test]
    fn falsy_status_becomes_bad_request() {
        let err = interpret(json!({"status": 0, "error": "data malformed"})).unwrap_err();
        match err {
            MixpanelError::BadRequest(msg) => assert_eq!(msg, "data malformed"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn api_key_message_becomes_unauthorized() {
        let err = interpret(json!({"status": 0, "error": "bad api_key provided"})).unwrap_err();
        assert!(matches!(err, MixpanelError::Unauthorized(_)));

        let err = interpret(json!({"status": 0, "error": "Invalid API Key"})).unwrap_err();
        assert!(matches!(err, MixpanelError::Unauthorized(_)));
    }

    #[test]
    fn missing_status_is_a_rejection() {
        let err = interpret(json!({})).unwrap_err();
        assert!(matches!(err, MixpanelError::BadRequest(_)));
    }
}
