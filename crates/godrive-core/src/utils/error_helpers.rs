use crate::error::ApiError;
use serde_json::Value;

/// Helper functions for standardizing error conversions across the codebase.
/// Convert reqwest transport errors to ApiError with endpoint context
pub fn convert_request_error(error: reqwest::Error, endpoint: &str, timeout_secs: u64) -> ApiError {
    if error.is_timeout() {
        convert_timeout_error(endpoint, timeout_secs)
    } else if error.is_decode() {
        ApiError::Decode {
            endpoint: endpoint.to_string(),
            message: error.to_string(),
        }
    } else {
        ApiError::Network {
            endpoint: endpoint.to_string(),
            message: error.to_string(),
        }
    }
}

/// Convert timeout errors to ApiError with endpoint context
pub fn convert_timeout_error(endpoint: &str, timeout_secs: u64) -> ApiError {
    ApiError::Timeout {
        timeout_secs,
        endpoint: endpoint.to_string(),
    }
}

/// Convert JSON deserialization errors to ApiError with endpoint context
pub fn convert_json_error(error: serde_json::Error, endpoint: &str) -> ApiError {
    ApiError::Decode {
        endpoint: endpoint.to_string(),
        message: format!("JSON parse error: {}", error),
    }
}

/// Turn an `Http` error with one of `statuses` into a `Validation` error.
pub fn as_validation_error(error: ApiError, statuses: &[u16]) -> ApiError {
    match error {
        ApiError::Http {
            status,
            endpoint,
            body,
        } if statuses.contains(&status) => ApiError::Validation {
            status,
            endpoint,
            message: extract_server_message(&body),
        },
        other => other,
    }
}

/// Pull a human readable message out of an error body.
///
/// Understands `{"message": "..."}`, `{"message": ["...", "..."]}` and
/// `{"error": "..."}`; anything else is returned trimmed.
pub fn extract_server_message(body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        match map.get("message") {
            Some(Value::String(message)) => return message.clone(),
            Some(Value::Array(messages)) => {
                let joined: Vec<&str> = messages.iter().filter_map(Value::as_str).collect();
                if !joined.is_empty() {
                    return joined.join("; ");
                }
            }
            _ => {}
        }
        if let Some(Value::String(error)) = map.get("error") {
            return error.clone();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Request rejected by server".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_timeout_error() {
        let api_error = convert_timeout_error("/auth/me", 30);
        match api_error {
            ApiError::Timeout {
                endpoint,
                timeout_secs,
            } => {
                assert_eq!(endpoint, "/auth/me");
                assert_eq!(timeout_secs, 30);
            }
            _ => panic!("Expected Timeout error"),
        }
    }

    #[test]
    fn test_convert_json_error() {
        let json_error = serde_json::from_str::<Value>("{").unwrap_err();
        let api_error = convert_json_error(json_error, "/instructors");
        assert!(matches!(api_error, ApiError::Decode { .. }));
        assert_eq!(api_error.endpoint(), "/instructors");
    }

    #[test]
    fn test_as_validation_error_maps_listed_status() {
        let error = ApiError::Http {
            status: 422,
            endpoint: "/auth/register".to_string(),
            body: r#"{"message":["email must be an email","password too short"]}"#.to_string(),
        };
        match as_validation_error(error, &[400, 422]) {
            ApiError::Validation {
                status, message, ..
            } => {
                assert_eq!(status, 422);
                assert_eq!(message, "email must be an email; password too short");
            }
            other => panic!("Expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_as_validation_error_keeps_other_status() {
        let error = ApiError::Http {
            status: 500,
            endpoint: "/auth/login".to_string(),
            body: "boom".to_string(),
        };
        assert_eq!(as_validation_error(error.clone(), &[400, 422]), error);
    }

    #[test]
    fn test_extract_server_message() {
        assert_eq!(extract_server_message(r#"{"message":"Bad"}"#), "Bad");
        assert_eq!(extract_server_message(r#"{"error":"Nope"}"#), "Nope");
        assert_eq!(extract_server_message("  plain text "), "plain text");
        assert_eq!(extract_server_message(""), "Request rejected by server");
    }
}
