//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{CacheError, Result};

/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Request body for the PUT operation (PUT /set)
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: Any JSON value
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    pub value: Value,
}

impl SetRequest {
    /// Rejects keys the HTTP surface does not accept. Values are never
    /// inspected; any JSON value can be stored.
    pub fn validate(&self) -> Result<()> {
        let reason = match self.key.len() {
            0 => "key cannot be empty".to_string(),
            len if len > MAX_KEY_LENGTH => {
                format!("key is {} bytes, limit is {}", len, MAX_KEY_LENGTH)
            }
            _ => return Ok(()),
        };
        Err(CacheError::InvalidRequest(reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_request_deserialize() {
        let json = r#"{"key": "test", "value": {"nested": [1, 2]}}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.key, "test");
        assert_eq!(req.value, json!({"nested": [1, 2]}));
    }

    #[test]
    fn test_set_request_requires_value() {
        let json = r#"{"key": "test"}"#;
        assert!(serde_json::from_str::<SetRequest>(json).is_err());
    }

    fn request(key: String) -> SetRequest {
        SetRequest {
            key,
            value: json!(null),
        }
    }

    #[test]
    fn test_validate_key_length() {
        for bad in [String::new(), "x".repeat(MAX_KEY_LENGTH + 1)] {
            assert!(matches!(
                request(bad).validate(),
                Err(CacheError::InvalidRequest(_))
            ));
        }

        assert!(request("x".repeat(MAX_KEY_LENGTH)).validate().is_ok());
        assert!(request("user:1".to_string()).validate().is_ok());
    }
}
