//! Utility functions for notification channels

use serde_json::Value;

/// Redact sensitive fields from JSON configuration
///
/// Replaces values for fields that commonly contain sensitive information:
/// - password, passwd, pwd
/// - token, secret
/// - api_key, apikey
/// - credentials
pub fn redact_sensitive_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut redacted = serde_json::Map::new();
            for (key, val) in map {
                if is_sensitive_key(key) {
                    redacted.insert(key.clone(), Value::String("***".to_string()));
                } else {
                    redacted.insert(key.clone(), redact_sensitive_json(val));
                }
            }
            Value::Object(redacted)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(redact_sensitive_json).collect()),
        _ => value.clone(),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let key = key.to_lowercase();
    ["password", "passwd", "pwd", "token", "secret", "api_key", "apikey", "credentials"]
        .iter()
        .any(|needle| key.contains(needle))
}
