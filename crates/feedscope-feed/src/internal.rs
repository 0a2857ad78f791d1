use serde::Deserialize;
use serde_json::Value;

/// Heuristic for requests made by internal API clients
///
/// A message counts as internal when its body is a JSON object whose
/// `remote_ip` and `url` fields both start with the configured prefixes.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InternalRule {
    /// Required prefix of the `remote_ip` field
    pub ip_prefix: String,

    /// Required prefix of the `url` field
    pub url_prefix: String,
}

impl InternalRule {
    pub const DEFAULT_IP_PREFIX: &'static str = "10.";
    pub const DEFAULT_URL_PREFIX: &'static str = "/api/now/v1";

    pub fn new(ip_prefix: impl Into<String>, url_prefix: impl Into<String>) -> Self {
        Self {
            ip_prefix: ip_prefix.into(),
            url_prefix: url_prefix.into(),
        }
    }

    /// Classify a message body. Anything that is not a JSON object with
    /// both string fields is not internal.
    pub fn is_internal_request(&self, content: &str) -> bool {
        let Ok(value) = serde_json::from_str::<Value>(content) else {
            return false;
        };

        let field = |name: &str| value.get(name).and_then(Value::as_str);

        match (field("remote_ip"), field("url")) {
            (Some(ip), Some(url)) => {
                ip.starts_with(&self.ip_prefix) && url.starts_with(&self.url_prefix)
            }
            _ => false,
        }
    }
}

impl Default for InternalRule {
    fn default() -> Self {
        Self::new(Self::DEFAULT_IP_PREFIX, Self::DEFAULT_URL_PREFIX)
    }
}

/// Classify a message body with the default rule
pub fn is_internal_request(content: &str) -> bool {
    InternalRule::default().is_internal_request(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_request() {
        assert!(is_internal_request(
            r#"{"remote_ip":"10.1.2.3","url":"/api/now/v1/foo"}"#
        ));
    }

    #[test]
    fn test_external_ip() {
        assert!(!is_internal_request(
            r#"{"remote_ip":"192.168.1.1","url":"/api/now/v1/foo"}"#
        ));
    }

    #[test]
    fn test_other_url() {
        assert!(!is_internal_request(
            r#"{"remote_ip":"10.1.2.3","url":"/api/other"}"#
        ));
    }

    #[test]
    fn test_not_json() {
        assert!(!is_internal_request("not json"));
        assert!(!is_internal_request(""));
        assert!(!is_internal_request(r#"{"remote_ip":"10.1.2.3""#));
    }

    #[test]
    fn test_missing_fields() {
        assert!(!is_internal_request(r#"{"remote_ip":"10.1.2.3"}"#));
        assert!(!is_internal_request(r#"{"url":"/api/now/v1/foo"}"#));
        assert!(!is_internal_request("{}"));
    }

    #[test]
    fn test_non_object_and_non_string_fields() {
        assert!(!is_internal_request("[1, 2, 3]"));
        assert!(!is_internal_request(r#""10.1.2.3""#));
        assert!(!is_internal_request(r#"{"remote_ip":10,"url":"/api/now/v1"}"#));
    }

    #[test]
    fn test_prefix_is_literal() {
        // "100." does not start with "10." once the dot is taken literally
        assert!(!is_internal_request(
            r#"{"remote_ip":"100.1.2.3","url":"/api/now/v1/foo"}"#
        ));
    }

    #[test]
    fn test_custom_rule() {
        let rule = InternalRule::new("172.16.", "/internal");
        assert!(rule.is_internal_request(r#"{"remote_ip":"172.16.0.9","url":"/internal/x"}"#));
        assert!(!rule.is_internal_request(r#"{"remote_ip":"10.0.0.1","url":"/api/now/v1"}"#));
    }

    #[test]
    fn test_rule_deserializes_with_defaults() {
        let rule: InternalRule = serde_json::from_str(r#"{"url_prefix":"/v2"}"#).unwrap();
        assert_eq!(rule.ip_prefix, "10.");
        assert_eq!(rule.url_prefix, "/v2");
    }
}
