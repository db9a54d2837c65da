// ── URL directory ──
//
// Named URL templates published by the server at bootstrap. Templates
// carry `{param}` placeholders that are filled in textually: values are
// NOT percent-encoded, so callers must pass URL-safe values.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Parameters substituted into a URL template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlParams(HashMap<String, String>);

impl UrlParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter; the value is converted with `Display`.
    pub fn with(mut self, name: impl Into<String>, value: impl fmt::Display) -> Self {
        self.0.insert(name.into(), value.to_string());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

impl<K: Into<String>, V: fmt::Display> FromIterator<(K, V)> for UrlParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |params, (k, v)| params.with(k, v))
    }
}

/// Immutable mapping from endpoint name to URL template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UrlDirectory {
    templates: HashMap<String, String>,
}

impl UrlDirectory {
    pub fn new(templates: HashMap<String, String>) -> Self {
        Self { templates }
    }

    /// The raw template registered under `name`.
    pub fn template(&self, name: &str) -> Option<&str> {
        self.templates.get(name).map(String::as_str)
    }

    /// Endpoint names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Resolve the named template, substituting every `{param}` token.
    ///
    /// Tokens are `{` + one or more word characters or hyphens + `}`;
    /// anything else (including a lone `{`) is copied through unchanged.
    /// Substituted values are not re-scanned.
    pub fn resolve(&self, name: &str, params: &UrlParams) -> Result<String, CoreError> {
        let template = self
            .template(name)
            .ok_or_else(|| CoreError::UnknownEndpoint { name: name.into() })?;

        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let ident_len = after
                .find(|c: char| !is_placeholder_char(c))
                .unwrap_or(after.len());

            if ident_len > 0 && after[ident_len..].starts_with('}') {
                let ident = &after[..ident_len];
                let value = params
                    .get(ident)
                    .ok_or_else(|| CoreError::MissingParameter { name: ident.into() })?;
                out.push_str(value);
                rest = &after[ident_len + 1..];
            } else {
                out.push('{');
                rest = after;
            }
        }
        out.push_str(rest);

        Ok(out)
    }
}

impl From<HashMap<String, String>> for UrlDirectory {
    fn from(templates: HashMap<String, String>) -> Self {
        Self::new(templates)
    }
}

fn is_placeholder_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn directory() -> UrlDirectory {
        [
            ("devices", "//10.0.0.2:8080/api/devices"),
            ("device", "//10.0.0.2:8080/api/devices/{mac}"),
            ("reboot_device", "//10.0.0.2:8080/api/devices/{mac}/reboot"),
            ("mirror", "/api/{mac}/to/{mac}"),
            ("hyphen", "/api/{device-id}/x_{port_no}"),
            ("literal", "/api/{not a token}/{}/{mac"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect::<HashMap<_, _>>()
        .into()
    }

    #[test]
    fn template_without_placeholders_is_unchanged() {
        let dir = directory();
        assert_eq!(
            dir.resolve("devices", &UrlParams::new()).unwrap(),
            "//10.0.0.2:8080/api/devices"
        );
        let extra = UrlParams::new().with("mac", "aa").with("unused", 1);
        assert_eq!(
            dir.resolve("devices", &extra).unwrap(),
            "//10.0.0.2:8080/api/devices"
        );
    }

    #[test]
    fn substitutes_placeholder() {
        let dir = directory();
        let params = UrlParams::new().with("mac", "04:18:d6:00:00:01");
        assert_eq!(
            dir.resolve("reboot_device", &params).unwrap(),
            "//10.0.0.2:8080/api/devices/04:18:d6:00:00:01/reboot"
        );
    }

    #[test]
    fn substitutes_every_occurrence() {
        let dir = directory();
        let params = UrlParams::new().with("mac", "aa");
        assert_eq!(dir.resolve("mirror", &params).unwrap(), "/api/aa/to/aa");
    }

    #[test]
    fn hyphens_and_underscores_are_identifier_chars() {
        let dir = directory();
        let params: UrlParams = [("device-id", "7"), ("port_no", "3")].into_iter().collect();
        assert_eq!(dir.resolve("hyphen", &params).unwrap(), "/api/7/x_3");
    }

    #[test]
    fn non_tokens_are_left_alone() {
        let dir = directory();
        assert_eq!(
            dir.resolve("literal", &UrlParams::new()).unwrap(),
            "/api/{not a token}/{}/{mac"
        );
    }

    #[test]
    fn values_are_not_encoded() {
        let dir = directory();
        let params = UrlParams::new().with("mac", "a b/../c?d");
        assert_eq!(
            dir.resolve("device", &params).unwrap(),
            "//10.0.0.2:8080/api/devices/a b/../c?d"
        );
    }

    #[test]
    fn values_are_not_rescanned() {
        let dir = directory();
        let params = UrlParams::new().with("mac", "{mac}");
        assert_eq!(dir.resolve("mirror", &params).unwrap(), "/api/{mac}/to/{mac}");
    }

    #[test]
    fn unknown_endpoint() {
        let err = directory().resolve("nope", &UrlParams::new()).unwrap_err();
        assert!(matches!(err, CoreError::UnknownEndpoint { ref name } if name == "nope"));
    }

    #[test]
    fn missing_parameter() {
        let err = directory()
            .resolve("reboot_device", &UrlParams::new().with("id", 1))
            .unwrap_err();
        assert!(matches!(err, CoreError::MissingParameter { ref name } if name == "mac"));
        assert_eq!(err.to_string(), "Missing parameter mac");
    }

    #[test]
    fn deserializes_from_server_json() {
        let dir: UrlDirectory = serde_json::from_str(
            r#"{"devices": "/api/devices", "device": "/api/devices/{mac}"}"#,
        )
        .unwrap();
        assert_eq!(dir.names(), vec!["device", "devices"]);
        assert_eq!(dir.len(), 2);
    }
}
