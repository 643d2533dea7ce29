//! OVH API endpoints
//!
//! OVH runs one API per region and brand. Configuration names them by alias,
//! the way OVH's own client libraries do; an absolute URL is accepted too.

use dns01_core::{Error, Result};

/// Known endpoint aliases and their base URLs
pub const ENDPOINTS: &[(&str, &str)] = &[
    ("ovh-eu", "https://eu.api.ovh.com/1.0"),
    ("ovh-ca", "https://ca.api.ovh.com/1.0"),
    ("ovh-us", "https://api.us.ovhcloud.com/1.0"),
    ("kimsufi-eu", "https://eu.api.kimsufi.com/1.0"),
    ("kimsufi-ca", "https://ca.api.kimsufi.com/1.0"),
    ("soyoustart-eu", "https://eu.api.soyoustart.com/1.0"),
    ("soyoustart-ca", "https://ca.api.soyoustart.com/1.0"),
];

/// Resolve an alias or URL to a base URL without a trailing slash
pub fn resolve_endpoint(endpoint: &str) -> Result<String> {
    let endpoint = endpoint.trim();

    if endpoint.starts_with("https://") || endpoint.starts_with("http://") {
        return Ok(endpoint.trim_end_matches('/').to_string());
    }

    ENDPOINTS
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(endpoint))
        .map(|(_, url)| url.to_string())
        .ok_or_else(|| {
            let known: Vec<&str> = ENDPOINTS.iter().map(|(alias, _)| *alias).collect();
            Error::config(format!(
                "Unknown OVH endpoint '{}'. Known endpoints: {}",
                endpoint,
                known.join(", ")
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_resolve() {
        assert_eq!(resolve_endpoint("ovh-eu").unwrap(), "https://eu.api.ovh.com/1.0");
        assert_eq!(resolve_endpoint("OVH-CA").unwrap(), "https://ca.api.ovh.com/1.0");
        assert_eq!(
            resolve_endpoint("ovh-us").unwrap(),
            "https://api.us.ovhcloud.com/1.0"
        );
    }

    #[test]
    fn urls_pass_through_without_trailing_slash() {
        assert_eq!(
            resolve_endpoint("http://127.0.0.1:8080/").unwrap(),
            "http://127.0.0.1:8080"
        );
    }

    #[test]
    fn unknown_alias_lists_known_ones() {
        let err = resolve_endpoint("ovh-mars").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("ovh-mars"));
        assert!(msg.contains("ovh-eu"));
    }
}
