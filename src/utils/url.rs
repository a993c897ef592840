//! Endpoint URL construction for the gateway and the chat-completions API.
//!
//! Base URLs come from user config and may or may not end with a slash.

/// Strip trailing slashes from a configured base URL.
///
/// ```
/// use tracelens::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("http://127.0.0.1:5000/"), "http://127.0.0.1:5000");
/// assert_eq!(normalize_base_url("https://ai.example.com/api/v1//"), "https://ai.example.com/api/v1");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

/// Join a base URL and an endpoint path with exactly one slash.
///
/// ```
/// use tracelens::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("http://127.0.0.1:5000/", "/api/analyze-pdf"),
///     "http://127.0.0.1:5000/api/analyze-pdf"
/// );
/// assert_eq!(
///     construct_api_url("https://ai.example.com/api/v1", "chat/completions"),
///     "https://ai.example.com/api/v1/chat/completions"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{normalized_base}/{endpoint}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_handles_edge_cases() {
        assert_eq!(normalize_base_url("http://localhost:5000"), "http://localhost:5000");
        assert_eq!(normalize_base_url("  http://localhost:5000/  "), "http://localhost:5000");
        assert_eq!(normalize_base_url(""), "");
        assert_eq!(normalize_base_url("///"), "");
    }

    #[test]
    fn gateway_endpoints() {
        for base in ["http://gw:5000", "http://gw:5000/", "http://gw:5000///"] {
            assert_eq!(
                construct_api_url(base, "api/stream-analyze-pdf"),
                "http://gw:5000/api/stream-analyze-pdf"
            );
            assert_eq!(
                construct_api_url(base, "///api/api-key"),
                "http://gw:5000/api/api-key"
            );
        }
    }
}
