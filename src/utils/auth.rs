//! Authentication header for chat-completions requests.

/// Attach `Authorization: Bearer <key>`. A blank key sends no header so a
/// keyless local endpoint still works.
pub fn add_auth_headers(request: reqwest::RequestBuilder, api_key: &str) -> reqwest::RequestBuilder {
    let api_key = api_key.trim();
    if api_key.is_empty() {
        return request;
    }
    request.header("Authorization", format!("Bearer {api_key}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_header_is_added() {
        let client = reqwest::Client::new();
        let request = add_auth_headers(client.get("https://example.com"), " test-key ")
            .build()
            .unwrap();
        assert_eq!(
            request
                .headers()
                .get("authorization")
                .and_then(|value| value.to_str().ok()),
            Some("Bearer test-key")
        );
    }

    #[test]
    fn blank_key_sends_no_header() {
        let client = reqwest::Client::new();
        let request = add_auth_headers(client.get("https://example.com"), "  ")
            .build()
            .unwrap();
        assert!(request.headers().get("authorization").is_none());
    }
}
