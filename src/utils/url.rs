//! Endpoint URL assembly.
//!
//! Base URLs come from the environment (`OPENAI_BASE_URL`,
//! `ANTHROPIC_BASE_URL`) and may carry trailing slashes; endpoint paths may
//! carry leading ones. Joining them never produces `//`.

/// Strip trailing slashes from a base URL.
///
/// ```
/// use gail::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("https://api.openai.com/v1/"), "https://api.openai.com/v1");
/// assert_eq!(normalize_base_url("https://proxy.local//"), "https://proxy.local");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Join a base URL and an endpoint path with exactly one slash.
///
/// ```
/// use gail::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("https://api.anthropic.com/v1/", "/messages"),
///     "https://api.anthropic.com/v1/messages"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        normalize_base_url(base_url),
        endpoint.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_urls_lose_trailing_slashes_only() {
        assert_eq!(
            normalize_base_url("https://api.openai.com/v1"),
            "https://api.openai.com/v1"
        );
        assert_eq!(
            normalize_base_url("https://api.openai.com/v1///"),
            "https://api.openai.com/v1"
        );
        assert_eq!(normalize_base_url(""), "");
    }

    #[test]
    fn endpoints_with_path_segments_join_cleanly() {
        assert_eq!(
            construct_api_url("https://api.openai.com/v1", "threads/thread_1/runs/run_9"),
            "https://api.openai.com/v1/threads/thread_1/runs/run_9"
        );
        assert_eq!(
            construct_api_url("http://localhost:8080/", "//responses"),
            "http://localhost:8080/responses"
        );
    }
}
