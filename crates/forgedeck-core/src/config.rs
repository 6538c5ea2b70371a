//! Environment-driven configuration.

/// Base URL used when no override is present.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Environment variable overriding the build service base URL.
pub const API_URL_ENV: &str = "FORGEDECK_API_URL";

/// Resolve the build service base URL from the environment.
pub fn api_url_from_env() -> String {
    resolve_api_url(std::env::var(API_URL_ENV).ok())
}

fn resolve_api_url(override_url: Option<String>) -> String {
    override_url
        .map(|url| url.trim().trim_end_matches('/').to_string())
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string())
}
