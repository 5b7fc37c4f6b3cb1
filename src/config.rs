// Backend configuration, loaded from the environment with local defaults.

use std::env;

/// Environment variable selecting the upload/completion backend origin.
pub const BACKEND_URL_VAR: &str = "BIOLENS_BACKEND_URL";

/// Fallback when the environment variable is unset. localhost instead of
/// 0.0.0.0 so the default works from a browser or another host process.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

lazy_static::lazy_static! {
    pub static ref BACKEND_URL: String = backend_url_from_env();
}

/// Strip any trailing slash so path joins never produce a double slash.
pub fn normalize_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Resolve the backend base URL from `BIOLENS_BACKEND_URL`, normalized.
pub fn backend_url_from_env() -> String {
    let raw = env::var(BACKEND_URL_VAR).unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string());
    normalize_base_url(&raw)
}
