use anyhow::{Context, Result};
use keyring::Entry;

pub const API_URL_ENV: &str = "DOCCHAT_API_URL";
pub const API_TOKEN_REF_ENV: &str = "DOCCHAT_API_TOKEN_REF";
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

const KEYRING_SERVICE: &str = "docchat_api_token";

/// Where the backend lives and how to find its bearer token.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiConfig {
    pub base_url: String,
    // 'env:MY_TOKEN', 'keyring', or None for unauthenticated backends
    pub token_ref: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            token_ref: None,
        }
    }
}

impl ApiConfig {
    pub fn new(base_url: &str, token_ref: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token_ref,
        }
    }

    /// Reads `DOCCHAT_API_URL` and `DOCCHAT_API_TOKEN_REF`, falling back to
    /// the local development backend.
    pub fn from_env() -> Self {
        let base_url = std::env::var(API_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let token_ref = std::env::var(API_TOKEN_REF_ENV)
            .ok()
            .filter(|r| !r.trim().is_empty());
        log::debug!("API base URL: {}", base_url);
        Self::new(&base_url, token_ref)
    }

    /// Full URL for an API path such as `/conversations/open`.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Resolves the bearer token named by `token_ref`.
/// Environment variables and the OS keyring are supported.
pub fn resolve_api_token(config: &ApiConfig) -> Result<Option<String>> {
    match config.token_ref.as_deref() {
        None => Ok(None),
        Some(ref_str) if ref_str.starts_with("env:") => {
            let env_var_name = ref_str.trim_start_matches("env:");
            log::debug!("Retrieving API token from environment variable: {}", env_var_name);
            std::env::var(env_var_name)
                .map(Some)
                .context(format!(
                    "Failed to get API token from environment variable '{}'",
                    env_var_name
                ))
        }
        Some("keyring") => {
            let entry = Entry::new(KEYRING_SERVICE, &config.base_url)
                .context("Failed to create keyring entry")?;
            log::debug!("Retrieving API token from keyring for: {}", config.base_url);
            entry.get_password().map(Some).context(format!(
                "Failed to get API token from keyring for '{}'",
                config.base_url
            ))
        }
        Some(other) => Err(anyhow::anyhow!("Unsupported token_ref format: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, MutexGuard};

    // Tests touching the process environment take this lock; each also uses
    // its own variable name so nothing else in the test binary can observe it.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn env_lock() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[test]
    fn new_trims_trailing_slashes() {
        let config = ApiConfig::new("http://example.test/api//", None);
        assert_eq!(config.base_url, "http://example.test/api");
    }

    #[test]
    fn url_joins_with_single_slash() {
        let config = ApiConfig::new("http://example.test/api", None);
        assert_eq!(
            config.url("/conversations/open"),
            "http://example.test/api/conversations/open"
        );
        assert_eq!(
            config.url("scores?conversation_id=1"),
            "http://example.test/api/scores?conversation_id=1"
        );
    }

    #[test]
    fn default_points_at_local_backend() {
        assert_eq!(ApiConfig::default().base_url, DEFAULT_API_URL);
    }

    #[test]
    fn no_token_ref_means_no_token() {
        let config = ApiConfig::new("http://x", None);
        assert_eq!(resolve_api_token(&config).unwrap(), None);
    }

    #[test]
    fn env_token_ref_reads_variable() {
        let _env = env_lock();
        std::env::set_var("DOCCHAT_TEST_TOKEN_PRESENT", "s3cret");
        let config = ApiConfig::new("http://x", Some("env:DOCCHAT_TEST_TOKEN_PRESENT".into()));
        assert_eq!(resolve_api_token(&config).unwrap().as_deref(), Some("s3cret"));
    }

    #[test]
    fn env_token_ref_missing_variable_is_an_error() {
        let _env = env_lock();
        let config = ApiConfig::new("http://x", Some("env:DOCCHAT_TEST_TOKEN_ABSENT".into()));
        let err = resolve_api_token(&config).unwrap_err();
        assert!(err.to_string().contains("DOCCHAT_TEST_TOKEN_ABSENT"));
    }

    #[test]
    fn unknown_token_ref_is_rejected() {
        let config = ApiConfig::new("http://x", Some("vault:abc".into()));
        assert!(resolve_api_token(&config).is_err());
    }
}
