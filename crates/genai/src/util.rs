//! Shared utility functions for the model adapter.

use ll_domain::config::GenAiConfig;
use ll_domain::error::{Error, Result};

/// Convert a [`reqwest::Error`] into the domain [`Error`] type.
///
/// Timeout errors map to [`Error::Timeout`]; everything else maps to
/// [`Error::Http`].
pub(crate) fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}

/// Resolve the API key from the genai config.
///
/// Precedence:
/// 1. `api_key` field (plaintext — warn)
/// 2. the environment variable named by `api_key_env`
/// 3. Error
pub fn resolve_api_key(cfg: &GenAiConfig) -> Result<String> {
    if let Some(ref key) = cfg.api_key {
        tracing::warn!(
            "API key loaded from plaintext config field 'api_key' — \
             prefer 'api_key_env' instead"
        );
        return Ok(key.clone());
    }

    std::env::var(&cfg.api_key_env).map_err(|_| {
        Error::Auth(format!(
            "environment variable '{}' not set or not valid UTF-8",
            cfg.api_key_env
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plaintext_key_takes_precedence() {
        let var = "LL_TEST_KEY_PRECEDENCE_1";
        std::env::set_var(var, "env-loses");
        let cfg = GenAiConfig {
            api_key: Some("plaintext-wins".into()),
            api_key_env: var.into(),
            ..Default::default()
        };
        assert_eq!(resolve_api_key(&cfg).unwrap(), "plaintext-wins");
        std::env::remove_var(var);
    }

    #[test]
    fn env_var_key() {
        let var = "LL_TEST_KEY_FROM_ENV_2";
        std::env::set_var(var, "env-secret");
        let cfg = GenAiConfig {
            api_key_env: var.into(),
            ..Default::default()
        };
        assert_eq!(resolve_api_key(&cfg).unwrap(), "env-secret");
        std::env::remove_var(var);
    }

    #[test]
    fn missing_key_is_auth_error() {
        let cfg = GenAiConfig {
            api_key_env: "LL_TEST_NONEXISTENT_VAR_3".into(),
            ..Default::default()
        };
        let err = resolve_api_key(&cfg).unwrap_err();
        assert!(err.to_string().contains("LL_TEST_NONEXISTENT_VAR_3"));
    }
}
