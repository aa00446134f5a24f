//! Runtime secret resolution.
//!
//! Config YAML stores env var NAMES (e.g. `"KALSHI_API_KEY_ID"`); callers
//! invoke [`resolve_secrets_for_mode`] once at startup and pass the result
//! into constructors. `Debug` output redacts values, and error messages
//! reference the env var name, never its contents.
//!
//! Private key material resolves in two steps: an inline-PEM env var wins,
//! otherwise a path env var names a PEM file to read.

use anyhow::{bail, Context, Result};
use serde_json::Value;

use crate::{read_str, FolioMode};

/// Upstream API credentials for one daemon instantiation.
#[derive(Clone)]
pub struct ResolvedSecrets {
    /// Exchange API key id. `None` if the named env var was absent or empty.
    pub api_key_id: Option<String>,
    /// RSA private key PEM text. `None` if neither env var resolved.
    pub private_key_pem: Option<String>,
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecrets")
            .field("api_key_id", &self.api_key_id.as_ref().map(|_| "<REDACTED>"))
            .field(
                "private_key_pem",
                &self.private_key_pem.as_ref().map(|_| "<REDACTED>"),
            )
            .finish()
    }
}

struct SecretEnvNames {
    api_key_id_var: String,
    private_key_pem_var: String,
    private_key_path_var: String,
}

fn parse_env_names(config_json: &Value) -> SecretEnvNames {
    SecretEnvNames {
        api_key_id_var: read_str(config_json, "/upstream/keys_env/api_key_id")
            .unwrap_or_else(|| "KALSHI_API_KEY_ID".to_string()),
        private_key_pem_var: read_str(config_json, "/upstream/keys_env/private_key_pem")
            .unwrap_or_else(|| "KALSHI_PRIVATE_KEY_PEM".to_string()),
        private_key_path_var: read_str(config_json, "/upstream/keys_env/private_key_path")
            .unwrap_or_else(|| "KALSHI_PRIVATE_KEY_PATH".to_string()),
    }
}

/// Resolve a named environment variable; unset or blank yields `None`.
fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Resolve upstream credentials from the environment for the given mode.
///
/// # Enforcement
/// | Mode    | Required                         |
/// |---------|----------------------------------|
/// | LIVE    | api key id + private key         |
/// | DEMO    | api key id + private key         |
/// | OFFLINE | nothing (all optional)           |
pub fn resolve_secrets_for_mode(config_json: &Value, mode: FolioMode) -> Result<ResolvedSecrets> {
    let names = parse_env_names(config_json);

    let api_key_id = resolve_env(&names.api_key_id_var);
    let private_key_pem = match resolve_env(&names.private_key_pem_var) {
        Some(pem) => Some(pem),
        None => match resolve_env(&names.private_key_path_var) {
            Some(path) => Some(std::fs::read_to_string(&path).with_context(|| {
                format!(
                    "failed to read private key file named by env var '{}'",
                    names.private_key_path_var
                )
            })?),
            None => None,
        },
    };

    if matches!(mode, FolioMode::Live | FolioMode::Demo) {
        if api_key_id.is_none() {
            bail!(
                "SECRETS_MISSING mode={}: required env var '{}' (api key id) is not set or empty",
                mode.as_str(),
                names.api_key_id_var,
            );
        }
        if private_key_pem.is_none() {
            bail!(
                "SECRETS_MISSING mode={}: neither env var '{}' (inline PEM) nor '{}' (PEM path) is set",
                mode.as_str(),
                names.private_key_pem_var,
                names.private_key_path_var,
            );
        }
    }

    Ok(ResolvedSecrets {
        api_key_id,
        private_key_pem,
    })
}
