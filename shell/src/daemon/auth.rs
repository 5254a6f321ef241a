// Syncrypt Desktop - Daemon API Token
// The daemon writes its API token into its own config file

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ShellError;

static AUTH_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"auth_token = ([a-zA-Z0-9]+)").expect("auth token pattern"));

pub fn parse_auth_token(config: &str) -> Option<String> {
    AUTH_TOKEN
        .captures(config)
        .and_then(|captures| captures.get(1))
        .map(|token| token.as_str().to_string())
}

/// Read the API token from the daemon config file
pub fn read_auth_token(path: &Path) -> Result<String, ShellError> {
    let config = std::fs::read_to_string(path).map_err(|e| {
        ShellError::DaemonConfig(format!("cannot read {}: {}", path.display(), e))
    })?;
    parse_auth_token(&config)
        .ok_or_else(|| ShellError::DaemonConfig(format!("no auth_token in {}", path.display())))
}
