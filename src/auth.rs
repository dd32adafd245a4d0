use std::path::PathBuf;

use crate::config::{self, ApiConfig};

/// Try to run a CLI command and capture stdout as a token
fn try_cli_token(command: &str) -> Option<String> {
    let output = std::process::Command::new("sh")
        .args(["-c", command])
        .output()
        .ok()?;

    if output.status.success() {
        non_empty(&String::from_utf8_lossy(&output.stdout))
    } else {
        None
    }
}

fn non_empty(raw: &str) -> Option<String> {
    let token = raw.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Stored token path: ~/.config/labdesk/token
fn token_path() -> Option<PathBuf> {
    Some(config::config_dir()?.join("token"))
}

fn load_stored_token() -> Option<String> {
    let path = token_path()?;
    let token = std::fs::read_to_string(path).ok()?;
    non_empty(&token)
}

/// Resolve the API token, trying in order:
/// 1. Env var named in config
/// 2. Stored token at ~/.config/labdesk/token
/// 3. `token_command` output
///
/// Returns None when nothing is configured; the client then runs without auth.
pub fn load_token(api: &ApiConfig) -> Option<String> {
    if let Some(env_var) = &api.token_env {
        if let Some(token) = std::env::var(env_var).ok().as_deref().and_then(non_empty) {
            return Some(token);
        }
    }

    if let Some(token) = load_stored_token() {
        return Some(token);
    }

    if let Some(cmd) = &api.token_command {
        if let Some(token) = try_cli_token(cmd) {
            return Some(token);
        }
        tracing::warn!(command = %cmd, "token_command produced no token");
    }

    tracing::warn!("no API token found, continuing unauthenticated");
    None
}
