//! Token storage.
//!
//! Reads/writes ~/.config/smartspread/auth.json (0600 on Unix).
//! `SMARTSPREAD_TOKEN` in the environment takes precedence over the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::BackendError;

pub const TOKEN_ENV: &str = "SMARTSPREAD_TOKEN";
pub const DEFAULT_SHEETS_BASE: &str = "https://sheets.googleapis.com";
pub const DEFAULT_DRIVE_BASE: &str = "https://www.googleapis.com";

/// Authentication credentials stored locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthCredentials {
    /// OAuth bearer token with Sheets and Drive scopes
    pub token: String,
    /// Sheets API base URL
    #[serde(default = "default_sheets_base")]
    pub sheets_base: String,
    /// Drive API base URL (open by name, sharing)
    #[serde(default = "default_drive_base")]
    pub drive_base: String,
    /// Account email (for display)
    #[serde(default)]
    pub email: Option<String>,
}

fn default_sheets_base() -> String {
    DEFAULT_SHEETS_BASE.to_string()
}

fn default_drive_base() -> String {
    DEFAULT_DRIVE_BASE.to_string()
}

impl AuthCredentials {
    pub fn new(token: String) -> Self {
        Self {
            token,
            sheets_base: default_sheets_base(),
            drive_base: default_drive_base(),
            email: None,
        }
    }

    /// Point both APIs at one host (test servers, proxies).
    pub fn with_base(mut self, base: &str) -> Self {
        let base = base.trim_end_matches('/');
        self.sheets_base = base.to_string();
        self.drive_base = base.to_string();
        self
    }
}

/// Returns the path to the auth credentials file.
pub fn auth_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|c| c.join("smartspread/auth.json"))
}

/// Load credentials: saved file, with the token replaced by
/// `SMARTSPREAD_TOKEN` when that is set.
/// Returns None if neither is available or the file is invalid.
pub fn load_auth() -> Option<AuthCredentials> {
    let saved = auth_file_path().and_then(|p| load_auth_from(&p));
    match std::env::var(TOKEN_ENV).ok().filter(|t| !t.is_empty()) {
        Some(token) => Some(match saved {
            Some(creds) => AuthCredentials { token, ..creds },
            None => AuthCredentials::new(token),
        }),
        None => saved,
    }
}

pub fn load_auth_from(path: &Path) -> Option<AuthCredentials> {
    let contents = std::fs::read_to_string(path).ok()?;
    let creds: AuthCredentials = serde_json::from_str(&contents).ok()?;
    if creds.token.is_empty() {
        return None;
    }
    Some(creds)
}

/// Save auth credentials to the default location.
pub fn save_auth(creds: &AuthCredentials) -> Result<PathBuf, BackendError> {
    let path = auth_file_path()
        .ok_or_else(|| BackendError::Io("Could not determine config directory".into()))?;
    save_auth_to(&path, creds)?;
    Ok(path)
}

/// Save auth credentials to `path`.
/// Creates the parent directory if it doesn't exist.
/// Sets 0600 permissions on Unix.
pub fn save_auth_to(path: &Path, creds: &AuthCredentials) -> Result<(), BackendError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| BackendError::Io(format!("Failed to create config directory: {}", e)))?;
    }

    let contents = serde_json::to_string_pretty(creds)
        .map_err(|e| BackendError::Parse(format!("Failed to serialize credentials: {}", e)))?;

    std::fs::write(path, &contents)
        .map_err(|e| BackendError::Io(format!("Failed to write auth file: {}", e)))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, permissions)
            .map_err(|e| BackendError::Io(format!("Failed to set file permissions: {}", e)))?;
    }

    Ok(())
}

/// Delete saved auth credentials. Returns whether a file was removed.
pub fn delete_auth() -> Result<bool, BackendError> {
    let Some(path) = auth_file_path() else {
        return Ok(false);
    };
    if !path.exists() {
        return Ok(false);
    }
    std::fs::remove_file(&path)
        .map_err(|e| BackendError::Io(format!("Failed to delete auth file: {}", e)))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_credentials_roundtrip() {
        let creds = AuthCredentials {
            token: "ya29.test".into(),
            sheets_base: "https://sheets.test".into(),
            drive_base: "https://drive.test".into(),
            email: Some("bot@example.com".into()),
        };

        let json = serde_json::to_string_pretty(&creds).unwrap();
        let parsed: AuthCredentials = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, creds);
    }

    #[test]
    fn test_missing_bases_use_defaults() {
        let parsed: AuthCredentials = serde_json::from_str(r#"{"token":"tok"}"#).unwrap();
        assert_eq!(parsed.sheets_base, DEFAULT_SHEETS_BASE);
        assert_eq!(parsed.drive_base, DEFAULT_DRIVE_BASE);
        assert!(parsed.email.is_none());
    }

    #[test]
    fn test_with_base_trims_slash() {
        let creds = AuthCredentials::new("t".into()).with_base("http://127.0.0.1:9000/");
        assert_eq!(creds.sheets_base, "http://127.0.0.1:9000");
        assert_eq!(creds.drive_base, "http://127.0.0.1:9000");
    }

    #[test]
    fn test_auth_file_path_exists() {
        let path = auth_file_path().unwrap();
        assert!(path.to_string_lossy().contains("smartspread"));
        assert!(path.to_string_lossy().ends_with("auth.json"));
    }

    #[test]
    fn test_save_and_load_auth() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/auth.json");

        let creds = AuthCredentials::new("tok123".into()).with_base("https://api.test");
        save_auth_to(&path, &creds).unwrap();
        assert_eq!(load_auth_from(&path), Some(creds));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn test_empty_token_is_not_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.json");
        std::fs::write(&path, r#"{"token":""}"#).unwrap();
        assert_eq!(load_auth_from(&path), None);

        std::fs::write(&path, "not json").unwrap();
        assert_eq!(load_auth_from(&path), None);
    }
}
