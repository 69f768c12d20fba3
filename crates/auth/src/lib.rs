use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const ACCESS_TOKEN_VAR: &str = "BITBUCKET_TOKEN";
pub const CLIENT_ID_VAR: &str = "BITBUCKET_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "BITBUCKET_SECRET";
pub const APP_PASSWORD_VAR: &str = "APP_PASSWORD_BASE64";
pub const USERNAME_VAR: &str = "BITBUCKET_USERNAME";
pub const RAW_APP_PASSWORD_VAR: &str = "BITBUCKET_APP_PASSWORD";

/// Where the bearer token comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    AccessToken(String),
    /// OAuth consumer; the token is minted at startup.
    ClientCredentials {
        client_id: String,
        client_secret: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: TokenSource,
    /// Base64 `user:app-password` for the user-permission endpoints.
    pub app_password: String,
}

impl Credentials {
    /// Environment first, then the credentials file.
    pub fn load(credentials_file: Option<&Path>) -> Result<Self> {
        let path = credentials_file
            .map(Path::to_path_buf)
            .or_else(credentials_path);
        let stored = match path {
            Some(path) => read_secrets(&path)?,
            None => HashMap::new(),
        };

        Self::resolve(|key| {
            std::env::var(key)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .or_else(|| stored.get(key).cloned())
        })
    }

    pub fn resolve<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let token = match (
            value(ACCESS_TOKEN_VAR),
            value(CLIENT_ID_VAR),
            value(CLIENT_SECRET_VAR),
        ) {
            (Some(token), _, _) => TokenSource::AccessToken(token),
            (None, Some(client_id), Some(client_secret)) => TokenSource::ClientCredentials {
                client_id,
                client_secret,
            },
            _ => bail!(
                "No access token found. Set {ACCESS_TOKEN_VAR}, or {CLIENT_ID_VAR} and {CLIENT_SECRET_VAR}"
            ),
        };

        let app_password = match (
            value(APP_PASSWORD_VAR),
            value(USERNAME_VAR),
            value(RAW_APP_PASSWORD_VAR),
        ) {
            (Some(encoded), _, _) => encoded,
            (None, Some(username), Some(password)) => encode_basic(&username, &password),
            _ => bail!(
                "No app password found. Set {APP_PASSWORD_VAR}, or {USERNAME_VAR} and {RAW_APP_PASSWORD_VAR}"
            ),
        };

        Ok(Self {
            token,
            app_password,
        })
    }
}

/// Base64 of `username:password`, the form basic auth sends on the wire.
pub fn encode_basic(username: &str, password: &str) -> String {
    STANDARD.encode(format!("{username}:{password}"))
}

pub fn credentials_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".bitbucket-admin").join("credentials"))
}

/// Read the JSON credentials file. A missing file holds no secrets.
pub fn read_secrets(path: &Path) -> Result<HashMap<String, String>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Unable to read credentials file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Malformed credentials file {}", path.display()))
}
