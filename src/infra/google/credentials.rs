use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// OAuth client registration downloaded from the Google Cloud console.
///
/// The file wraps the fields in an `installed` (desktop app) or `web` key:
/// ```json
/// { "installed": { "client_id": "...", "client_secret": "...", ... } }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

fn default_auth_uri() -> String {
    "https://accounts.google.com/o/oauth2/auth".to_string()
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

#[derive(Deserialize)]
struct CredentialsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading client secrets '{}'", path.display()))?;
        Self::from_json(&content).with_context(|| format!("parsing '{}'", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let file: CredentialsFile = serde_json::from_str(content)?;
        file.installed
            .or(file.web)
            .ok_or_else(|| anyhow!("expected an 'installed' or 'web' client entry"))
    }

    /// First registered redirect URI, falling back to the loopback address
    /// used by desktop clients.
    pub fn redirect_uri(&self) -> &str {
        self.redirect_uris
            .first()
            .map(String::as_str)
            .unwrap_or("http://localhost")
    }
}

/// Saved refresh credentials, stored as `token.json` after the first
/// authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizedUser {
    #[serde(rename = "type")]
    pub kind: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl AuthorizedUser {
    pub fn new(secrets: &ClientSecrets, refresh_token: String) -> Self {
        Self {
            kind: "authorized_user".to_string(),
            client_id: secrets.client_id.clone(),
            client_secret: secrets.client_secret.clone(),
            refresh_token,
        }
    }

    /// Reads `path`, returning `None` when the file is missing or unreadable
    /// so callers fall back to a fresh authorization.
    pub fn load_if_exists(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str(&content) {
            Ok(user) => Some(user),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Ignoring unreadable token file");
                None
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("writing token file '{}'", path.display()))?;
        Ok(())
    }
}
