//! Operator session: the bearer token and who it belongs to.
//!
//! The token lives in a small JSON file under the `jwtToken` key. A token given on the
//! command line (or via `RECRUIT_ADMIN_TOKEN`) wins over the file. Nothing is read
//! implicitly; call [`Session::refresh`] once at startup.

use crate::error::SessionError;
use crate::model::LoginResponse;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Literal some clients store when the token was never set.
pub const ABSENT_MARKER: &str = "undefined";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredentials {
    #[serde(rename = "jwtToken", default)]
    pub token: Option<String>,
    #[serde(rename = "refreshToken", default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl From<&LoginResponse> for StoredCredentials {
    fn from(resp: &LoginResponse) -> Self {
        Self {
            token: resp.token.clone(),
            refresh_token: resp.refresh_token.clone(),
            id: resp.id.clone(),
            name: resp.username.clone(),
            email: resp.email.clone(),
        }
    }
}

/// Returns the token only when it is non-empty and not the absent marker.
pub fn usable_token(raw: Option<&str>) -> Option<&str> {
    raw.filter(|t| !t.trim().is_empty() && *t != ABSENT_MARKER)
}

#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/recruit-admin/credentials.json`
    pub fn default_path() -> Result<PathBuf, SessionError> {
        dirs::config_dir()
            .map(|d| d.join("recruit-admin").join("credentials.json"))
            .ok_or(SessionError::NoConfigDir)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<StoredCredentials>, SessionError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SessionError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| SessionError::Corrupt {
                path: self.path.clone(),
                source,
            })
    }

    pub fn save(&self, creds: &StoredCredentials) -> Result<(), SessionError> {
        let write_err = |source| SessionError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let body = serde_json::to_string_pretty(creds).map_err(|e| SessionError::Write {
            path: self.path.clone(),
            source: std::io::Error::other(e),
        })?;
        std::fs::write(&self.path, body).map_err(write_err)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .map_err(write_err)?;
        }
        Ok(())
    }

    /// Remove the file. Returns whether anything was there.
    pub fn clear(&self) -> Result<bool, SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(SessionError::Write {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// Explicit authentication state handed to whoever needs to call the API.
#[derive(Debug, Clone, Default)]
pub struct Session {
    store: Option<CredentialStore>,
    token_override: Option<String>,
    credentials: Option<StoredCredentials>,
}

impl Session {
    pub fn new(store: CredentialStore) -> Self {
        Self {
            store: Some(store),
            ..Default::default()
        }
    }

    /// A session backed only by a fixed token; nothing is persisted.
    pub fn from_token(token: impl Into<String>) -> Self {
        Self {
            token_override: Some(token.into()),
            ..Default::default()
        }
    }

    pub fn with_token_override(mut self, token: Option<String>) -> Self {
        self.token_override = token;
        self
    }

    /// Re-read the credential store. Returns whether the session is authenticated.
    pub fn refresh(&mut self) -> Result<bool, SessionError> {
        self.credentials = match &self.store {
            Some(store) => store.load()?,
            None => None,
        };
        let authenticated = self.is_authenticated();
        debug!(authenticated, "session refreshed");
        Ok(authenticated)
    }

    pub fn token(&self) -> Option<&str> {
        usable_token(self.token_override.as_deref()).or_else(|| {
            usable_token(
                self.credentials
                    .as_ref()
                    .and_then(|c| c.token.as_deref()),
            )
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Name or email of the logged-in operator, when known.
    pub fn operator(&self) -> Option<&str> {
        let creds = self.credentials.as_ref()?;
        creds.name.as_deref().or(creds.email.as_deref())
    }

    /// Persist a successful login and adopt its token.
    pub fn record_login(&mut self, resp: &LoginResponse) -> Result<(), SessionError> {
        let creds = StoredCredentials::from(resp);
        if let Some(store) = &self.store {
            store.save(&creds)?;
        }
        self.credentials = Some(creds);
        Ok(())
    }

    /// Forget stored credentials. Returns whether a credential file was removed.
    pub fn logout(&mut self) -> Result<bool, SessionError> {
        self.credentials = None;
        match &self.store {
            Some(store) => store.clear(),
            None => Ok(false),
        }
    }
}
