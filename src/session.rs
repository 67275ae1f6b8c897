//! The signed-in user's session.
//!
//! A `Session` is created once (from the persisted session file or from a
//! raw token) and handed to [`crate::api::ApiClient`] by `Arc`. Nothing in
//! the crate reads tokens from ambient state.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::io::Write;
use std::path::Path;
use zeroize::Zeroizing;

use crate::errors::ApiError;
use crate::models::Role;
use crate::normalize::{Fields, Keys};

const USER_ID_CLAIMS: Keys = &[
    "nameid",
    "sub",
    "userId",
    "UserId",
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier",
];
const ROLE_CLAIMS: Keys = &[
    "role",
    "roleId",
    "RoleId",
    "http://schemas.microsoft.com/ws/2008/06/identity/claims/role",
];

/// On-disk shape of the session file.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedSession {
    token: String,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    role: Option<Role>,
}

/// Borrowed view written by [`Session::save`], so the token is never copied
/// into an unzeroized buffer.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionFile<'a> {
    token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<Role>,
}

pub struct Session {
    token: Zeroizing<String>,
    pub user_id: Option<String>,
    pub role: Option<Role>,
}

impl Session {
    /// Build a session from a bearer token, filling identity from the
    /// token's claims when it is a JWT.
    pub fn new(token: impl Into<String>) -> Self {
        let token = Zeroizing::new(token.into());
        let claims = decode_claims(&token);
        let (user_id, role) = match &claims {
            Some(c) => {
                let f = Fields::new(c);
                (
                    f.opt_string(USER_ID_CLAIMS),
                    f.opt_string(ROLE_CLAIMS).and_then(|r| r.parse().ok()),
                )
            }
            None => (None, None),
        };
        Self { token, user_id, role }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token.as_str())
    }

    /// Load the persisted session. Explicit fields in the file win over
    /// token claims.
    pub fn load(path: &Path) -> Result<Self, ApiError> {
        let raw = Zeroizing::new(std::fs::read_to_string(path).map_err(|e| {
            ApiError::Session(format!("cannot read session file {}: {}", path.display(), e))
        })?);
        let persisted: PersistedSession = serde_json::from_str(&raw).map_err(|e| {
            ApiError::Session(format!("invalid session file {}: {}", path.display(), e))
        })?;
        if persisted.token.trim().is_empty() {
            return Err(ApiError::Session("session file has an empty token".into()));
        }

        let mut session = Session::new(persisted.token);
        if persisted.user_id.is_some() {
            session.user_id = persisted.user_id;
        }
        if persisted.role.is_some() {
            session.role = persisted.role;
        }
        Ok(session)
    }

    /// Write the session file, readable by the owner only on unix.
    pub fn save(&self, path: &Path) -> Result<(), ApiError> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| {
                ApiError::Session(format!("cannot create {}: {}", dir.display(), e))
            })?;
        }
        let file = SessionFile {
            token: self.token.as_str(),
            user_id: self.user_id.as_deref(),
            role: self.role,
        };
        let json = Zeroizing::new(serde_json::to_string_pretty(&file)?);
        write_private(path, json.as_bytes()).map_err(|e| {
            ApiError::Session(format!("cannot write session file {}: {}", path.display(), e))
        })
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("user_id", &self.user_id)
            .field("role", &self.role)
            .finish()
    }
}

/// Decode the payload segment of a JWT without verifying it.
fn decode_claims(token: &str) -> Option<Value> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    serde_json::from_slice(&bytes).ok()
}

fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut opts = std::fs::OpenOptions::new();
    opts.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(0o600);
    }
    let mut file = opts.open(path)?;
    // an existing file keeps its old mode on open
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(contents)
}
