use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::normalize::{Fields, Keys, Normalize};

mod keys {
    use super::Keys;

    pub const ID: Keys = &["id", "Id", "userId", "UserId"];
    pub const FULL_NAME: Keys = &["fullName", "FullName", "name", "Name", "userName", "UserName"];
    pub const EMAIL: Keys = &["email", "Email"];
    pub const ROLE_ID: Keys = &["roleId", "RoleId"];
    pub const ROLE_NAME: Keys = &["role", "Role", "roleName", "RoleName"];
    pub const IS_ACTIVE: Keys = &["isActive", "IsActive", "active", "Active"];
    pub const AVATAR: Keys = &["avatarUrl", "AvatarUrl", "avatar", "Avatar"];
}

/// Platform roles.
///
/// The backend numbers roles so that a lower id means more privilege
/// (1 = admin). That numbering is treated as an identifier only; ordering
/// decisions go through [`Role::privilege`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Host,
    Customer,
    Unknown(i64),
}

impl Role {
    pub fn from_id(id: i64) -> Self {
        match id {
            1 => Role::Admin,
            2 => Role::Host,
            3 => Role::Customer,
            other => Role::Unknown(other),
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            Role::Admin => 1,
            Role::Host => 2,
            Role::Customer => 3,
            Role::Unknown(id) => *id,
        }
    }

    /// Privilege rank; higher means more privileged. Unknown roles have no
    /// rank.
    pub fn privilege(&self) -> Option<u8> {
        match self {
            Role::Admin => Some(3),
            Role::Host => Some(2),
            Role::Customer => Some(1),
            Role::Unknown(_) => None,
        }
    }

    /// True when moving from `self` to `to` gains privilege. A move to or
    /// from an unknown role is never an upgrade.
    pub fn is_upgrade_to(&self, to: Role) -> bool {
        match (self.privilege(), to.privilege()) {
            (Some(from), Some(to)) => to > from,
            _ => false,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => f.write_str("admin"),
            Role::Host => f.write_str("host"),
            Role::Customer => f.write_str("customer"),
            Role::Unknown(id) => write!(f, "role#{}", id),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(id) = s.parse::<i64>() {
            return Ok(Role::from_id(id));
        }
        match s.to_ascii_lowercase().as_str() {
            "admin" | "administrator" => Ok(Role::Admin),
            "host" | "tourhost" | "guide" => Ok(Role::Host),
            "customer" | "user" | "tourist" => Ok(Role::Customer),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub avatar_url: Option<String>,
}

impl Normalize for UserProfile {
    fn normalize(value: &Value) -> Self {
        let f = Fields::new(value);
        let role = match f.opt_i64(keys::ROLE_ID) {
            Some(id) => Role::from_id(id),
            None => f
                .opt_string(keys::ROLE_NAME)
                .and_then(|r| r.parse().ok())
                .unwrap_or(Role::Unknown(0)),
        };
        Self {
            id: f.string(keys::ID),
            full_name: f.string(keys::FULL_NAME),
            email: f.string(keys::EMAIL),
            role,
            // an account is active unless the backend says otherwise
            is_active: f.first(keys::IS_ACTIVE).is_none() || f.bool(keys::IS_ACTIVE),
            avatar_url: f.opt_string(keys::AVATAR).filter(|s| !s.is_empty()),
        }
    }
}
