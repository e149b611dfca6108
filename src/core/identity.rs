//! Stubbed identity lookup.
//!
//! There is no verification: each role maps to one fixed user record.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Host,
    Renter,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Host => f.write_str("host"),
            Role::Renter => f.write_str("renter"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "host" => Ok(Role::Host),
            "renter" => Ok(Role::Renter),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub world_verified: bool,
}

/// The fixed user for `role`
pub fn current_user(role: Role) -> User {
    let (id, name) = match role {
        Role::Host => ("host-123", "Host Taro"),
        Role::Renter => ("renter-456", "Renter Hanako"),
    };

    User {
        id: id.to_string(),
        name: name.to_string(),
        role,
        world_verified: true,
    }
}
