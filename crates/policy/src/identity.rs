//! Actors: who is asking, and from where.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Role of an authenticated user.
///
/// Roles are not ranked. Each action decides for itself which roles it
/// admits, see [`crate::authorize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Manager,
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Manager => "MANAGER",
            Role::Member => "MEMBER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "MANAGER" => Ok(Role::Manager),
            "MEMBER" => Ok(Role::Member),
            _ => Err(Error::Parse(format!("unknown role '{s}'"))),
        }
    }
}

/// Geographic scope.
///
/// `All` is only meaningful as the scope of an actor. Restaurants always
/// belong to a concrete region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Region {
    India,
    America,
    All,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::India => "INDIA",
            Region::America => "AMERICA",
            Region::All => "ALL",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "INDIA" => Ok(Region::India),
            "AMERICA" => Ok(Region::America),
            "ALL" => Ok(Region::All),
            _ => Err(Error::Parse(format!("unknown region '{s}'"))),
        }
    }
}

/// Identifier of a user account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The actor behind a request.
///
/// Fixed for the lifetime of a login. There are no setters: a different
/// role or region means logging in again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    id: UserId,
    role: Role,
    region: Region,
}

impl Identity {
    pub fn new(id: UserId, role: Role, region: Region) -> Self {
        Self { id, role, region }
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_is_case_insensitive() {
        assert_eq!("manager".parse::<Role>().unwrap(), Role::Manager);
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn test_unknown_region_fails_to_parse() {
        assert_eq!("india".parse::<Region>().unwrap(), Region::India);
        assert!(matches!("europe".parse::<Region>(), Err(Error::Parse(_))));
    }

    #[test]
    fn test_identity_serializes_upper_case() {
        let identity = Identity::new(UserId::new("u2"), Role::Manager, Region::India);
        let json = serde_json::to_value(&identity).unwrap();
        assert_eq!(json["role"], "MANAGER");
        assert_eq!(json["region"], "INDIA");
        assert_eq!(json["id"], "u2");
    }
}
