//! Client roles

use std::fmt;

use serde::{Deserialize, Serialize};

/// Role a connection declares after accept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Originates input events (the phone)
    Controller,
    /// Consumes input and originates state updates (the game)
    Display,
    /// Connected but not yet registered; receives no broadcasts
    #[default]
    Unspecified,
}

impl Role {
    /// Parse the `clientType` names used by browser clients.
    ///
    /// Accepts both the legacy names (`mobile`, `game`) and the role names.
    pub fn from_client_type(client_type: &str) -> Option<Self> {
        match client_type.trim().to_ascii_lowercase().as_str() {
            "mobile" | "controller" => Some(Role::Controller),
            "game" | "display" => Some(Role::Display),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Controller => "controller",
            Role::Display => "display",
            Role::Unspecified => "unspecified",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_client_type() {
        assert_eq!(Role::from_client_type("mobile"), Some(Role::Controller));
        assert_eq!(Role::from_client_type("Game"), Some(Role::Display));
        assert_eq!(Role::from_client_type("display"), Some(Role::Display));
        assert_eq!(Role::from_client_type("tv"), None);
    }
}
