use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use super::errors::AuthzError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, ToSchema)]
pub enum Role {
    Usuario,
    Administrativo,
    #[serde(rename = "CEO")]
    Ceo,
    Desarrollador,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Usuario, Role::Administrativo, Role::Ceo, Role::Desarrollador];

    /// Always granted the full catalog; the only writer of scope overrides.
    pub const SUPER: Role = Role::Desarrollador;

    /// The one role whose default bundle may be replaced at runtime.
    pub const OVERRIDABLE: Role = Role::Administrativo;

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Usuario => "Usuario",
            Role::Administrativo => "Administrativo",
            Role::Ceo => "CEO",
            Role::Desarrollador => "Desarrollador",
        }
    }

    pub fn is_super(self) -> bool {
        self == Role::SUPER
    }

    pub fn is_overridable(self) -> bool {
        self == Role::OVERRIDABLE
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthzError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| AuthzError::UnknownRole(value.to_string()))
    }
}

/// Wire input accepts the same spellings as path segments and the CLI.
impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_string_roundtrip() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().ok(), Some(role));
            let json = serde_json::to_value(role).unwrap();
            assert_eq!(json.as_str(), Some(role.as_str()));
        }
    }

    #[test]
    fn role_parsing_ignores_case() {
        assert_eq!("ceo".parse::<Role>().ok(), Some(Role::Ceo));
        assert_eq!("DESARROLLADOR".parse::<Role>().ok(), Some(Role::Desarrollador));
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn exactly_one_super_role() {
        let supers: Vec<Role> = Role::ALL.into_iter().filter(|r| r.is_super()).collect();
        assert_eq!(supers, vec![Role::Desarrollador]);
        assert!(!Role::SUPER.is_overridable());
    }

    #[test]
    fn json_role_matches_path_parsing() {
        let ceo: Role = serde_json::from_str(r#""ceo""#).unwrap();
        assert_eq!(ceo, Role::Ceo);
        let dev: Role = serde_json::from_str(r#""Desarrollador""#).unwrap();
        assert_eq!(dev, Role::Desarrollador);
        assert!(serde_json::from_str::<Role>(r#""Intern""#).is_err());
    }
}
