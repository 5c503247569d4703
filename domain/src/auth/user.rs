//! User profile entity

use serde::{Deserialize, Serialize};

/// Profile of the signed-in user, fetched once per session load
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub name: String,
    #[serde(alias = "email")]
    pub username: String,
}

impl User {
    pub fn new(name: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            username: username.into(),
        }
    }

    /// Name to address the user by; `friend` when the profile has none
    pub fn display_name(&self) -> &str {
        let name = self.name.trim();
        if name.is_empty() { "friend" } else { name }
    }

    /// Avatar letter: first letter of the name, upper-cased, or `U`
    pub fn initial(&self) -> char {
        self.name
            .trim()
            .chars()
            .next()
            .and_then(|c| c.to_uppercase().next())
            .unwrap_or('U')
    }
}
