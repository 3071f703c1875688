//! Key-to-identifier casing.

use heck::{ToLowerCamelCase, ToSnakeCase};

/// How column keys map to database column names when no explicit name is
/// given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Deserialize)]
pub enum Casing {
    /// Use the key as-is
    #[default]
    #[serde(rename = "preserve")]
    Preserve,
    /// `authorId` -> `author_id`
    #[serde(rename = "snake_case")]
    SnakeCase,
    /// `author_id` -> `authorId`
    #[serde(rename = "camelCase")]
    CamelCase,
}

impl Casing {
    pub fn apply(&self, key: &str) -> String {
        match self {
            Casing::Preserve => key.to_owned(),
            Casing::SnakeCase => key.to_snake_case(),
            Casing::CamelCase => key.to_lower_camel_case(),
        }
    }
}
