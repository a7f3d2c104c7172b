//! Row and request types for the schools table

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// School record from database
///
/// `name` and `address` are nullable columns, so both come back as `Option`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct School {
    pub id: i32,
    pub name: Option<String>,
    pub address: Option<String>,
}

/// Create/update request body
///
/// Missing fields bind as SQL `NULL`; the store is the only validator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SchoolInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl SchoolInput {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            address: Some(address.into()),
        }
    }

    /// Pick the fields out of a decoded request body.
    ///
    /// Strings pass through, other non-null values are kept as their JSON
    /// text (the column coerces them), and anything missing is `NULL`.
    /// A body that is not an object carries no fields.
    pub fn from_json(body: &Value) -> Self {
        let field = |key: &str| match body.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(text.clone()),
            Some(other) => Some(other.to_string()),
        };

        Self {
            name: field("name"),
            address: field("address"),
        }
    }
}
