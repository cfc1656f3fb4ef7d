use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// UUID v4, assigned on insert
    pub id: String,
    pub username: String,
    pub email: String,
}
