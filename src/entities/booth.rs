//! Booth entity - Class stalls that sell and reward through activities.
//!
//! A booth id encodes its class as `<grade>-<classroom>` (e.g. `"2-3"`).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Booth database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "booths")]
pub struct Model {
    /// Booth id in `<grade>-<classroom>` form
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Human-readable booth name (e.g. "Haunted House")
    pub name: String,
    /// Current balance in coins, never negative
    pub balance: i64,
    /// Argon2id PHC string; the only value consulted when a booth logs in
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Plaintext copy shown to operators on the admin screen. Display only,
    /// never used for authentication. `None` unless the festival opted in.
    pub display_password: Option<String>,
    /// When the booth was registered
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Booth and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One booth offers many activities
    #[sea_orm(has_many = "super::activity::Entity")]
    Activities,
}

impl Related<super::activity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Activities.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
