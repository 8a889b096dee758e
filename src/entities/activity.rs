//! Activity entity - Priced actions a booth offers.
//!
//! A PAY activity moves coins from the user to the booth, a REWARD activity moves
//! them the other way. Activities are soft-deleted so log rows that reference them
//! stay valid.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Which way coins flow when the activity is executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum ActivityDirection {
    /// User pays the booth
    #[sea_orm(string_value = "pay")]
    Pay,
    /// Booth pays the user
    #[sea_orm(string_value = "reward")]
    Reward,
}

/// Activity database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "activities")]
pub struct Model {
    /// Unique identifier for the activity
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Booth that owns this activity
    pub booth_id: String,
    /// Name shown in the booth's catalog
    pub title: String,
    /// Price in coins, zero or more
    pub price: i64,
    /// Whether running the activity charges or rewards the user
    pub direction: ActivityDirection,
    /// Whether the booth currently offers the activity
    pub is_active: bool,
    /// Soft delete flag - if true, activity is hidden but data is preserved
    pub is_deleted: bool,
    /// When the activity was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Activity and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each activity belongs to one booth
    #[sea_orm(
        belongs_to = "super::booth::Entity",
        from = "Column::BoothId",
        to = "super::booth::Column::Id"
    )]
    Booth,
}

impl Related<super::booth::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Booth.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
