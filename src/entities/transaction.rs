//! Transaction entity - Append-only log of every balance change.
//!
//! `amount` is always positive. Direction is implied by which party columns are set:
//! at most one `from_*` column and at most one `to_*` column, never all four empty.
//! An empty side is the system (mint or burn).
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::identity::{AccountRef, Party};

/// Transaction database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Unique identifier for the transaction
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Coins moved, always greater than zero
    pub amount: i64,
    /// Label copied at creation time (activity title or admin note)
    pub title: String,
    /// Activity that produced this row, if any
    pub activity_id: Option<i64>,
    /// Paying user; all `from_*` columns empty means minted
    pub from_user_id: Option<i64>,
    /// Paying booth
    pub from_booth_id: Option<String>,
    /// Receiving user; all `to_*` columns empty means burned
    pub to_user_id: Option<i64>,
    /// Receiving booth
    pub to_booth_id: Option<String>,
    /// When the row was appended
    pub created_at: DateTimeUtc,
}

impl Model {
    /// Party the coins came from.
    #[must_use]
    pub fn source(&self) -> Party {
        party_from_columns(self.from_user_id, self.from_booth_id.as_deref())
    }

    /// Party the coins went to.
    #[must_use]
    pub fn destination(&self) -> Party {
        party_from_columns(self.to_user_id, self.to_booth_id.as_deref())
    }
}

fn party_from_columns(user_id: Option<i64>, booth_id: Option<&str>) -> Party {
    match (user_id, booth_id) {
        (Some(id), _) => Party::Account(AccountRef::User(id)),
        (None, Some(id)) => Party::Account(AccountRef::Booth(id.to_string())),
        (None, None) => Party::System,
    }
}

/// Defines relationships between Transaction and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Paying user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::FromUserId",
        to = "super::user::Column::Id",
        fk_name = "fk-transactions-from_user"
    )]
    FromUser,
    /// Receiving user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ToUserId",
        to = "super::user::Column::Id",
        fk_name = "fk-transactions-to_user"
    )]
    ToUser,
    /// Paying booth
    #[sea_orm(
        belongs_to = "super::booth::Entity",
        from = "Column::FromBoothId",
        to = "super::booth::Column::Id",
        fk_name = "fk-transactions-from_booth"
    )]
    FromBooth,
    /// Receiving booth
    #[sea_orm(
        belongs_to = "super::booth::Entity",
        from = "Column::ToBoothId",
        to = "super::booth::Column::Id",
        fk_name = "fk-transactions-to_booth"
    )]
    ToBooth,
    /// Activity the row was produced by
    #[sea_orm(
        belongs_to = "super::activity::Entity",
        from = "Column::ActivityId",
        to = "super::activity::Column::Id",
        fk_name = "fk-transactions-activity"
    )]
    Activity,
}

impl ActiveModelBehavior for ActiveModel {}
