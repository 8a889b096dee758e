//! Transaction log - append-only record of every balance change.
//!
//! Rows are written only inside the same database transaction as the balance writes
//! they describe. The amount is always positive; the populated party columns carry
//! the direction. Nothing in the crate updates or deletes a row once written.

use crate::{
    core::{
        Coins,
        identity::{AccountRef, Party},
    },
    entities::{Transaction, transaction},
    errors::{Error, Result},
};
use sea_orm::{Condition, QueryOrder, QuerySelect, Set, prelude::*};

/// Appends one row to the log.
///
/// Callers are the transfer and bulk engines, which have already validated the parties
/// and the amount and hold an open database transaction.
pub(crate) async fn append<C>(
    db: &C,
    source: &Party,
    destination: &Party,
    amount: Coins,
    title: &str,
    activity_id: Option<i64>,
) -> Result<transaction::Model>
where
    C: ConnectionTrait,
{
    if amount <= 0 {
        return Err(Error::InvalidAmount {
            reason: format!("logged amounts must be positive, got {amount}"),
        });
    }
    if source.account().is_none() && destination.account().is_none() {
        return Err(Error::InvalidParty {
            reason: "a log entry needs at least one account".to_string(),
        });
    }

    let (from_user_id, from_booth_id) = party_columns(source);
    let (to_user_id, to_booth_id) = party_columns(destination);

    let row = transaction::ActiveModel {
        amount: Set(amount),
        title: Set(title.to_string()),
        activity_id: Set(activity_id),
        from_user_id: Set(from_user_id),
        from_booth_id: Set(from_booth_id),
        to_user_id: Set(to_user_id),
        to_booth_id: Set(to_booth_id),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    row.insert(db).await.map_err(Into::into)
}

fn party_columns(party: &Party) -> (Option<i64>, Option<String>) {
    match party.account() {
        Some(AccountRef::User(id)) => (Some(*id), None),
        Some(AccountRef::Booth(id)) => (None, Some(id.clone())),
        None => (None, None),
    }
}

/// Retrieves a log row by id.
///
/// # Errors
/// `NotFound` when no row has that id.
pub async fn get_transaction(
    db: &DatabaseConnection,
    transaction_id: i64,
) -> Result<transaction::Model> {
    Transaction::find_by_id(transaction_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Transaction", transaction_id))
}

/// Every row where the account paid or was paid, newest first.
pub async fn list_transactions_for_account(
    db: &DatabaseConnection,
    account: &AccountRef,
    limit: Option<u64>,
) -> Result<Vec<transaction::Model>> {
    let involvement = match account {
        AccountRef::User(id) => Condition::any()
            .add(transaction::Column::FromUserId.eq(*id))
            .add(transaction::Column::ToUserId.eq(*id)),
        AccountRef::Booth(id) => Condition::any()
            .add(transaction::Column::FromBoothId.eq(id.as_str()))
            .add(transaction::Column::ToBoothId.eq(id.as_str())),
    };

    Transaction::find()
        .filter(involvement)
        .order_by_desc(transaction::Column::CreatedAt)
        .order_by_desc(transaction::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Latest rows across the whole festival, newest first.
pub async fn list_recent_transactions(
    db: &DatabaseConnection,
    limit: u64,
) -> Result<Vec<transaction::Model>> {
    Transaction::find()
        .order_by_desc(transaction::Column::CreatedAt)
        .order_by_desc(transaction::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}
