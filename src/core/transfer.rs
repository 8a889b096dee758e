//! Transfer engine - moves coins between two parties in one atomic unit.
//!
//! A transfer is three effects: debit the source, credit the destination, append one
//! log row. They are issued inside a single database transaction, so either all three
//! commit or none do. Either side may be [`Party::System`] (mint or burn), never both.

use crate::{
    core::{
        Coins, account, bulk,
        identity::{AccountRef, Identity, Party},
        ledger,
        retry::with_conflict_retry,
    },
    entities::{UserRole, transaction},
    errors::{Error, Result},
};
use sea_orm::{DatabaseConnection, TransactionTrait};
use tracing::{debug, info, instrument};

/// A validated transfer request, passed to each attempt.
#[derive(Debug, Clone)]
pub(crate) struct TransferRequest<'a> {
    /// Party debited
    pub source: &'a Party,
    /// Party credited
    pub destination: &'a Party,
    /// Coins moved
    pub amount: Coins,
    /// Title written to the log
    pub label: &'a str,
    /// Activity that triggered the transfer
    pub activity_id: Option<i64>,
}

/// Moves `amount` coins from `source` to `destination` and logs it once.
///
/// # Arguments
/// * `source` - Party debited, or [`Party::System`] to mint
/// * `destination` - Party credited, or [`Party::System`] to burn
/// * `amount` - Coins to move, strictly positive
/// * `label` - Title copied into the log row
///
/// # Errors
/// - `InvalidAmount` when `amount` is not positive
/// - `InvalidParty` when both sides are the system or the same account
/// - `NotFound` when a named account does not exist
/// - `InsufficientBalance` when the source holds less than `amount`
/// - `Conflict` when the store kept conflicting after the bounded retries
///
/// None of these leave a balance change or log row behind.
pub async fn transfer(
    db: &DatabaseConnection,
    source: &Party,
    destination: &Party,
    amount: Coins,
    label: &str,
) -> Result<transaction::Model> {
    execute(
        db,
        &TransferRequest {
            source,
            destination,
            amount,
            label,
            activity_id: None,
        },
    )
    .await
}

/// Validates a request and runs it with conflict retry.
#[instrument(skip(db, request), fields(
    source = %request.source,
    destination = %request.destination,
    amount = request.amount,
))]
pub(crate) async fn execute(
    db: &DatabaseConnection,
    request: &TransferRequest<'_>,
) -> Result<transaction::Model> {
    validate(request)?;

    let record = with_conflict_retry("transfer", || attempt(db, request)).await?;
    info!(transaction_id = record.id, label = request.label, "Transfer committed");
    Ok(record)
}

fn validate(request: &TransferRequest<'_>) -> Result<()> {
    if request.amount <= 0 {
        return Err(Error::InvalidAmount {
            reason: format!("transfer amount must be positive, got {}", request.amount),
        });
    }

    match (request.source.account(), request.destination.account()) {
        (None, None) => Err(Error::InvalidParty {
            reason: "source and destination cannot both be the system".to_string(),
        }),
        (Some(source), Some(destination)) if source == destination => Err(Error::InvalidParty {
            reason: format!("{source} cannot transfer to itself"),
        }),
        _ => Ok(()),
    }
}

async fn attempt(
    db: &DatabaseConnection,
    request: &TransferRequest<'_>,
) -> Result<transaction::Model> {
    let txn = db.begin().await?;

    // Both accounts must exist before anything is written.
    for party in [request.source, request.destination] {
        if let Some(account) = party.account() {
            account::require_account(&txn, account).await?;
        }
    }

    if let Some(source) = request.source.account() {
        let remaining = account::adjust_balance(&txn, source, -request.amount).await?;
        debug!(%source, remaining, "Debited source");
    }
    if let Some(destination) = request.destination.account() {
        let balance = account::adjust_balance(&txn, destination, request.amount).await?;
        debug!(%destination, balance, "Credited destination");
    }

    let record = ledger::append(
        &txn,
        request.source,
        request.destination,
        request.amount,
        request.label,
        request.activity_id,
    )
    .await?;

    txn.commit().await?;
    Ok(record)
}

/// Administrative single-account adjustment: positive `delta` mints, negative burns.
///
/// # Arguments
/// * `actor` - Caller; must be an admin
/// * `target` - Non-admin account to adjust
/// * `delta` - Signed change, never zero
/// * `label` - Note written to the log
///
/// # Errors
/// - `Forbidden` unless `actor` is an admin, or when `target` is an admin account
/// - `InvalidAmount` when `delta` is zero
/// - everything [`transfer`] can return
#[instrument(skip(db, actor), fields(actor = %actor.account))]
pub async fn admin_adjust(
    db: &DatabaseConnection,
    actor: &Identity,
    target: &AccountRef,
    delta: Coins,
    label: &str,
) -> Result<transaction::Model> {
    require_admin(actor)?;
    if delta == 0 {
        return Err(Error::InvalidAmount {
            reason: "adjustment cannot be zero".to_string(),
        });
    }
    if is_admin_account(db, target).await? {
        return Err(Error::Forbidden {
            reason: format!("{target} is an administrative account"),
        });
    }

    let amount = delta.checked_abs().ok_or_else(|| Error::InvalidAmount {
        reason: format!("adjustment {delta} is out of range"),
    })?;
    let target = Party::Account(target.clone());
    if delta > 0 {
        transfer(db, &Party::System, &target, amount, label).await
    } else {
        transfer(db, &target, &Party::System, amount, label).await
    }
}

/// Administrative single-account SET.
///
/// # Errors
/// `InvalidAmount` for a negative target, `Forbidden` for non-admin callers or admin
/// targets, `NotFound` when the account does not exist.
pub async fn admin_set_balance(
    db: &DatabaseConnection,
    actor: &Identity,
    target: &AccountRef,
    amount: Coins,
) -> Result<bulk::BalanceChange> {
    let outcome = bulk::bulk_adjust(
        db,
        actor,
        std::slice::from_ref(target),
        bulk::BulkMode::Set(amount),
    )
    .await?;

    if !outcome.excluded.is_empty() {
        return Err(Error::Forbidden {
            reason: format!("{target} is an administrative account"),
        });
    }
    outcome
        .updated
        .into_iter()
        .next()
        .ok_or_else(|| account::account_not_found(target))
}

pub(crate) fn require_admin(actor: &Identity) -> Result<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(Error::Forbidden {
            reason: format!("{} is not an administrator", actor.account),
        })
    }
}

pub(crate) async fn is_admin_account<C>(db: &C, account: &AccountRef) -> Result<bool>
where
    C: sea_orm::ConnectionTrait,
{
    Ok(match account {
        AccountRef::User(id) => account::get_user(db, *id)
            .await?
            .is_some_and(|user| user.role == UserRole::Admin),
        AccountRef::Booth(_) => false,
    })
}
