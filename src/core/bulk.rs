//! Bulk adjustment engine - applies one SET / ADD / CLEAR across many accounts.
//!
//! There is no paired counterparty: every change is a mint or burn against
//! [`Party::System`] and is logged as such with a positive amount. The whole batch runs
//! in one database transaction; each account is written with a compare-and-set so a
//! concurrent transfer on the same account forces a retry instead of a lost update.
//! No balance may end below zero: an ADD that would overdraw any account rejects the
//! whole batch.

use std::collections::HashSet;
use std::fmt;

use crate::{
    core::{
        Coins, account,
        identity::{AccountRef, Identity, Party},
        ledger,
        retry::with_conflict_retry,
        transfer::{is_admin_account, require_admin},
    },
    errors::{Error, Result},
};
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// What a bulk adjustment does to each targeted balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BulkMode {
    /// Replace the balance with this value (must be zero or more)
    Set(Coins),
    /// Add this value; negative values debit
    Add(Coins),
    /// Drive the balance to zero
    Clear,
}

impl BulkMode {
    /// Builds a mode from the loose form a form or CLI submits.
    ///
    /// # Errors
    /// `InvalidAmount` when SET or ADD has no amount or SET is negative,
    /// `Validation` for an unknown mode name.
    pub fn parse(mode: &str, amount: Option<Coins>) -> Result<Self> {
        let missing = |name: &str| Error::InvalidAmount {
            reason: format!("{name} requires an amount"),
        };

        let parsed = match mode.trim().to_ascii_lowercase().as_str() {
            "set" => Self::Set(amount.ok_or_else(|| missing("SET"))?),
            "add" => Self::Add(amount.ok_or_else(|| missing("ADD"))?),
            "clear" => Self::Clear,
            other => {
                return Err(Error::Validation {
                    message: format!("unknown bulk mode '{other}'"),
                });
            }
        };
        parsed.validate()?;
        Ok(parsed)
    }

    fn validate(self) -> Result<()> {
        match self {
            Self::Set(amount) if amount < 0 => Err(Error::InvalidAmount {
                reason: format!("cannot SET a balance to {amount}"),
            }),
            _ => Ok(()),
        }
    }

    /// Balance an account ends up with, or `None` on arithmetic overflow.
    const fn apply(self, previous: Coins) -> Option<Coins> {
        match self {
            Self::Set(amount) => Some(amount),
            Self::Add(amount) => previous.checked_add(amount),
            Self::Clear => Some(0),
        }
    }

    /// Title written to the log for changes made by this mode.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Set(_) => "Bulk set",
            Self::Add(_) => "Bulk add",
            Self::Clear => "Bulk clear",
        }
    }
}

impl fmt::Display for BulkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Set(amount) => write!(f, "SET {amount}"),
            Self::Add(amount) => write!(f, "ADD {amount}"),
            Self::Clear => f.write_str("CLEAR"),
        }
    }
}

/// Balance of one account before and after a bulk adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceChange {
    /// Account that was written
    pub account: AccountRef,
    /// Balance read inside the transaction
    pub previous: Coins,
    /// Balance committed
    pub current: Coins,
}

/// Result of a committed bulk adjustment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkOutcome {
    /// Accounts that were written, in request order
    pub updated: Vec<BalanceChange>,
    /// Requested accounts that do not exist
    pub omitted: Vec<AccountRef>,
    /// Administrative accounts filtered out of the target set
    pub excluded: Vec<AccountRef>,
}

/// Applies `mode` to every account in `targets`.
///
/// Duplicate targets are collapsed, administrative accounts are silently excluded and
/// unknown accounts are skipped; both are reported in the outcome.
///
/// # Arguments
/// * `actor` - Caller; must be an admin
/// * `targets` - Users and booths to adjust, in the order they are reported
/// * `mode` - SET, ADD or CLEAR, usually from [`BulkMode::parse`]
///
/// # Errors
/// - `Forbidden` unless `actor` is an admin
/// - `InvalidAmount` for a negative SET, before any account is read
/// - `InsufficientBalance` when an ADD would overdraw any account (nothing is written)
/// - `Conflict` when the store kept conflicting after the bounded retries
#[instrument(skip(db, actor, targets), fields(actor = %actor.account, %mode, targets = targets.len()))]
pub async fn bulk_adjust(
    db: &DatabaseConnection,
    actor: &Identity,
    targets: &[AccountRef],
    mode: BulkMode,
) -> Result<BulkOutcome> {
    require_admin(actor)?;
    mode.validate()?;

    let mut seen = HashSet::new();
    let targets: Vec<&AccountRef> = targets.iter().filter(|t| seen.insert(*t)).collect();

    let outcome = with_conflict_retry("bulk_adjust", || attempt(db, &targets, mode)).await?;
    info!(
        updated = outcome.updated.len(),
        omitted = outcome.omitted.len(),
        excluded = outcome.excluded.len(),
        "Bulk adjustment committed"
    );
    Ok(outcome)
}

async fn attempt(
    db: &DatabaseConnection,
    targets: &[&AccountRef],
    mode: BulkMode,
) -> Result<BulkOutcome> {
    let txn = db.begin().await?;
    let mut outcome = BulkOutcome::default();

    for &target in targets {
        if is_admin_account(&txn, target).await? {
            debug!(%target, "Excluding administrative account");
            outcome.excluded.push(target.clone());
            continue;
        }
        let Some(previous) = account::find_balance(&txn, target).await? else {
            debug!(%target, "Skipping unknown account");
            outcome.omitted.push(target.clone());
            continue;
        };

        let overflow = || Error::InvalidAmount {
            reason: format!("{mode} overflows the balance of {target}"),
        };
        let current = mode.apply(previous).ok_or_else(overflow)?;
        if current < 0 {
            return Err(Error::InsufficientBalance {
                account: target.to_string(),
                current: previous,
                required: previous.checked_sub(current).ok_or_else(overflow)?,
            });
        }

        if current != previous {
            let delta = current
                .checked_sub(previous)
                .and_then(Coins::checked_abs)
                .ok_or_else(overflow)?;
            account::compare_and_set_balance(&txn, target, previous, current).await?;
            let party = Party::Account(target.clone());
            let (source, destination) = if current > previous {
                (Party::System, party)
            } else {
                (party, Party::System)
            };
            ledger::append(
                &txn,
                &source,
                &destination,
                delta,
                mode.label(),
                None,
            )
            .await?;
        }

        outcome.updated.push(BalanceChange {
            account: target.clone(),
            previous,
            current,
        });
    }

    txn.commit().await?;
    Ok(outcome)
}
