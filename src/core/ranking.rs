//! Booth ranking - read-only projection of booth balances.

use crate::{core::{Coins, account}, entities::booth, errors::Result};
use sea_orm::DatabaseConnection;
use serde::Serialize;

/// One row of the booth leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoothStanding {
    /// 1-based place; booths with equal balances share a place
    pub position: usize,
    /// Booth id, `<grade>-<classroom>`
    pub booth_id: String,
    /// Booth display name
    pub name: String,
    /// Balance at the time of ranking
    pub balance: Coins,
}

/// Ranks all booths by balance, highest first.
///
/// Ties keep booth id order. Recomputed on every call.
pub async fn rank_booths(db: &DatabaseConnection) -> Result<Vec<BoothStanding>> {
    let booths = account::list_booths(db).await?;
    Ok(standings(booths))
}

/// Sorts booths (already in id order) into standings with competition ranking.
#[must_use]
pub fn standings(mut booths: Vec<booth::Model>) -> Vec<BoothStanding> {
    // `sort_by` is stable, so equal balances stay in input order.
    booths.sort_by(|a, b| b.balance.cmp(&a.balance));

    let mut result: Vec<BoothStanding> = Vec::with_capacity(booths.len());
    for (index, booth) in booths.into_iter().enumerate() {
        let position = match result.last() {
            Some(previous) if previous.balance == booth.balance => previous.position,
            _ => index + 1,
        };
        result.push(BoothStanding {
            position,
            booth_id: booth.id,
            name: booth.name,
            balance: booth.balance,
        });
    }
    result
}
