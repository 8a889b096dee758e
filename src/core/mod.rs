//! Core business logic - framework-agnostic ledger operations.
//!
//! Every balance change in the festival goes through [`transfer`] or [`bulk`], which in
//! turn write balances only through [`account::adjust_balance`] and
//! [`account::compare_and_set_balance`].

/// Account store: users, booths and guarded balance writes
pub mod account;
/// Activity catalog and activity execution
pub mod activity;
/// Bulk SET / ADD / CLEAR adjustments
pub mod bulk;
/// Booth password hashing
pub mod credential;
/// Account references, transfer parties and caller identities
pub mod identity;
/// Append-only transaction log
pub mod ledger;
/// Booth leaderboard
pub mod ranking;
/// Bounded retry for store conflicts
pub mod retry;
/// Atomic two-party transfers and single-account admin adjustments
pub mod transfer;

/// Coin amounts and balances. One unit is one coin.
pub type Coins = i64;
