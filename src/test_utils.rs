//! Shared test utilities for the festival ledger.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test accounts with sensible defaults.

use crate::{
    core::{
        Coins,
        account::{self, NewBooth, NewUser},
        activity,
        identity::{AccountRef, Identity, Party},
        transfer,
    },
    entities::{self, ActivityDirection, UserRole},
    errors::Result,
};
use sea_orm::{ConnectOptions, DatabaseConnection};
use std::path::PathBuf;

/// Password given to every booth created by [`create_test_booth`].
pub const TEST_BOOTH_PASSWORD: &str = "festival";

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// File-backed database removed when dropped.
pub struct TestDbFile {
    path: PathBuf,
}

impl TestDbFile {
    fn remove(&self) {
        for suffix in ["", "-wal", "-shm", "-journal"] {
            let mut path = self.path.clone().into_os_string();
            path.push(suffix);
            let _ = std::fs::remove_file(path);
        }
    }
}

impl Drop for TestDbFile {
    fn drop(&mut self) {
        self.remove();
    }
}

/// Creates a file-backed `SQLite` database served by a pool of `connections`.
///
/// Unlike [`setup_test_db`], concurrent callers really hold separate connections and
/// contend for the file lock.
pub async fn setup_pooled_test_db(
    name: &str,
    connections: u32,
) -> Result<(DatabaseConnection, TestDbFile)> {
    let path = std::env::temp_dir().join(format!(
        "festival-bank-{name}-{}.sqlite",
        std::process::id()
    ));
    let file = TestDbFile { path };
    // Leftovers from an aborted run.
    file.remove();

    let mut options = ConnectOptions::new(format!("sqlite://{}?mode=rwc", file.path.display()));
    options
        .max_connections(connections)
        .min_connections(connections)
        .sqlx_logging(false);
    let db = sea_orm::Database::connect(options).await?;
    crate::config::database::create_tables(&db).await?;
    Ok((db, file))
}

/// Creates a student with zero balance.
pub async fn create_test_user(
    db: &DatabaseConnection,
    email: &str,
) -> Result<entities::user::Model> {
    account::create_user(db, NewUser::new(email, "Test Student", UserRole::Student)).await
}

/// Creates the operator account and returns its identity.
pub async fn create_test_admin(db: &DatabaseConnection) -> Result<Identity> {
    let admin = account::create_user(
        db,
        NewUser::new("ops@school.example", "Festival Ops", UserRole::Admin),
    )
    .await?;
    Ok(Identity::from_user(&admin))
}

/// Creates a booth with [`TEST_BOOTH_PASSWORD`] and no display password.
pub async fn create_test_booth(
    db: &DatabaseConnection,
    booth_id: &str,
) -> Result<entities::booth::Model> {
    account::create_booth(
        db,
        NewBooth {
            id: booth_id.to_string(),
            name: format!("Booth {booth_id}"),
            password: TEST_BOOTH_PASSWORD.to_string(),
        },
        false,
    )
    .await
}

/// Creates an activity through the owning booth's identity.
pub async fn create_test_activity(
    db: &DatabaseConnection,
    booth_id: &str,
    title: &str,
    price: Coins,
    direction: ActivityDirection,
) -> Result<entities::activity::Model> {
    activity::create_activity(
        db,
        &Identity::booth(booth_id),
        booth_id,
        title.to_string(),
        price,
        direction,
    )
    .await
}

/// Mints coins into a user's balance.
pub async fn fund_user(db: &DatabaseConnection, user_id: i64, amount: Coins) -> Result<()> {
    transfer::transfer(db, &Party::System, &Party::user(user_id), amount, "Test funding").await?;
    Ok(())
}

/// Mints coins into a booth's balance.
pub async fn fund_booth(db: &DatabaseConnection, booth_id: &str, amount: Coins) -> Result<()> {
    transfer::transfer(db, &Party::System, &Party::booth(booth_id), amount, "Test funding").await?;
    Ok(())
}

/// Current balance of a user.
pub async fn user_balance(db: &DatabaseConnection, user_id: i64) -> Result<Coins> {
    account::balance_of(db, &AccountRef::User(user_id)).await
}

/// Current balance of a booth.
pub async fn booth_balance(db: &DatabaseConnection, booth_id: &str) -> Result<Coins> {
    account::balance_of(db, &AccountRef::Booth(booth_id.to_string())).await
}

/// Returns (db, user) for common test scenarios.
pub async fn setup_with_user() -> Result<(DatabaseConnection, entities::user::Model)> {
    let db = setup_test_db().await?;
    let user = create_test_user(&db, "student@school.example").await?;
    Ok((db, user))
}

/// Returns (db, booth) with booth `2-3`.
pub async fn setup_with_booth() -> Result<(DatabaseConnection, entities::booth::Model)> {
    let db = setup_test_db().await?;
    let booth = create_test_booth(&db, "2-3").await?;
    Ok((db, booth))
}

/// Sets up a complete test environment with a user and a booth, both at zero.
pub async fn setup_with_user_and_booth() -> Result<(
    DatabaseConnection,
    entities::user::Model,
    entities::booth::Model,
)> {
    let db = setup_test_db().await?;
    let user = create_test_user(&db, "student@school.example").await?;
    let booth = create_test_booth(&db, "2-3").await?;
    Ok((db, user, booth))
}
