//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

/// Booth activity catalog
pub mod activity;
/// Class booths
pub mod booth;
/// Append-only transfer log
pub mod transaction;
/// Students, teachers and operators
pub mod user;

// Re-export specific types to avoid conflicts
pub use activity::{
    ActivityDirection, Column as ActivityColumn, Entity as Activity, Model as ActivityModel,
};
pub use booth::{Column as BoothColumn, Entity as Booth, Model as BoothModel};
pub use transaction::{
    Column as TransactionColumn, Entity as Transaction, Model as TransactionModel,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel, UserRole};
