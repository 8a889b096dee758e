/// Database configuration and connection management
pub mod database;

/// Festival seed configuration loading from festival.toml
pub mod festival;

/// Operator e-mail list from environment variables
pub mod admins;
