//! Operator e-mail configuration loaded from environment variables.
//!
//! `FESTIVAL_ADMIN_EMAILS` holds a comma-separated list. It is consulted only when a
//! user is provisioned, to decide the role stored on the row; the ledger itself checks
//! roles through the caller's identity.

use crate::entities::UserRole;

/// Environment variable holding the operator e-mails
pub const ADMIN_EMAILS_VAR: &str = "FESTIVAL_ADMIN_EMAILS";

/// Splits a comma-separated list into normalized e-mails, dropping empty entries.
#[must_use]
pub fn parse_admin_emails(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|email| email.trim().to_lowercase())
        .filter(|email| !email.is_empty())
        .collect()
}

/// Operator e-mails configured in the environment, empty when unset.
#[must_use]
pub fn get_admin_emails() -> Vec<String> {
    std::env::var(ADMIN_EMAILS_VAR)
        .map(|raw| parse_admin_emails(&raw))
        .unwrap_or_default()
}

/// Role to provision for `email`: `Admin` when listed, otherwise `fallback`.
#[must_use]
pub fn role_for_email(email: &str, admin_emails: &[String], fallback: UserRole) -> UserRole {
    let email = email.trim().to_lowercase();
    if admin_emails.iter().any(|admin| *admin == email) {
        UserRole::Admin
    } else {
        fallback
    }
}
