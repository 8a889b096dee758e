//! Account references, transfer parties and caller identities.
//!
//! [`Party::System`] is the counterparty of every mint and burn, so call sites never
//! pass a bare `None` around. [`Identity`] is what the auth collaborator hands the core
//! for each request; the core trusts it and performs no credential checks of its own.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entities::{UserModel, UserRole};

/// The two kinds of balance-holding accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountKind {
    /// Student, teacher or operator
    User,
    /// Class stall
    Booth,
}

/// A pointer to one balance-holding account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AccountRef {
    /// User by numeric id
    User(i64),
    /// Booth by `<grade>-<classroom>` id
    Booth(String),
}

impl AccountRef {
    /// Kind of account this reference points at.
    #[must_use]
    pub const fn kind(&self) -> AccountKind {
        match self {
            Self::User(_) => AccountKind::User,
            Self::Booth(_) => AccountKind::Booth,
        }
    }
}

impl fmt::Display for AccountRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "user:{id}"),
            Self::Booth(id) => write!(f, "booth:{id}"),
        }
    }
}

/// One side of a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Party {
    /// Administrative origin or sink: coins are created or destroyed here
    System,
    /// A real account
    Account(AccountRef),
}

impl Party {
    /// Convenience constructor for a user party.
    #[must_use]
    pub const fn user(id: i64) -> Self {
        Self::Account(AccountRef::User(id))
    }

    /// Convenience constructor for a booth party.
    #[must_use]
    pub fn booth(id: impl Into<String>) -> Self {
        Self::Account(AccountRef::Booth(id.into()))
    }

    /// The referenced account, or `None` for the system side.
    #[must_use]
    pub const fn account(&self) -> Option<&AccountRef> {
        match self {
            Self::System => None,
            Self::Account(account) => Some(account),
        }
    }
}

impl From<AccountRef> for Party {
    fn from(account: AccountRef) -> Self {
        Self::Account(account)
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => f.write_str("system"),
            Self::Account(account) => account.fmt(f),
        }
    }
}

/// What kind of principal is making a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentityKind {
    /// Regular student or teacher
    User,
    /// A booth logged in with its own credentials
    Booth,
    /// Festival operator
    Admin,
}

/// Resolved caller identity supplied by the auth collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Account the caller acts as
    pub account: AccountRef,
    /// Privilege class of the caller
    pub kind: IdentityKind,
}

impl Identity {
    /// Identity for a signed-in booth.
    #[must_use]
    pub fn booth(id: impl Into<String>) -> Self {
        Self {
            account: AccountRef::Booth(id.into()),
            kind: IdentityKind::Booth,
        }
    }

    /// Identity for a signed-in user, elevated to `Admin` when the row carries that role.
    #[must_use]
    pub fn from_user(user: &UserModel) -> Self {
        let kind = if user.role == UserRole::Admin {
            IdentityKind::Admin
        } else {
            IdentityKind::User
        };
        Self {
            account: AccountRef::User(user.id),
            kind,
        }
    }

    /// True for festival operators
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.kind, IdentityKind::Admin)
    }

    /// Returns true when the caller is the given booth.
    #[must_use]
    pub fn is_booth(&self, booth_id: &str) -> bool {
        self.kind == IdentityKind::Booth
            && matches!(&self.account, AccountRef::Booth(id) if id == booth_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user_with_role(role: UserRole) -> UserModel {
        UserModel {
            id: 7,
            email: "someone@school.example".to_string(),
            name: "Someone".to_string(),
            role,
            grade: None,
            classroom: None,
            class_role: None,
            balance: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_admin_role_maps_to_admin_identity() {
        let identity = Identity::from_user(&user_with_role(UserRole::Admin));
        assert!(identity.is_admin());
        assert_eq!(identity.account, AccountRef::User(7));
    }

    #[test]
    fn test_teacher_is_plain_user() {
        let identity = Identity::from_user(&user_with_role(UserRole::Teacher));
        assert_eq!(identity.kind, IdentityKind::User);
        assert!(!identity.is_admin());
    }

    #[test]
    fn test_is_booth_checks_kind_and_id() {
        let identity = Identity::booth("2-3");
        assert!(identity.is_booth("2-3"));
        assert!(!identity.is_booth("2-4"));

        let user = Identity::from_user(&user_with_role(UserRole::Student));
        assert!(!user.is_booth("2-3"));
    }

    #[test]
    fn test_display() {
        assert_eq!(Party::System.to_string(), "system");
        assert_eq!(Party::user(3).to_string(), "user:3");
        assert_eq!(Party::booth("1-2").to_string(), "booth:1-2");
    }
}
