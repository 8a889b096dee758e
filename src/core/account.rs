//! Account store - Users and booths and the only code that writes their balances.
//!
//! Balance writes are single guarded `UPDATE` statements, so two writers on the same
//! account can never both pass the non-negative check. Everything else in the crate
//! (transfers, bulk adjustments) goes through [`adjust_balance`] or
//! [`compare_and_set_balance`].

use crate::{
    config::admins,
    core::{
        Coins, credential,
        identity::{AccountKind, AccountRef},
    },
    entities::{Booth, User, UserRole, booth, user},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, QuerySelect, Set, SqlErr, prelude::*, sea_query::Expr};
use tracing::{debug, info, instrument};

/// Profile data for provisioning a user on first login.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Login e-mail; normalized before lookup and storage
    pub email: String,
    /// Display name
    pub name: String,
    /// Role stored when the row is created
    pub role: UserRole,
    /// Grade for students and homeroom teachers
    pub grade: Option<i32>,
    /// Classroom number within the grade
    pub classroom: Option<i32>,
    /// Free-form class duty, e.g. "treasurer"
    pub class_role: Option<String>,
}

impl NewUser {
    /// A user without class grouping.
    #[must_use]
    pub fn new(email: impl Into<String>, name: impl Into<String>, role: UserRole) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
            role,
            grade: None,
            classroom: None,
            class_role: None,
        }
    }

    /// Attaches the class grouping shown on dashboards.
    #[must_use]
    pub fn with_class(mut self, grade: i32, classroom: i32, class_role: Option<String>) -> Self {
        self.grade = Some(grade);
        self.classroom = Some(classroom);
        self.class_role = class_role;
        self
    }
}

/// Registration data for a booth.
#[derive(Debug, Clone)]
pub struct NewBooth {
    /// `<grade>-<classroom>`, e.g. `"2-3"`
    pub id: String,
    /// Name shown on the leaderboard
    pub name: String,
    /// Plaintext password, hashed before it is stored
    pub password: String,
}

/// Finds a user by id.
pub async fn get_user<C>(db: &C, user_id: i64) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    User::find_by_id(user_id).one(db).await.map_err(Into::into)
}

/// Finds a user by login e-mail (case-insensitive, surrounding whitespace ignored).
pub async fn get_user_by_email<C>(db: &C, email: &str) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    User::find()
        .filter(user::Column::Email.eq(normalize_email(email)))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a booth by id.
pub async fn get_booth<C>(db: &C, booth_id: &str) -> Result<Option<booth::Model>>
where
    C: ConnectionTrait,
{
    Booth::find_by_id(booth_id.to_string())
        .one(db)
        .await
        .map_err(Into::into)
}

/// Current balance of an account, or `None` if it does not exist.
pub async fn find_balance<C>(db: &C, account: &AccountRef) -> Result<Option<Coins>>
where
    C: ConnectionTrait,
{
    Ok(match account {
        AccountRef::User(id) => get_user(db, *id).await?.map(|u| u.balance),
        AccountRef::Booth(id) => get_booth(db, id).await?.map(|b| b.balance),
    })
}

/// Current balance of an account.
///
/// # Errors
/// `NotFound` when the account does not exist.
pub async fn balance_of<C>(db: &C, account: &AccountRef) -> Result<Coins>
where
    C: ConnectionTrait,
{
    find_balance(db, account)
        .await?
        .ok_or_else(|| account_not_found(account))
}

/// Fails with `NotFound` unless the account exists.
pub async fn require_account<C>(db: &C, account: &AccountRef) -> Result<()>
where
    C: ConnectionTrait,
{
    balance_of(db, account).await.map(|_| ())
}

/// Provisions a user, or returns the existing row when the e-mail is already known.
///
/// First-login provisioning calls this on every sign-in, so an existing user is never
/// an error and its balance is never touched. Two concurrent first logins resolve to
/// the same row.
#[instrument(skip(db, new_user), fields(email = %new_user.email))]
pub async fn create_user(db: &DatabaseConnection, new_user: NewUser) -> Result<user::Model> {
    let email = normalize_email(&new_user.email);
    if email.is_empty() {
        return Err(Error::Validation {
            message: "User e-mail cannot be empty".to_string(),
        });
    }

    if let Some(existing) = get_user_by_email(db, &email).await? {
        debug!(user_id = existing.id, "User already provisioned");
        return Ok(existing);
    }

    let model = user::ActiveModel {
        email: Set(email.clone()),
        name: Set(new_user.name.trim().to_string()),
        role: Set(new_user.role),
        grade: Set(new_user.grade),
        classroom: Set(new_user.classroom),
        class_role: Set(new_user.class_role),
        balance: Set(0),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    match model.insert(db).await {
        Ok(created) => {
            info!(user_id = created.id, role = ?created.role, "Provisioned user");
            Ok(created)
        }
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            debug!("Lost provisioning race, returning the row that won");
            get_user_by_email(db, &email)
                .await?
                .ok_or_else(|| Error::not_found("User", &email))
        }
        Err(err) => Err(err.into()),
    }
}

/// First-login provisioning: [`create_user`] with the role taken from the operator list.
///
/// An e-mail listed in `admin_emails` is stored as [`UserRole::Admin`]; any other
/// e-mail keeps `new_user.role`. The role only applies when the row is created, so a
/// repeat login returns the stored row unchanged even if the list has since changed.
///
/// # Arguments
/// * `db` - Database connection
/// * `new_user` - Profile reported by the sign-in provider
/// * `admin_emails` - Normalized operator e-mails, see [`admins::get_admin_emails`]
///
/// # Errors
/// `Validation` for an empty e-mail, `Database` when the insert fails.
pub async fn provision_user(
    db: &DatabaseConnection,
    mut new_user: NewUser,
    admin_emails: &[String],
) -> Result<user::Model> {
    new_user.role = admins::role_for_email(&new_user.email, admin_emails, new_user.role);
    create_user(db, new_user).await
}

/// Registers a booth, or returns the existing row when the id is already taken.
///
/// The password is stored as an Argon2id hash. When `retain_display_password` is set,
/// the plaintext is also kept for the operators' booth list; it is never read back
/// for authentication.
#[instrument(skip(db, new_booth), fields(booth_id = %new_booth.id))]
pub async fn create_booth(
    db: &DatabaseConnection,
    new_booth: NewBooth,
    retain_display_password: bool,
) -> Result<booth::Model> {
    let id = new_booth.id.trim().to_string();
    parse_booth_id(&id)?;

    if new_booth.name.trim().is_empty() {
        return Err(Error::Validation {
            message: "Booth name cannot be empty".to_string(),
        });
    }
    if new_booth.password.is_empty() {
        return Err(Error::Validation {
            message: "Booth password cannot be empty".to_string(),
        });
    }

    if let Some(existing) = get_booth(db, &id).await? {
        debug!("Booth already registered");
        return Ok(existing);
    }

    let password_hash = credential::hash_password(&new_booth.password)?;
    let display_password = retain_display_password.then_some(new_booth.password);

    let model = booth::ActiveModel {
        id: Set(id.clone()),
        name: Set(new_booth.name.trim().to_string()),
        balance: Set(0),
        password_hash: Set(password_hash),
        display_password: Set(display_password),
        created_at: Set(chrono::Utc::now()),
    };

    match model.insert(db).await {
        Ok(created) => {
            info!("Registered booth");
            Ok(created)
        }
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            get_booth(db, &id)
                .await?
                .ok_or_else(|| Error::not_found("Booth", &id))
        }
        Err(err) => Err(err.into()),
    }
}

/// Splits a booth id into `(grade, classroom)`.
///
/// # Errors
/// `Validation` unless the id is two positive integers joined by `-`.
pub fn parse_booth_id(booth_id: &str) -> Result<(u32, u32)> {
    let invalid = || Error::Validation {
        message: format!("Booth id '{booth_id}' must look like <grade>-<classroom>"),
    };

    let (grade, classroom) = booth_id.split_once('-').ok_or_else(invalid)?;
    let grade: u32 = grade.parse().map_err(|_| invalid())?;
    let classroom: u32 = classroom.parse().map_err(|_| invalid())?;
    if grade == 0 || classroom == 0 {
        return Err(invalid());
    }
    Ok((grade, classroom))
}

/// Checks a booth login against the stored hash.
pub async fn verify_booth_password(
    db: &DatabaseConnection,
    booth_id: &str,
    password: &str,
) -> Result<bool> {
    let booth = get_booth(db, booth_id)
        .await?
        .ok_or_else(|| Error::not_found("Booth", booth_id))?;
    credential::verify_password(password, &booth.password_hash)
}

/// All users, in id order.
pub async fn list_users(db: &DatabaseConnection) -> Result<Vec<user::Model>> {
    User::find()
        .order_by_asc(user::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// All booths, in id order.
pub async fn list_booths<C>(db: &C) -> Result<Vec<booth::Model>>
where
    C: ConnectionTrait,
{
    Booth::find()
        .order_by_asc(booth::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// References to every account of one kind, for "select all" admin screens.
pub async fn list_account_refs(db: &DatabaseConnection, kind: AccountKind) -> Result<Vec<AccountRef>> {
    Ok(match kind {
        AccountKind::User => User::find()
            .select_only()
            .column(user::Column::Id)
            .order_by_asc(user::Column::Id)
            .into_tuple::<i64>()
            .all(db)
            .await?
            .into_iter()
            .map(AccountRef::User)
            .collect(),
        AccountKind::Booth => Booth::find()
            .select_only()
            .column(booth::Column::Id)
            .order_by_asc(booth::Column::Id)
            .into_tuple::<String>()
            .all(db)
            .await?
            .into_iter()
            .map(AccountRef::Booth)
            .collect(),
    })
}

/// Atomically adds `delta` to an account balance and returns the new balance.
///
/// Runs as `UPDATE .. SET balance = balance + delta WHERE id = ? AND balance BETWEEN
/// floor AND ceiling`, so a debit can never take the balance below zero and a credit
/// can never push it past [`Coins::MAX`], even with concurrent writers.
///
/// # Arguments
/// * `db` - Connection or open transaction
/// * `account` - Account to write
/// * `delta` - Signed change; negative debits
///
/// # Errors
/// `NotFound` when the account does not exist, `InsufficientBalance` when a debit
/// exceeds the current balance, `InvalidAmount` when a credit would overflow.
pub async fn adjust_balance<C>(db: &C, account: &AccountRef, delta: Coins) -> Result<Coins>
where
    C: ConnectionTrait,
{
    let debit = delta.checked_neg().ok_or_else(|| Error::InvalidAmount {
        reason: format!("cannot apply {delta} to {account}"),
    })?;
    // Range the stored balance must be in for `balance + delta` to land in 0..=MAX.
    let floor = debit.max(0);
    let ceiling = Coins::MAX - delta.max(0);

    let rows_affected = match account {
        AccountRef::User(id) => {
            User::update_many()
                .col_expr(
                    user::Column::Balance,
                    Expr::col(user::Column::Balance).add(delta),
                )
                .filter(user::Column::Id.eq(*id))
                .filter(user::Column::Balance.between(floor, ceiling))
                .exec(db)
                .await?
                .rows_affected
        }
        AccountRef::Booth(id) => {
            Booth::update_many()
                .col_expr(
                    booth::Column::Balance,
                    Expr::col(booth::Column::Balance).add(delta),
                )
                .filter(booth::Column::Id.eq(id.as_str()))
                .filter(booth::Column::Balance.between(floor, ceiling))
                .exec(db)
                .await?
                .rows_affected
        }
    };

    if rows_affected == 0 {
        let current = balance_of(db, account).await?;
        if delta > 0 {
            return Err(Error::InvalidAmount {
                reason: format!("crediting {delta} would overflow the balance of {account}"),
            });
        }
        return Err(Error::InsufficientBalance {
            account: account.to_string(),
            current,
            required: debit,
        });
    }

    balance_of(db, account).await
}

/// Sets an account balance to `new_balance` only if it still equals `expected`.
///
/// # Errors
/// `InvalidAmount` for a negative target, `NotFound` when the account does not exist,
/// `Conflict` when another writer changed the balance first.
pub async fn compare_and_set_balance<C>(
    db: &C,
    account: &AccountRef,
    expected: Coins,
    new_balance: Coins,
) -> Result<Coins>
where
    C: ConnectionTrait,
{
    if new_balance < 0 {
        return Err(Error::InvalidAmount {
            reason: format!("balance of {account} cannot be set to {new_balance}"),
        });
    }

    let rows_affected = match account {
        AccountRef::User(id) => {
            User::update_many()
                .col_expr(user::Column::Balance, Expr::value(new_balance))
                .filter(user::Column::Id.eq(*id))
                .filter(user::Column::Balance.eq(expected))
                .exec(db)
                .await?
                .rows_affected
        }
        AccountRef::Booth(id) => {
            Booth::update_many()
                .col_expr(booth::Column::Balance, Expr::value(new_balance))
                .filter(booth::Column::Id.eq(id.as_str()))
                .filter(booth::Column::Balance.eq(expected))
                .exec(db)
                .await?
                .rows_affected
        }
    };

    if rows_affected == 0 {
        let current = balance_of(db, account).await?;
        return Err(Error::Conflict {
            message: format!("balance of {account} moved from {expected} to {current}"),
        });
    }

    Ok(new_balance)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) fn account_not_found(account: &AccountRef) -> Error {
    match account {
        AccountRef::User(id) => Error::not_found("User", id),
        AccountRef::Booth(id) => Error::not_found("Booth", id),
    }
}
