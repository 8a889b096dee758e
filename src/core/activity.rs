//! Activity catalog - priced actions each booth offers, and their execution.
//!
//! Only the owning booth may create, toggle, delete or execute its activities.
//! Deletion is soft so that log rows pointing at an activity keep a valid reference;
//! the log holds its own copy of the title and amount either way.

use crate::{
    core::{
        Coins, account,
        identity::{Identity, Party},
        transfer::{self, TransferRequest},
    },
    entities::{Activity, ActivityDirection, activity, transaction},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{info, instrument};

/// Lists a booth's activities, most recent first. Deleted activities are hidden.
pub async fn list_activities(
    db: &DatabaseConnection,
    booth_id: &str,
) -> Result<Vec<activity::Model>> {
    Activity::find()
        .filter(activity::Column::BoothId.eq(booth_id))
        .filter(activity::Column::IsDeleted.eq(false))
        .order_by_desc(activity::Column::CreatedAt)
        .order_by_desc(activity::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves an activity by id.
///
/// # Errors
/// `NotFound` for unknown or deleted activities.
pub async fn get_activity(db: &DatabaseConnection, activity_id: i64) -> Result<activity::Model> {
    Activity::find_by_id(activity_id)
        .one(db)
        .await?
        .filter(|a| !a.is_deleted)
        .ok_or_else(|| Error::not_found("Activity", activity_id))
}

/// Adds an activity to a booth's catalog.
///
/// # Errors
/// - `Forbidden` unless `actor` is the booth `booth_id`
/// - `Validation` for an empty title
/// - `InvalidAmount` for a negative price
/// - `NotFound` when the booth does not exist
#[instrument(skip(db, actor, title), fields(actor = %actor.account))]
pub async fn create_activity(
    db: &DatabaseConnection,
    actor: &Identity,
    booth_id: &str,
    title: String,
    price: Coins,
    direction: ActivityDirection,
) -> Result<activity::Model> {
    if !actor.is_booth(booth_id) {
        return Err(Error::Forbidden {
            reason: format!("{} cannot add activities to booth {booth_id}", actor.account),
        });
    }
    if title.trim().is_empty() {
        return Err(Error::Validation {
            message: "Activity title cannot be empty".to_string(),
        });
    }
    if price < 0 {
        return Err(Error::InvalidAmount {
            reason: format!("activity price cannot be {price}"),
        });
    }
    account::get_booth(db, booth_id)
        .await?
        .ok_or_else(|| Error::not_found("Booth", booth_id))?;

    let model = activity::ActiveModel {
        booth_id: Set(booth_id.to_string()),
        title: Set(title.trim().to_string()),
        price: Set(price),
        direction: Set(direction),
        is_active: Set(true),
        is_deleted: Set(false),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    let created = model.insert(db).await?;
    info!(activity_id = created.id, "Created activity");
    Ok(created)
}

/// Loads an activity and checks that `actor` owns it.
async fn owned_activity(
    db: &DatabaseConnection,
    actor: &Identity,
    activity_id: i64,
) -> Result<activity::Model> {
    let activity = get_activity(db, activity_id).await?;
    if !actor.is_booth(&activity.booth_id) {
        return Err(Error::Forbidden {
            reason: format!(
                "activity {activity_id} belongs to booth {}, not {}",
                activity.booth_id, actor.account
            ),
        });
    }
    Ok(activity)
}

/// Soft-deletes an activity owned by `actor`.
///
/// # Errors
/// `NotFound` for unknown or already deleted activities, `Forbidden` when another booth
/// owns it.
#[instrument(skip(db, actor), fields(actor = %actor.account))]
pub async fn delete_activity(
    db: &DatabaseConnection,
    actor: &Identity,
    activity_id: i64,
) -> Result<()> {
    let mut activity: activity::ActiveModel = owned_activity(db, actor, activity_id).await?.into();
    activity.is_deleted = Set(true);
    activity.is_active = Set(false);
    activity.update(db).await?;
    info!("Deleted activity");
    Ok(())
}

/// Opens or closes an activity without deleting it.
pub async fn set_activity_active(
    db: &DatabaseConnection,
    actor: &Identity,
    activity_id: i64,
    active: bool,
) -> Result<activity::Model> {
    let mut activity: activity::ActiveModel = owned_activity(db, actor, activity_id).await?.into();
    activity.is_active = Set(active);
    activity.update(db).await.map_err(Into::into)
}

/// Runs an activity for a user: PAY charges the user, REWARD pays them.
///
/// The transfer carries the activity id and a copy of its title.
///
/// # Arguments
/// * `actor` - Booth running the activity; must own it
/// * `activity_id` - Activity to run
/// * `user_id` - User on the other side of the transfer
///
/// # Errors
/// - `NotFound` for unknown, deleted or inactive activities, or an unknown user
/// - `Forbidden` when `actor` is not the owning booth
/// - `InvalidAmount` for zero-priced activities
/// - `InsufficientBalance` when the paying side cannot cover the price
#[instrument(skip(db, actor), fields(actor = %actor.account))]
pub async fn execute_activity(
    db: &DatabaseConnection,
    actor: &Identity,
    activity_id: i64,
    user_id: i64,
) -> Result<transaction::Model> {
    let activity = owned_activity(db, actor, activity_id).await?;
    if !activity.is_active {
        return Err(Error::not_found("Activity", activity_id));
    }

    let user = Party::user(user_id);
    let booth = Party::booth(activity.booth_id.clone());
    let (source, destination) = match activity.direction {
        ActivityDirection::Pay => (&user, &booth),
        ActivityDirection::Reward => (&booth, &user),
    };

    transfer::execute(
        db,
        &TransferRequest {
            source,
            destination,
            amount: activity.price,
            label: &activity.title,
            activity_id: Some(activity.id),
        },
    )
    .await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::ledger::list_recent_transactions;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_activity_validation() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let owner = Identity::booth("2-3");

        let result = create_activity(
            &db,
            &Identity::booth("2-4"),
            "2-3",
            "Darts".to_string(),
            5,
            ActivityDirection::Pay,
        )
        .await;
        assert!(matches!(result, Err(Error::Forbidden { .. })));

        let result =
            create_activity(&db, &owner, "2-3", "  ".to_string(), 5, ActivityDirection::Pay).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result =
            create_activity(&db, &owner, "2-3", "Darts".to_string(), -1, ActivityDirection::Pay)
                .await;
        assert!(matches!(result, Err(Error::InvalidAmount { .. })));
    }

    #[tokio::test]
    async fn test_create_activity_for_missing_booth() -> Result<()> {
        let db = setup_test_db().await?;

        let result = create_activity(
            &db,
            &Identity::booth("5-5"),
            "5-5",
            "Darts".to_string(),
            5,
            ActivityDirection::Pay,
        )
        .await;
        assert!(matches!(result, Err(Error::NotFound { entity: "Booth", .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_list_activities_most_recent_first() -> Result<()> {
        let (db, booth) = setup_with_booth().await?;
        let other = create_test_booth(&db, "1-1").await?;

        let first = create_test_activity(&db, &booth.id, "Ring toss", 5, ActivityDirection::Pay).await?;
        let second = create_test_activity(&db, &booth.id, "Quiz prize", 3, ActivityDirection::Reward).await?;
        create_test_activity(&db, &other.id, "Elsewhere", 1, ActivityDirection::Pay).await?;

        let listed = list_activities(&db, &booth.id).await?;
        assert_eq!(listed, vec![second, first]);

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_activity_is_scoped_to_owner() -> Result<()> {
        let (db, booth) = setup_with_booth().await?;
        let intruder = create_test_booth(&db, "1-1").await?;
        let activity = create_test_activity(&db, &booth.id, "Ring toss", 5, ActivityDirection::Pay).await?;

        let result = delete_activity(&db, &Identity::booth(intruder.id), activity.id).await;
        assert!(matches!(result, Err(Error::Forbidden { .. })));
        assert_eq!(list_activities(&db, &booth.id).await?.len(), 1);

        delete_activity(&db, &Identity::booth(booth.id.clone()), activity.id).await?;
        assert!(list_activities(&db, &booth.id).await?.is_empty());
        assert!(matches!(
            get_activity(&db, activity.id).await,
            Err(Error::NotFound { .. })
        ));

        let again = delete_activity(&db, &Identity::booth(booth.id), activity.id).await;
        assert!(matches!(again, Err(Error::NotFound { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_execute_pay_activity() -> Result<()> {
        let (db, user, booth) = setup_with_user_and_booth().await?;
        fund_user(&db, user.id, 20).await?;
        let activity = create_test_activity(&db, &booth.id, "Popcorn", 8, ActivityDirection::Pay).await?;

        let record =
            execute_activity(&db, &Identity::booth(booth.id.clone()), activity.id, user.id).await?;

        assert_eq!(record.amount, 8);
        assert_eq!(record.title, "Popcorn");
        assert_eq!(record.activity_id, Some(activity.id));
        assert_eq!(record.source(), Party::user(user.id));
        assert_eq!(user_balance(&db, user.id).await?, 12);
        assert_eq!(booth_balance(&db, &booth.id).await?, 8);

        Ok(())
    }

    #[tokio::test]
    async fn test_execute_reward_activity() -> Result<()> {
        let (db, user, booth) = setup_with_user_and_booth().await?;
        fund_booth(&db, &booth.id, 50).await?;
        let activity =
            create_test_activity(&db, &booth.id, "Quiz winner", 15, ActivityDirection::Reward).await?;

        let record =
            execute_activity(&db, &Identity::booth(booth.id.clone()), activity.id, user.id).await?;

        assert_eq!(record.source(), Party::booth(booth.id.clone()));
        assert_eq!(record.destination(), Party::user(user.id));
        assert_eq!(user_balance(&db, user.id).await?, 15);
        assert_eq!(booth_balance(&db, &booth.id).await?, 35);

        Ok(())
    }

    #[tokio::test]
    async fn test_execute_rejections_leave_no_trace() -> Result<()> {
        let (db, user, booth) = setup_with_user_and_booth().await?;
        let owner = Identity::booth(booth.id.clone());
        let pricey = create_test_activity(&db, &booth.id, "Photo", 30, ActivityDirection::Pay).await?;
        let free = create_test_activity(&db, &booth.id, "Sticker", 0, ActivityDirection::Reward).await?;
        let closed = create_test_activity(&db, &booth.id, "Closed", 1, ActivityDirection::Pay).await?;
        set_activity_active(&db, &owner, closed.id, false).await?;
        let log_before = list_recent_transactions(&db, 100).await?;

        let broke = execute_activity(&db, &owner, pricey.id, user.id).await;
        assert!(matches!(broke, Err(Error::InsufficientBalance { .. })));

        let zero = execute_activity(&db, &owner, free.id, user.id).await;
        assert!(matches!(zero, Err(Error::InvalidAmount { .. })));

        let inactive = execute_activity(&db, &owner, closed.id, user.id).await;
        assert!(matches!(inactive, Err(Error::NotFound { .. })));

        let missing = execute_activity(&db, &owner, 9_999, user.id).await;
        assert!(matches!(missing, Err(Error::NotFound { .. })));

        let ghost = execute_activity(&db, &owner, pricey.id, 9_999).await;
        assert!(matches!(ghost, Err(Error::NotFound { entity: "User", .. })));

        let foreign = execute_activity(&db, &Identity::booth("1-1"), pricey.id, user.id).await;
        assert!(matches!(foreign, Err(Error::Forbidden { .. })));

        assert_eq!(list_recent_transactions(&db, 100).await?, log_before);
        assert_eq!(booth_balance(&db, &booth.id).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_deleted_activity_keeps_log_copy() -> Result<()> {
        let (db, user, booth) = setup_with_user_and_booth().await?;
        fund_user(&db, user.id, 10).await?;
        let owner = Identity::booth(booth.id.clone());
        let activity = create_test_activity(&db, &booth.id, "Lemonade", 4, ActivityDirection::Pay).await?;

        let record = execute_activity(&db, &owner, activity.id, user.id).await?;
        delete_activity(&db, &owner, activity.id).await?;

        let logged = crate::core::ledger::get_transaction(&db, record.id).await?;
        assert_eq!(logged.title, "Lemonade");
        assert_eq!(logged.amount, 4);
        assert_eq!(logged.activity_id, Some(activity.id));

        Ok(())
    }
}
