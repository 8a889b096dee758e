use festival_bank::{
    config::{admins, database, festival},
    core::{
        account::{self, NewBooth, NewUser},
        ranking,
    },
    entities::UserRole,
    errors::Result,
};
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load the festival configuration
    let config = festival::load_default_config()
        .inspect_err(|e| error!("Failed to load festival configuration: {e}"))?;

    // 4. Connect and ensure the schema
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    database::create_tables(&db).await?;

    // 5. Register configured booths; existing ones are left untouched
    for booth in config.booths {
        account::create_booth(
            &db,
            NewBooth {
                id: booth.id,
                name: booth.name,
                password: booth.password,
            },
            config.retain_display_passwords,
        )
        .await
        .inspect_err(|e| error!("Failed to seed booth: {e}"))?;
    }

    // 6. Provision configured operators so they can sign in as admins
    let admin_emails = admins::get_admin_emails();
    for email in &admin_emails {
        let operator = account::provision_user(
            &db,
            NewUser::new(email.as_str(), email.as_str(), UserRole::Student),
            &admin_emails,
        )
        .await
        .inspect_err(|e| error!("Failed to provision operator: {e}"))?;
        info!(user_id = operator.id, role = ?operator.role, "Operator ready");
    }

    // 7. Report the current standings
    for standing in ranking::rank_booths(&db).await? {
        info!(
            position = standing.position,
            booth = %standing.booth_id,
            name = %standing.name,
            balance = standing.balance,
            "Booth standing"
        );
    }

    Ok(())
}
