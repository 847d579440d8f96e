use chrono_tz::Tz;
use engine::{DbStore, Ledger};
use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "budget_bot={level},telegram_bot={level},engine={level},migration={level}",
            level = settings.app.level
        ))
        .init();

    let timezone: Tz = settings.ledger.timezone.parse().map_err(|err| {
        format!("invalid timezone '{}': {err}", settings.ledger.timezone)
    })?;

    let db = match parse_database(&settings.database).await {
        Ok(db) => db,
        Err(err) => {
            tracing::error!("failed to initialize database: {err}");
            return Err(err);
        }
    };

    let ledger = match Ledger::builder(DbStore::new(db))
        .policy(settings.ledger.running_balance_policy)
        .timezone(timezone)
        .build()
        .await
    {
        Ok(ledger) => ledger,
        Err(err) => {
            tracing::error!("failed to load the ledger from database: {err}");
            return Err(err.into());
        }
    };
    tracing::info!(
        configured = ledger.is_configured(),
        %timezone,
        policy = ?ledger.policy(),
        "ledger loaded"
    );

    let mut builder = telegram_bot::Bot::builder()
        .token(&settings.telegram.token)
        .allowed_user(settings.telegram.allowed_user_id)
        .report_format(settings.telegram.report_format)
        .ledger(ledger);
    if let Some(bytes) = settings.telegram.max_import_bytes {
        builder = builder.max_import_bytes(bytes);
    }

    match builder.build() {
        Ok(bot) => bot.run().await,
        Err(err) => {
            tracing::error!("failed to initialize telegram bot: {err}");
            return Err(err.into());
        }
    }

    Ok(())
}

async fn parse_database(
    config: &Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{path}?mode=rwc"),
        Database::Url(url) => url.clone(),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
