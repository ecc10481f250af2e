use clap::Parser;
use migration::{Migrator, MigratorTrait};

use cli::{Cli, Command};

mod cli;
mod commands;
mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let settings = settings::Settings::new(&cli.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "purse={level},engine={level}",
            level = settings.app.level
        ))
        .with_writer(std::io::stderr)
        .init();

    let db = parse_database(&settings.database).await?;
    let engine = engine::Engine::builder().database(db).build().await?;
    let trusted_source = settings.engine.trusted_source;
    tracing::debug!(trusted_source, "engine ready");

    match cli.command {
        Command::Currency(args) => commands::currency(&engine, args.command).await,
        Command::Wallet(args) => commands::wallet(&engine, args.command).await,
        Command::Category(args) => commands::category(&engine, args.command).await,
        Command::Tx(args) => commands::tx(&engine, args.command, trusted_source).await,
    }
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let database = sea_orm::Database::connect(config.url()).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
