// Connection test for environment-configured databases
//
// Usage: envdb-ping NAME [NAME...]
//
// Loads `.env` from the working directory (if present), then for each
// logical name builds the configured tool, connects, pings and closes it.

use anyhow::{Context, Result};
use envdb_tools::{DbTool, EnvSettings, create_tool, with_connection};

async fn ping_one(name: &str, settings: &EnvSettings) -> Result<String> {
    let mut tool = create_tool(name, settings.clone())
        .with_context(|| format!("Failed to build tool for {}", name))?;
    let db_type = tool.database_type();

    with_connection(&mut tool, async |db: &mut DbTool| db.ping().await)
        .await
        .with_context(|| format!("Ping failed for {}", name))?;

    Ok(db_type.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match dotenvy::dotenv() {
        Ok(path) => log::info!("Loaded {}", path.display()),
        Err(e) if e.not_found() => log::debug!("No .env file found"),
        Err(e) => return Err(anyhow::Error::new(e).context("Failed to load .env")),
    }

    let names: Vec<String> = std::env::args().skip(1).collect();
    if names.is_empty() {
        eprintln!("usage: envdb-ping NAME [NAME...]");
        eprintln!();
        eprintln!("Each NAME is configured through DB__<NAME>__TYPE plus");
        eprintln!("DB__<NAME>__URL (relational) or DB__<NAME>__URI / DB__<NAME>__DB (MongoDB).");
        std::process::exit(2);
    }

    let settings = EnvSettings::from_env();
    let mut failures = 0;

    for name in &names {
        match ping_one(name, &settings).await {
            Ok(db_type) => println!("{}: ok ({})", name, db_type),
            Err(e) => {
                failures += 1;
                println!("{}: FAILED: {:#}", name, e);
            }
        }
    }

    if failures > 0 {
        log::warn!("{}/{} connections failed", failures, names.len());
        std::process::exit(1);
    }

    Ok(())
}
