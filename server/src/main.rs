//! Standalone strata server.
//!
//! Loads a schema from a JSON file, opens a SQL back-end when
//! `DATABASE_URL` is set (in-memory otherwise), and exposes every schema
//! kind with the full method set.

use std::sync::Arc;
use strata_server::{config::Config, expose, Action, RestServer};
use strata_store::{MemoryStore, Schema, SqlStore, Store};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const ALL_ACTIONS: [Action; 4] = [
    Action::Get,
    Action::Create,
    Action::Update,
    Action::Delete,
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "strata_server=debug,strata=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    let data = std::fs::read(&config.schema_file)?;
    let schema: Arc<Schema> = Arc::new(serde_json::from_slice(&data)?);
    tracing::info!(kinds = ?schema.kinds(), "schema loaded");

    let backend: Arc<dyn Store> = match &config.database_url {
        Some(dsn) => {
            tracing::info!("using SQL back-end");
            Arc::new(SqlStore::new(schema.clone(), dsn.clone()))
        }
        None => {
            tracing::info!("using in-memory back-end");
            Arc::new(MemoryStore::new(schema.clone()))
        }
    };

    let exposed = schema
        .kinds()
        .into_iter()
        .map(|kind| expose(kind, &ALL_ACTIONS))
        .collect();

    let server = RestServer::new(schema, backend, exposed);
    let handle = server
        .serve(&format!("{}:{}", config.host, config.port))
        .await?;

    handle.wait().await;
    Ok(())
}
