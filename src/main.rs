//! Larder
//!
//! An MCP server for household meal planning and pantry nutrition.

use std::sync::Arc;

use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};
use tracing_subscriber::EnvFilter;

use larder::build_info;
use larder::config::AppConfig;
use larder::db;
use larder::grocery::{KrogerClient, TokenCache};
use larder::mcp::LarderService;
use larder::nutrition::{ReqwestFetcher, Resolver};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (output to stderr to not interfere with MCP stdio)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("larder=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::from_env()?;

    // External services
    let fetcher = Arc::new(ReqwestFetcher::new(config.http.clone())?);
    let resolver = Resolver::from_config(&config.nutrition, fetcher);
    let grocery = Arc::new(KrogerClient::new(
        config.grocery.clone(),
        &config.http,
        Arc::new(TokenCache::new()),
    )?);

    // Print startup banner to stderr
    build_info::print_startup_banner(&resolver.source_names(), grocery.is_configured());
    eprintln!("Starting MCP server on stdio...");

    let db_path = config.database_path.clone();
    eprintln!("Database path: {}", db_path.display());

    // Ensure data directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Initialize database
    eprintln!("Initializing database...");
    let database = db::Database::new(&db_path)?;

    // Run migrations
    database.with_conn(|conn| {
        db::migrations::run_migrations(conn)?;
        let version = db::migrations::get_schema_version(conn)?;
        eprintln!("Database schema version: {}", version);
        Ok(())
    })?;

    if !grocery.is_configured() {
        tracing::warn!(
            "KROGER_CLIENT_ID/KROGER_CLIENT_SECRET not set; \
             meal pricing will report every ingredient as not found"
        );
    }

    // Create the Larder service
    let service = LarderService::new(db_path, database, resolver, grocery);

    // Create stdio transport
    let transport = (stdin(), stdout());

    // Start the MCP server
    let server = service.serve(transport).await?;

    // Wait for the server to complete
    server.waiting().await?;

    Ok(())
}
