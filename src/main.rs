use anyhow::Result;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tokenscout::orchestrator::{AppContext, DecisionOrchestrator, RefreshOrchestrator};
use tokenscout::{api, db, Config};

#[derive(Parser)]
#[command(
    name = "tokenscout",
    about = "DYOR research aggregation service",
    version = "0.1.0"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API (default)
    Serve,

    /// Parse a .docx research document and print the structured report
    Parse {
        /// Path to the document
        file: String,
    },

    /// Refresh a token's report from its latest stored research input
    Refresh {
        /// Token name to refresh
        token_name: String,
    },

    /// Run the legacy single-document decision for a token
    Decide {
        /// Chain identifier (eth, base, ...)
        chain: String,
        /// Token contract address
        address: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first
    let config = Config::load()?;

    // Initialize tracing with structured JSON logging
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true).json();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "tokenscout starting up");

    // Initialize database, run migrations and verify connectivity
    let database = db::Database::new(&config.database.url).await?;
    database.run_migrations().await?;
    database.health_check().await?;
    info!("Database initialized successfully");

    let ctx = Arc::new(AppContext::from_config(database.pool.clone(), &config));

    let cli = Cli::parse();
    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(ctx, config.server.port).await?,
        Commands::Parse { file } => {
            let bytes = tokio::fs::read(&file).await?;
            let parser = tokenscout::dyor::ReportParser::new(ctx.llm.clone());
            let report = parser.parse_docx(&bytes).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Refresh { token_name } => {
            let orchestrator = RefreshOrchestrator::new(ctx);
            let updated = orchestrator.refresh_token_by_name(&token_name).await?;
            println!("{}", serde_json::to_string_pretty(&updated)?);
        }
        Commands::Decide { chain, address } => {
            let orchestrator = DecisionOrchestrator::new(ctx);
            let record = orchestrator.decide(&chain, &address).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
    }

    Ok(())
}

async fn serve(ctx: Arc<AppContext>, port: u16) -> Result<()> {
    let app = api::router(ctx);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
