use clap::Parser;
use portal_server::{
    app,
    config::Settings,
    db::{repositories::EngagementRepository, Database},
    AppState,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Portal API server
#[derive(Parser, Debug)]
#[command(name = "portal-server")]
#[command(about = "Feeds, engagement and inbox API for Portal", long_about = None)]
struct Args {
    /// Path to a settings TOML file
    #[arg(short, long, env = "PORTAL_CONFIG")]
    config: Option<PathBuf>,

    /// Do not load demo data, even if settings ask for it
    #[arg(long)]
    no_seed: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portal_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::new(args.config.as_deref())?;

    // Initialize database
    let db = Database::new(&settings.database.path)?;
    db.initialize()?;

    if settings.database.seed && !args.no_seed {
        db.seed_demo_data()?;
        tracing::info!("Demo data seeded");
    } else {
        EngagementRepository::new(db.pool.clone()).reconcile_counters()?;
    }
    tracing::info!("Database initialized at {}", settings.database.path);

    let state = AppState::new(db, settings.feed);

    // Run initial session cleanup on startup
    if let Err(e) = state.session_manager.cleanup_expired_sessions() {
        tracing::error!("Failed to cleanup expired sessions on startup: {}", e);
    }

    // Periodic session cleanup
    let cleanup_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(3600));
        loop {
            interval.tick().await;
            tracing::debug!("Running periodic session cleanup...");
            if let Err(e) = cleanup_state.session_manager.cleanup_expired_sessions() {
                tracing::error!("Periodic session cleanup failed: {}", e);
            }
        }
    });

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port).parse()?;
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
