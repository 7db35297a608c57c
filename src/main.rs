use std::path::PathBuf;

use clap::Parser;
use department_app::{AppState, config::ConfigLoader, create_app, store::Database};
use tracing::info;

/// Department App - departments and their employees over HTML and JSON
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the YAML configuration file. If not provided, built-in defaults are used.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind to, overriding the configuration
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to, overriding the configuration
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Args = Args::parse();

    let mut loader = match &args.config {
        Some(path) => ConfigLoader::load(path)?,
        None => ConfigLoader::default(),
    };
    if let Some(host) = args.host {
        loader.config_mut().server.host = host;
    }
    if let Some(port) = args.port {
        loader.config_mut().server.port = port;
    }

    let log_filter = loader.config().log_filter.clone();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_filter)),
        )
        .init();

    info!("Initializing department app");

    let db = match loader.database_path() {
        Some(path) => Database::open(path)?,
        None => {
            info!("Using in-memory database");
            Database::open_in_memory()?
        }
    };
    if let Some(seed) = loader.load_seed()? {
        db.seed(&seed).await?;
    }

    let app = create_app(AppState::new(db));

    let addr = loader.config().server.address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
