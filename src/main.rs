//! Aerostart relay service
//!
//! First-party forwarding endpoint for suggestion engines the start page
//! cannot query directly from the browser.

use aerostart_rs::{
    config::Settings,
    engines::EngineRegistry,
    network::HttpClient,
    relay::{create_router, RelayState},
};
use anyhow::Result;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("Starting aerostart-rs v{}", aerostart_rs::VERSION);

    // Load configuration
    let settings = load_settings()?;

    // Validate the engine catalog; a malformed config fails startup.
    let registry = EngineRegistry::from_configs(&settings.engines)?;
    info!(
        "Loaded {} engine configs ({} relayed)",
        registry.len(),
        registry.relay_engines().len()
    );

    // Initialize HTTP client
    let client = HttpClient::with_settings(&settings.outgoing)?;

    // Create relay state and router
    let state = RelayState::new(client, &settings.relay);
    let app = create_router(state);

    // Bind address
    let addr = SocketAddr::new(settings.server.bind_address.parse()?, settings.server.port);

    info!("Relay listening on http://{}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Load settings from file or use defaults
fn load_settings() -> Result<Settings> {
    // Check environment variable first
    if let Ok(path) = std::env::var("AEROSTART_SETTINGS_PATH") {
        let path = PathBuf::from(path);
        if path.exists() {
            info!("Loading settings from: {}", path.display());
            let mut settings = Settings::from_file(&path)?;
            settings.merge_env();
            return Ok(settings);
        }
    }

    // Try each default path
    let paths = [
        PathBuf::from("aerostart.yml"),
        PathBuf::from("config/aerostart.yml"),
        PathBuf::from("/etc/aerostart/aerostart.yml"),
        dirs::config_dir()
            .map(|p| p.join("aerostart/aerostart.yml"))
            .unwrap_or_default(),
    ];
    for path in paths.iter() {
        if path.exists() {
            info!("Loading settings from: {}", path.display());
            let mut settings = Settings::from_file(path)?;
            settings.merge_env();
            return Ok(settings);
        }
    }

    // Use defaults
    info!("No settings file found, using defaults");
    let mut settings = Settings::default();
    settings.merge_env();
    Ok(settings)
}
