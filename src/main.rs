use contractor_api::config::AppConfig;
use contractor_api::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up SUPABASE_URL, CORS_ORIGINS, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env();

    let origins = config.cors_origins();
    tracing::info!(count = origins.len(), "CORS configuration loaded");
    for (idx, origin) in origins.iter().enumerate() {
        tracing::info!(idx, origin = %origin, "allowed origin");
    }

    let state = AppState::new(config)?;
    let app = app(state);

    // Allow tests or deployments to override port via env
    let port = std::env::var("CONTRACTOR_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(8000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!(addr = %bind_addr, "contractor API listening");

    axum::serve(listener, app).await?;
    Ok(())
}
