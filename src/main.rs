use std::net::SocketAddr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use saas_starter::{app, config::Config, db, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!("✅ Configuration loaded successfully");

    let state = AppState::new(&config).await?;
    tracing::info!("✅ AppState initialized");

    if let Err(e) = db::ensure_schema(&state.db).await {
        tracing::error!("❌ Failed to prepare database schema: {}", e);
        return Err(e.into());
    }

    let router = app::build_router(state)?;

    tracing::info!("🚀 Server listening on http://{}", config.bind_addr);
    tracing::info!(
        "🔒 Protecting {} (sign-in at {})",
        config.routes.protected_prefix,
        config.routes.sign_in_path
    );

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
