use anyhow::{Context, Result};
use page_tree::application::services::{PageDispatcher, PluginRegistry};
use page_tree::infrastructure::{
    http::{router, static_routes, AppState},
    logging::init_tracing,
    page_types::register_builtin,
    Settings, SqlitePageRepository,
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("page_tree=info,tower_http=info");

    let settings = match std::env::var("CMS_SETTINGS_FILE") {
        Ok(path) => Settings::from_json_file(path)?,
        Err(_) => Settings::from_env()?,
    };

    let repository = SqlitePageRepository::new_with_path(&settings.database_path).with_context(|| {
        format!("Failed to open database {}", settings.database_path.display())
    })?;
    info!("Using database {}", settings.database_path.display());

    let mut registry = PluginRegistry::builder();
    register_builtin(&mut registry)?;
    let registry = registry.build();
    info!("Registered {} page types", registry.len());

    let dispatcher = PageDispatcher::new(
        Arc::new(registry),
        settings.language_config(),
        settings.dispatch_options(),
    )
    .with_routes(Arc::new(static_routes()?));

    let app = router(AppState::new(dispatcher, repository));
    let listener = tokio::net::TcpListener::bind(&settings.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", settings.bind_addr))?;
    info!("Serving pages on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
