use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use auth_service::config::load_service_config;
use auth_service::directory::{hash_password, UserDirectory};
use auth_service::metrics::AuthMetrics;
use auth_service::{build_router, AppState};
use common_auth::TokenService;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // `auth-service hash-password <password>` prints a PHC string for the users file.
    let args: Vec<String> = env::args().skip(1).collect();
    if let [command, password] = args.as_slice() {
        if command == "hash-password" {
            println!("{}", hash_password(password)?);
            return Ok(());
        }
    }

    let config = load_service_config()?;

    let directory = UserDirectory::load(&config.users_file).with_context(|| {
        format!("Failed to load users from {}", config.users_file.display())
    })?;
    info!(users = directory.len(), "loaded user directory");

    let state = AppState {
        tokens: Arc::new(TokenService::new(config.token.clone(), &config.secret)?),
        directory: Arc::new(directory),
        metrics: Arc::new(AuthMetrics::new()?),
    };

    let app = build_router(state, &config.cors_origins);

    info!(addr = %config.listen_addr, "starting auth-service");
    let listener = TcpListener::bind(config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
