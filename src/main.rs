// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vehicle_vault_server::{
    api::router,
    config::{AppConfig, LogFormat, DEFAULT_LOG_FILTER, LOG_FORMAT_ENV},
    credentials::{CachedCredentials, CredentialProvider, OpensslCredentialProvider},
    state::AppState,
    storage::{StoragePaths, VehicleStore},
};

fn init_tracing() {
    let format = std::env::var(LOG_FORMAT_ENV)
        .map(|value| LogFormat::parse(&value))
        .unwrap_or_default();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let files = &config.credential_files;
    let credentials = CachedCredentials::new(OpensslCredentialProvider::new(
        &files.key_file,
        &files.ssid_file,
        &files.passphrase_file,
    ));
    // Fetch once now so a provisioning problem stops the service at startup.
    if let Err(e) = credentials.fetch() {
        tracing::error!(error = %e, "Failed to load network credentials");
        return ExitCode::FAILURE;
    }

    let store = VehicleStore::new(
        StoragePaths::new(&config.data_dir),
        config.secrets.clone(),
        config.kdf,
        Arc::new(credentials),
    );
    tracing::info!(
        path = %store.paths().envelope().display(),
        iterations = config.kdf.iterations(),
        "Vehicle store ready"
    );

    let app = router(AppState::new(store));
    let bind_address = config.bind_address();

    let listener = match tokio::net::TcpListener::bind(&bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, address = %bind_address, "Failed to bind");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!("Vehicle vault listening on http://{bind_address} (docs at /docs)");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "Server failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Graceful shutdown initiated");
}
