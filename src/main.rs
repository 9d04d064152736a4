// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;

use axum_server::tls_rustls::RustlsConfig;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use safesend::api::router;
use safesend::config::{Config, LogFormat, DEFAULT_LOG_FILTER};
use safesend::state::AppState;

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(config.log_format);

    let state = match AppState::from_config(&config) {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "failed to initialise application state");
            return ExitCode::FAILURE;
        }
    };
    if !state.explorer_configured {
        info!("ETHERSCAN_API_KEY not set; risk signals will degrade to findings");
    }

    let app = router(state).into_make_service();
    let addr = config.bind_addr;

    let served = match &config.tls {
        Some(tls) => {
            // Must happen before any TLS config is built.
            if rustls::crypto::ring::default_provider()
                .install_default()
                .is_err()
            {
                error!("failed to install rustls crypto provider");
                return ExitCode::FAILURE;
            }
            let tls_config = match RustlsConfig::from_pem_file(&tls.cert, &tls.key).await {
                Ok(tls_config) => tls_config,
                Err(e) => {
                    error!(error = %e, "failed to load TLS certificate or key");
                    return ExitCode::FAILURE;
                }
            };

            info!(%addr, "SafeSend server listening on https (docs at /docs)");
            tokio::select! {
                result = axum_server::bind_rustls(addr, tls_config).serve(app) => result,
                _ = shutdown_signal() => Ok(()),
            }
        }
        None => {
            info!(%addr, "SafeSend server listening on http (docs at /docs)");
            tokio::select! {
                result = axum_server::bind(addr).serve(app) => result,
                _ = shutdown_signal() => Ok(()),
            }
        }
    };

    match served {
        Ok(()) => {
            info!("SafeSend server stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "server failed");
            ExitCode::FAILURE
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
