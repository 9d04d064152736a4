// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, defaults, and the [`Config`] loaded once at
//! startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `3001` |
//! | `ETHERSCAN_API_KEY` | Explorer API key for risk signals | Unset: signals degrade to findings |
//! | `COINGECKO_API_KEY` | CoinGecko API key | Unset: anonymous requests |
//! | `COINGECKO_BASE_URL` | CoinGecko API base URL | `https://api.coingecko.com` |
//! | `CORS_ALLOWED_ORIGINS` | Comma-separated allowed origins | GitHub Pages + localhost:8080 |
//! | `CORS_DEFAULT_ORIGIN` | Origin echoed for unknown callers | `https://agethejedi.github.io` |
//! | `TLS_CERT_PATH` | PEM certificate chain enabling HTTPS | Unset: plain HTTP |
//! | `TLS_KEY_PATH` | PEM private key enabling HTTPS | Unset: plain HTTP |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::market::DEFAULT_COINGECKO_BASE_URL;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const ETHERSCAN_API_KEY_ENV: &str = "ETHERSCAN_API_KEY";
pub const COINGECKO_API_KEY_ENV: &str = "COINGECKO_API_KEY";
pub const COINGECKO_BASE_URL_ENV: &str = "COINGECKO_BASE_URL";
pub const CORS_ALLOWED_ORIGINS_ENV: &str = "CORS_ALLOWED_ORIGINS";
pub const CORS_DEFAULT_ORIGIN_ENV: &str = "CORS_DEFAULT_ORIGIN";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Origins served without falling back to the default.
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "https://agethejedi.github.io",
    "http://localhost:8080",
    "http://127.0.0.1:8080",
];

/// Origin echoed when the caller's origin is not on the allow-list.
pub const DEFAULT_CORS_ORIGIN: &str = "https://agethejedi.github.io";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {name}: {value}")]
    Invalid { name: &'static str, value: String },

    #[error("{present} is set but {missing} is not")]
    IncompleteTls {
        present: &'static str,
        missing: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub etherscan_api_key: Option<String>,
    pub coingecko_api_key: Option<String>,
    pub coingecko_base_url: String,
    pub cors_allowed_origins: Vec<String>,
    pub cors_default_origin: String,
    pub tls: Option<TlsPaths>,
    pub log_format: LogFormat,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |key: &Option<String>| key.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("Config")
            .field("bind_addr", &self.bind_addr)
            .field("etherscan_api_key", &redact(&self.etherscan_api_key))
            .field("coingecko_api_key", &redact(&self.coingecko_api_key))
            .field("coingecko_base_url", &self.coingecko_base_url)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("cors_default_origin", &self.cors_default_origin)
            .field("tls", &self.tls)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let host: IpAddr = host.parse().map_err(|_| ConfigError::Invalid {
            name: HOST_ENV,
            value: host.clone(),
        })?;

        let port = match get(PORT_ENV) {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: PORT_ENV,
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };

        let cors_allowed_origins = match get(CORS_ALLOWED_ORIGINS_ENV) {
            Some(raw) => raw
                .split(',')
                .map(|origin| origin.trim().trim_end_matches('/').to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            None => DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect(),
        };

        let tls = match (get(TLS_CERT_PATH_ENV), get(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(ConfigError::IncompleteTls {
                    present: TLS_CERT_PATH_ENV,
                    missing: TLS_KEY_PATH_ENV,
                })
            }
            (None, Some(_)) => {
                return Err(ConfigError::IncompleteTls {
                    present: TLS_KEY_PATH_ENV,
                    missing: TLS_CERT_PATH_ENV,
                })
            }
        };

        let log_format = match get(LOG_FORMAT_ENV).map(|f| f.to_ascii_lowercase()).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            bind_addr: SocketAddr::new(host, port),
            etherscan_api_key: get(ETHERSCAN_API_KEY_ENV),
            coingecko_api_key: get(COINGECKO_API_KEY_ENV),
            coingecko_base_url: get(COINGECKO_BASE_URL_ENV)
                .unwrap_or_else(|| DEFAULT_COINGECKO_BASE_URL.to_string()),
            cors_allowed_origins,
            cors_default_origin: get(CORS_DEFAULT_ORIGIN_ENV)
                .unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string()),
            tls,
            log_format,
        })
    }
}
