// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chain types and constants.

use std::str::FromStr;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Network configuration for a supported chain.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Network name for display
    pub name: &'static str,
    /// Chain ID
    pub chain_id: u64,
    /// Etherscan-compatible API host
    pub explorer_api_host: &'static str,
    /// Block explorer URL
    pub explorer_url: &'static str,
}

/// Ethereum Sepolia testnet configuration.
pub const SEPOLIA: NetworkConfig = NetworkConfig {
    name: "Ethereum Sepolia",
    chain_id: 11_155_111,
    explorer_api_host: "api-sepolia.etherscan.io",
    explorer_url: "https://sepolia.etherscan.io",
};

/// Ethereum mainnet configuration.
pub const MAINNET: NetworkConfig = NetworkConfig {
    name: "Ethereum Mainnet",
    chain_id: 1,
    explorer_api_host: "api.etherscan.io",
    explorer_url: "https://etherscan.io",
};

/// Polygon PoS configuration.
pub const POLYGON: NetworkConfig = NetworkConfig {
    name: "Polygon",
    chain_id: 137,
    explorer_api_host: "api.polygonscan.com",
    explorer_url: "https://polygonscan.com",
};

/// Chains the risk scorer knows explorer endpoints for.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    #[default]
    Sepolia,
    Mainnet,
    Polygon,
}

impl Chain {
    /// Resolve the `chain` query parameter. Missing or unknown values fall
    /// back to Sepolia.
    pub fn from_query(raw: Option<&str>) -> Self {
        raw.and_then(|value| value.parse().ok()).unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::Sepolia => "sepolia",
            Chain::Mainnet => "mainnet",
            Chain::Polygon => "polygon",
        }
    }

    pub fn network(&self) -> &'static NetworkConfig {
        match self {
            Chain::Sepolia => &SEPOLIA,
            Chain::Mainnet => &MAINNET,
            Chain::Polygon => &POLYGON,
        }
    }
}

impl FromStr for Chain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sepolia" => Ok(Chain::Sepolia),
            "mainnet" => Ok(Chain::Mainnet),
            "polygon" => Ok(Chain::Polygon),
            other => Err(format!("unsupported chain `{other}`")),
        }
    }
}

impl std::fmt::Display for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lowercase `raw` and check it is `0x` followed by 40 hex digits.
pub fn normalize_address(raw: &str) -> Option<String> {
    let address = raw.trim().to_ascii_lowercase();
    let hex = address.strip_prefix("0x")?;
    if hex.len() == 40 && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        Some(address)
    } else {
        None
    }
}

/// Parse a user-supplied recipient or peer address.
pub fn parse_address(raw: &str) -> Result<Address, String> {
    let normalized =
        normalize_address(raw).ok_or_else(|| format!("`{}` is not a 0x address", raw.trim()))?;
    Address::from_str(&normalized).map_err(|e| e.to_string())
}
