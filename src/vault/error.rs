// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Vault errors.

/// Errors raised by the vault codec and the vault store.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    /// Tag verification failed. Wrong passwords and tampered ciphertexts are
    /// reported through this single variant with the same message.
    #[error("Wrong password (or corrupted vault)")]
    Authentication,

    #[error("Invalid vault file: {0}")]
    InvalidFormat(String),

    #[error("No vault found")]
    NoVault,

    #[error("Mnemonic and password are required")]
    EmptyInput,

    #[error("Cryptographic failure: {0}")]
    Crypto(&'static str),

    #[error("Vault storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Vault serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
