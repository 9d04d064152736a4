// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Encrypted Mnemonic Vault
//!
//! The vault keeps a wallet's recovery phrase on the local device, encrypted
//! under a key derived from the user's password.
//!
//! ## Scheme
//!
//! - PBKDF2-HMAC-SHA256, 100,000 iterations, 16-byte random salt
//! - AES-256-GCM, 12-byte random nonce, 16-byte tag appended to the ciphertext
//! - Salt and nonce are drawn fresh for every encryption
//!
//! ## Storage Layout
//!
//! ```text
//! {data_dir}/
//!   xwallet_vault_v1.2.json   # { "version": 1, "enc": { "ciphertext": [..], "iv": [..], "salt": [..] } }
//! ```
//!
//! The slot holds exactly one record. Saving overwrites it wholesale.

pub mod codec;
pub mod error;
pub mod record;
pub mod store;

pub use codec::{decrypt, encrypt, VaultCodec, PBKDF2_ITERATIONS};
pub use error::VaultError;
pub use record::{EncryptedBlob, VaultRecord, VAULT_VERSION};
pub use store::VaultStore;
