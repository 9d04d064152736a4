// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signing identity derived from the recovery phrase.

use alloy::primitives::Address;
use alloy::signers::local::{coins_bip39::English, MnemonicBuilder, PrivateKeySigner};

use super::SessionError;

/// First account on the standard Ethereum path (`m/44'/60'/0'/0/0`).
#[derive(Clone)]
pub struct SigningIdentity {
    signer: PrivateKeySigner,
}

impl std::fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("address", &self.signer.address())
            .finish_non_exhaustive()
    }
}

impl SigningIdentity {
    /// Derive the identity from a BIP-39 English phrase.
    ///
    /// The error deliberately carries no detail so phrase words never end up
    /// in a log line.
    pub fn from_phrase(phrase: &str) -> Result<Self, SessionError> {
        let signer = MnemonicBuilder::<English>::default()
            .phrase(phrase)
            .build()
            .map_err(|_| SessionError::Identity)?;
        Ok(Self { signer })
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Compressed SEC1 public key, `0x`-prefixed hex.
    pub fn public_key(&self) -> String {
        let key: &k256::ecdsa::VerifyingKey = self.signer.credential().verifying_key();
        let point = key.to_encoded_point(true);
        alloy::hex::encode_prefixed(point.as_bytes())
    }

    pub fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }
}
