// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Password-based AES-256-GCM encryption of the recovery phrase.
//!
//! Every call to [`VaultCodec::encrypt`] draws a new salt and a new nonce from
//! the system CSPRNG. Nonce reuse under one key breaks GCM confidentiality
//! and authenticity at once.
//!
//! The work factor is not stored in [`EncryptedBlob`]; vaults are always
//! opened with [`PBKDF2_ITERATIONS`].

use std::num::NonZeroU32;

use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::pbkdf2::{self, PBKDF2_HMAC_SHA256};
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::Zeroizing;

use super::record::{EncryptedBlob, SALT_LEN};
use super::VaultError;

/// PBKDF2 iteration count used for every stored vault.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// AES-256 key length in bytes.
const KEY_LEN: usize = 32;

/// Key derivation + authenticated encryption for vault payloads.
#[derive(Debug, Clone, Copy)]
pub struct VaultCodec {
    iterations: NonZeroU32,
}

impl Default for VaultCodec {
    fn default() -> Self {
        Self {
            iterations: NonZeroU32::new(PBKDF2_ITERATIONS).unwrap_or(NonZeroU32::MIN),
        }
    }
}

impl VaultCodec {
    /// Codec with the conventional work factor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Codec with a custom PBKDF2 iteration count.
    ///
    /// Blobs produced this way can only be opened by a codec using the same
    /// count.
    pub fn with_iterations(iterations: u32) -> Result<Self, VaultError> {
        let iterations = NonZeroU32::new(iterations)
            .ok_or(VaultError::Crypto("iteration count must be non-zero"))?;
        Ok(Self { iterations })
    }

    pub fn iterations(&self) -> u32 {
        self.iterations.get()
    }

    fn derive_key(&self, password: &str, salt: &[u8; SALT_LEN]) -> Zeroizing<[u8; KEY_LEN]> {
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        pbkdf2::derive(
            PBKDF2_HMAC_SHA256,
            self.iterations,
            salt,
            password.as_bytes(),
            key.as_mut(),
        );
        key
    }

    /// Encrypt `plaintext` under a key derived from `password`.
    pub fn encrypt(&self, password: &str, plaintext: &str) -> Result<EncryptedBlob, VaultError> {
        let rng = SystemRandom::new();

        let mut salt = [0u8; SALT_LEN];
        rng.fill(&mut salt)
            .map_err(|_| VaultError::Crypto("failed to generate random salt"))?;

        let mut iv = [0u8; NONCE_LEN];
        rng.fill(&mut iv)
            .map_err(|_| VaultError::Crypto("failed to generate random nonce"))?;

        let key = self.derive_key(password, &salt);
        let sealing_key = aes_key(&key)?;

        let mut in_out = plaintext.as_bytes().to_vec();
        sealing_key
            .seal_in_place_append_tag(Nonce::assume_unique_for_key(iv), Aad::empty(), &mut in_out)
            .map_err(|_| VaultError::Crypto("AES-256-GCM encryption failed"))?;

        Ok(EncryptedBlob {
            ciphertext: in_out,
            iv,
            salt,
        })
    }

    /// Decrypt and authenticate `blob`.
    ///
    /// Any failure after key derivation, including a plaintext that is not
    /// UTF-8, is reported as [`VaultError::Authentication`].
    pub fn decrypt(
        &self,
        password: &str,
        blob: &EncryptedBlob,
    ) -> Result<Zeroizing<String>, VaultError> {
        let key = self.derive_key(password, &blob.salt);
        let opening_key = aes_key(&key)?;

        let mut in_out = Zeroizing::new(blob.ciphertext.clone());
        let plaintext = opening_key
            .open_in_place(
                Nonce::assume_unique_for_key(blob.iv),
                Aad::empty(),
                in_out.as_mut_slice(),
            )
            .map_err(|_| VaultError::Authentication)?;

        let text = std::str::from_utf8(plaintext).map_err(|_| VaultError::Authentication)?;
        Ok(Zeroizing::new(text.to_owned()))
    }
}

fn aes_key(key: &[u8; KEY_LEN]) -> Result<LessSafeKey, VaultError> {
    let unbound = UnboundKey::new(&AES_256_GCM, key)
        .map_err(|_| VaultError::Crypto("failed to create AES-256-GCM key"))?;
    Ok(LessSafeKey::new(unbound))
}

/// Encrypt with the default codec.
pub fn encrypt(password: &str, plaintext: &str) -> Result<EncryptedBlob, VaultError> {
    VaultCodec::new().encrypt(password, plaintext)
}

/// Decrypt with the default codec.
pub fn decrypt(password: &str, blob: &EncryptedBlob) -> Result<Zeroizing<String>, VaultError> {
    VaultCodec::new().decrypt(password, blob)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHRASE: &str = "test test test test test test test test test test test junk";

    // Low work factor keeps the suite fast; the scheme is otherwise identical.
    fn fast_codec() -> VaultCodec {
        VaultCodec::with_iterations(1_000).unwrap()
    }

    #[test]
    fn default_codec_uses_conventional_work_factor() {
        assert_eq!(VaultCodec::new().iterations(), 100_000);
    }

    #[test]
    fn zero_iterations_rejected() {
        assert!(matches!(
            VaultCodec::with_iterations(0),
            Err(VaultError::Crypto(_))
        ));
    }

    #[test]
    fn roundtrip_with_default_codec() {
        let blob = encrypt("correct horse", PHRASE).unwrap();
        let plaintext = decrypt("correct horse", &blob).unwrap();
        assert_eq!(plaintext.as_str(), PHRASE);
    }

    #[test]
    fn roundtrip_handles_empty_and_unicode_plaintext() {
        let codec = fast_codec();
        for plaintext in ["", "ünïcödé phrase ✓", "a"] {
            let blob = codec.encrypt("pw", plaintext).unwrap();
            assert_eq!(codec.decrypt("pw", &blob).unwrap().as_str(), plaintext);
        }
    }

    #[test]
    fn wrong_password_fails_with_authentication_error() {
        let codec = fast_codec();
        let blob = codec.encrypt("password one", PHRASE).unwrap();

        let result = codec.decrypt("password two", &blob);
        assert!(matches!(result, Err(VaultError::Authentication)));
    }

    #[test]
    fn encrypting_twice_is_not_deterministic() {
        let codec = fast_codec();
        let a = codec.encrypt("pw", PHRASE).unwrap();
        let b = codec.encrypt("pw", PHRASE).unwrap();

        assert_ne!(a.salt, b.salt);
        assert_ne!(a.iv, b.iv);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn ciphertext_carries_gcm_tag() {
        let blob = fast_codec().encrypt("pw", "hello").unwrap();
        assert_eq!(blob.ciphertext.len(), "hello".len() + 16);
    }

    #[test]
    fn tampering_any_byte_fails_closed() {
        let codec = fast_codec();
        let blob = codec.encrypt("pw", PHRASE).unwrap();

        for index in [0, blob.ciphertext.len() / 2, blob.ciphertext.len() - 1] {
            let mut tampered = blob.clone();
            tampered.ciphertext[index] ^= 0x01;
            assert!(matches!(
                codec.decrypt("pw", &tampered),
                Err(VaultError::Authentication)
            ));
        }
    }

    #[test]
    fn tampered_nonce_or_salt_fails_closed() {
        let codec = fast_codec();
        let blob = codec.encrypt("pw", PHRASE).unwrap();

        let mut bad_iv = blob.clone();
        bad_iv.iv[0] ^= 0xff;
        assert!(matches!(codec.decrypt("pw", &bad_iv), Err(VaultError::Authentication)));

        let mut bad_salt = blob.clone();
        bad_salt.salt[15] ^= 0xff;
        assert!(matches!(codec.decrypt("pw", &bad_salt), Err(VaultError::Authentication)));
    }

    #[test]
    fn wrong_password_and_corruption_report_identically() {
        let codec = fast_codec();
        let blob = codec.encrypt("pw", PHRASE).unwrap();

        let wrong_password = codec.decrypt("other", &blob).unwrap_err().to_string();

        let mut corrupted = blob.clone();
        corrupted.ciphertext[3] ^= 0x80;
        let corrupted = codec.decrypt("pw", &corrupted).unwrap_err().to_string();

        assert_eq!(wrong_password, corrupted);
    }

    #[test]
    fn truncated_ciphertext_fails_closed() {
        let codec = fast_codec();
        let mut blob = codec.encrypt("pw", PHRASE).unwrap();
        blob.ciphertext.truncate(10);
        assert!(matches!(codec.decrypt("pw", &blob), Err(VaultError::Authentication)));
    }

    #[test]
    fn mismatched_work_factor_cannot_open() {
        let blob = fast_codec().encrypt("pw", PHRASE).unwrap();
        let other = VaultCodec::with_iterations(2_000).unwrap();
        assert!(matches!(other.decrypt("pw", &blob), Err(VaultError::Authentication)));
    }
}
