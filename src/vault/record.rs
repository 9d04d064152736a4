// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Persisted vault document shape.
//!
//! Bytes are serialized as JSON arrays of numbers so that documents remain
//! interchangeable with vault files exported by the browser client.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::VaultError;

/// Current vault document version. Carried for forward migration, not enforced.
pub const VAULT_VERSION: u32 = 1;

/// PBKDF2 salt length in bytes.
pub const SALT_LEN: usize = 16;

/// AES-GCM nonce length in bytes.
pub const IV_LEN: usize = ring::aead::NONCE_LEN;

/// AES-GCM tag length in bytes.
const TAG_LEN: usize = 16;

/// Ciphertext (with appended GCM tag), nonce and KDF salt.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedBlob {
    /// Older exports name this field `ct`.
    #[serde(alias = "ct")]
    pub ciphertext: Vec<u8>,
    pub iv: [u8; IV_LEN],
    pub salt: [u8; SALT_LEN],
}

impl std::fmt::Debug for EncryptedBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedBlob")
            .field("ciphertext_len", &self.ciphertext.len())
            .field("iv", &"[..]")
            .field("salt", &"[..]")
            .finish()
    }
}

/// The single value stored in the vault slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultRecord {
    pub version: u32,
    pub enc: EncryptedBlob,
}

impl VaultRecord {
    pub fn new(enc: EncryptedBlob) -> Self {
        Self {
            version: VAULT_VERSION,
            enc,
        }
    }

    /// Parse and validate a transportable vault document.
    ///
    /// Rejects anything that is not an object with `enc.ciphertext` (or the
    /// legacy `enc.ct`), a 12-byte `iv`, a 16-byte `salt`, and a ciphertext
    /// long enough to hold a GCM tag.
    pub fn from_document(document: &str) -> Result<Self, VaultError> {
        let value: Value = serde_json::from_str(document)
            .map_err(|e| VaultError::InvalidFormat(format!("not valid JSON: {e}")))?;

        let enc = value
            .get("enc")
            .ok_or_else(|| VaultError::InvalidFormat("missing `enc`".to_string()))?;
        if enc.get("ciphertext").or_else(|| enc.get("ct")).is_none() {
            return Err(VaultError::InvalidFormat(
                "missing `enc.ciphertext`".to_string(),
            ));
        }

        let record: VaultRecord = serde_json::from_value(value)
            .map_err(|e| VaultError::InvalidFormat(e.to_string()))?;

        if record.enc.ciphertext.len() < TAG_LEN {
            return Err(VaultError::InvalidFormat(
                "ciphertext is shorter than the authentication tag".to_string(),
            ));
        }

        Ok(record)
    }

    /// Serialize to the transportable document form.
    pub fn to_document(&self) -> Result<String, VaultError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> VaultRecord {
        VaultRecord::new(EncryptedBlob {
            ciphertext: (0u8..40).collect(),
            iv: [7u8; IV_LEN],
            salt: [9u8; SALT_LEN],
        })
    }

    #[test]
    fn document_uses_byte_arrays() {
        let doc = sample().to_document().unwrap();
        let value: Value = serde_json::from_str(&doc).unwrap();

        assert_eq!(value["version"], 1);
        assert_eq!(value["enc"]["iv"].as_array().unwrap().len(), 12);
        assert_eq!(value["enc"]["salt"].as_array().unwrap().len(), 16);
        assert_eq!(value["enc"]["ciphertext"][3], 3);
    }

    #[test]
    fn document_roundtrip_preserves_record() {
        let record = sample();
        let parsed = VaultRecord::from_document(&record.to_document().unwrap()).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn legacy_ct_field_is_accepted() {
        let ct: Vec<u8> = (0u8..20).collect();
        let doc = serde_json::json!({
            "version": 1,
            "enc": { "ct": ct, "iv": vec![1u8; 12], "salt": vec![2u8; 16] }
        })
        .to_string();

        let record = VaultRecord::from_document(&doc).unwrap();
        assert_eq!(record.enc.ciphertext, ct);
        assert!(record.to_document().unwrap().contains("\"ciphertext\""));
    }

    #[test]
    fn missing_ciphertext_is_invalid() {
        let doc = r#"{"version":1,"enc":{"iv":[1,2,3,4,5,6,7,8,9,10,11,12]}}"#;
        let err = VaultRecord::from_document(doc).unwrap_err();
        assert!(matches!(err, VaultError::InvalidFormat(msg) if msg.contains("ciphertext")));
    }

    #[test]
    fn missing_enc_is_invalid() {
        assert!(matches!(
            VaultRecord::from_document(r#"{"version":1}"#),
            Err(VaultError::InvalidFormat(_))
        ));
    }

    #[test]
    fn non_json_is_invalid() {
        assert!(matches!(
            VaultRecord::from_document("not a vault"),
            Err(VaultError::InvalidFormat(_))
        ));
    }

    #[test]
    fn wrong_iv_length_is_invalid() {
        let doc = serde_json::json!({
            "version": 1,
            "enc": { "ciphertext": vec![0u8; 32], "iv": vec![1u8; 8], "salt": vec![2u8; 16] }
        })
        .to_string();
        assert!(matches!(
            VaultRecord::from_document(&doc),
            Err(VaultError::InvalidFormat(_))
        ));
    }

    #[test]
    fn short_ciphertext_is_invalid() {
        let doc = serde_json::json!({
            "version": 1,
            "enc": { "ciphertext": vec![0u8; 4], "iv": vec![1u8; 12], "salt": vec![2u8; 16] }
        })
        .to_string();
        assert!(matches!(
            VaultRecord::from_document(&doc),
            Err(VaultError::InvalidFormat(_))
        ));
    }

    #[test]
    fn debug_output_hides_material() {
        let rendered = format!("{:?}", sample());
        assert!(rendered.contains("ciphertext_len: 40"));
        assert!(!rendered.contains("[7, 7"));
    }
}
