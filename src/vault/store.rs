// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Single-slot vault persistence on the local filesystem.
//!
//! The slot is one JSON file. Writes go to a temp file first and are renamed
//! into place, so a crash never leaves a half-written vault behind.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::codec::VaultCodec;
use super::record::VaultRecord;
use super::VaultError;

/// File name of the vault slot inside the data directory.
pub const VAULT_FILE_NAME: &str = "xwallet_vault_v1.2.json";

/// Conventional file name for exported vault documents.
pub const EXPORT_FILE_NAME: &str = "xwallet_vault.json";

/// Local vault slot.
#[derive(Debug, Clone)]
pub struct VaultStore {
    path: PathBuf,
}

impl VaultStore {
    /// Store whose slot lives in `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(VAULT_FILE_NAME),
        }
    }

    /// Path of the slot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a vault is currently stored.
    pub fn exists(&self) -> bool {
        File::open(&self.path).is_ok()
    }

    /// Overwrite the slot with `record`.
    pub fn save(&self, record: &VaultRecord) -> Result<(), VaultError> {
        let document = record.to_document()?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = self.path.with_extension("tmp");
        {
            let file = open_private(&temp_path)?;
            let mut writer = BufWriter::new(file);
            writer.write_all(document.as_bytes())?;
            writer.flush()?;
        }

        fs::rename(&temp_path, &self.path)?;
        debug!(path = %self.path.display(), "vault saved");
        Ok(())
    }

    /// Read the stored record, if any.
    pub fn load(&self) -> Result<Option<VaultRecord>, VaultError> {
        let document = match fs::read_to_string(&self.path) {
            Ok(document) => document,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        VaultRecord::from_document(&document).map(Some)
    }

    /// Delete the stored vault. Succeeds when the slot is already empty.
    pub fn wipe(&self) -> Result<(), VaultError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("local vault deleted");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Encrypt `mnemonic` under `password` and save it as a fresh record.
    ///
    /// Used both for newly generated phrases and for imported phrases.
    pub fn create(
        &self,
        codec: &VaultCodec,
        password: &str,
        mnemonic: &str,
    ) -> Result<VaultRecord, VaultError> {
        let mnemonic = mnemonic.trim();
        if mnemonic.is_empty() || password.is_empty() {
            return Err(VaultError::EmptyInput);
        }

        let record = VaultRecord::new(codec.encrypt(password, mnemonic)?);
        self.save(&record)?;
        Ok(record)
    }

    /// Stored record as a transportable document.
    pub fn export(&self) -> Result<String, VaultError> {
        let record = self.load()?.ok_or(VaultError::NoVault)?;
        record.to_document()
    }

    /// Write the exported document to `path`.
    pub fn export_to(&self, path: impl AsRef<Path>) -> Result<(), VaultError> {
        let document = self.export()?;
        fs::write(path.as_ref(), document)?;
        Ok(())
    }

    /// Validate `document` and, only if it is well formed, replace the slot.
    pub fn import(&self, document: &str) -> Result<VaultRecord, VaultError> {
        let record = VaultRecord::from_document(document)?;
        self.save(&record)?;
        info!(version = record.version, "vault imported");
        Ok(record)
    }

    /// Import a document read from `path`.
    pub fn import_from(&self, path: impl AsRef<Path>) -> Result<VaultRecord, VaultError> {
        let document = fs::read_to_string(path.as_ref())?;
        self.import(&document)
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}
