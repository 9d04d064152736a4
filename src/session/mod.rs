// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Unlocked-wallet session.
//!
//! A [`Session`] is either locked or holds the decrypted recovery phrase, the
//! derived signing identity, an inactivity timer and at most one inbox
//! subscription. Locking drops all of it at once; the phrase buffer is zeroed
//! on drop.
//!
//! The inactivity timer is armed on unlock only. Each unlock gets a fresh
//! cancellation token, and the expiry path re-checks that token under the
//! state mutex, so a timer from an earlier unlock can never lock a newer
//! session.

pub mod identity;
pub mod messaging;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use alloy::primitives::Address;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::blockchain::parse_address;
use crate::vault::{VaultCodec, VaultError, VaultStore};

pub use identity::SigningIdentity;
pub use messaging::{
    InboundMessage, MessageTransport, MessagingError, Subscription, SubscriptionHandle,
};

/// Inactivity window after which an unlocked session locks itself.
pub const DEFAULT_AUTO_LOCK: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Wallet is locked")]
    Locked,

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error("Could not derive a signing identity from the recovery phrase")]
    Identity,

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error(transparent)]
    Messaging(#[from] MessagingError),
}

/// Configures and creates a [`Session`].
pub struct SessionBuilder {
    store: VaultStore,
    codec: VaultCodec,
    auto_lock_after: Duration,
    transport: Option<Arc<dyn MessageTransport>>,
}

impl SessionBuilder {
    pub fn new(store: VaultStore) -> Self {
        Self {
            store,
            codec: VaultCodec::default(),
            auto_lock_after: DEFAULT_AUTO_LOCK,
            transport: None,
        }
    }

    pub fn codec(mut self, codec: VaultCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn auto_lock_after(mut self, after: Duration) -> Self {
        self.auto_lock_after = after;
        self
    }

    pub fn transport(mut self, transport: Arc<dyn MessageTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Session {
        Session {
            inner: Arc::new(SessionInner {
                state: Mutex::new(SessionState::Locked),
                store: self.store,
                codec: self.codec,
                auto_lock_after: self.auto_lock_after,
                transport: self.transport,
            }),
        }
    }
}

/// Shared handle to the wallet session. Clones refer to the same session.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    state: Mutex<SessionState>,
    store: VaultStore,
    codec: VaultCodec,
    auto_lock_after: Duration,
    transport: Option<Arc<dyn MessageTransport>>,
}

impl SessionInner {
    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

enum SessionState {
    Locked,
    Unlocked(ActiveSession),
}

struct ActiveSession {
    mnemonic: Zeroizing<String>,
    identity: SigningIdentity,
    /// Cancelled when this unlock ends, by lock, auto-lock or re-unlock.
    lifetime: CancellationToken,
    subscription: Option<CancellationToken>,
}

impl Drop for ActiveSession {
    fn drop(&mut self) {
        self.lifetime.cancel();
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel();
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("unlocked", &self.is_unlocked())
            .field("auto_lock_after", &self.inner.auto_lock_after)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn builder(store: VaultStore) -> SessionBuilder {
        SessionBuilder::new(store)
    }

    /// Decrypt the stored vault and open a session.
    ///
    /// Any failure leaves the session locked, including when a previous
    /// session was open.
    pub async fn unlock(&self, password: &str) -> Result<Address, SessionError> {
        match self.open(password).await {
            Ok((mnemonic, identity)) => Ok(self.activate(mnemonic, identity)),
            Err(e) => {
                self.lock();
                warn!(error = %e, "wallet unlock failed");
                Err(e)
            }
        }
    }

    async fn open(
        &self,
        password: &str,
    ) -> Result<(Zeroizing<String>, SigningIdentity), SessionError> {
        let record = self.inner.store.load()?.ok_or(VaultError::NoVault)?;
        let codec = self.inner.codec;
        let password = Zeroizing::new(password.to_owned());

        // PBKDF2 at full strength is too slow for a runtime worker.
        tokio::task::spawn_blocking(move || {
            let mnemonic = codec.decrypt(&password, &record.enc)?;
            let identity = SigningIdentity::from_phrase(&mnemonic)?;
            Ok::<_, SessionError>((mnemonic, identity))
        })
        .await
        .map_err(|_| SessionError::Vault(VaultError::Crypto("vault decryption task failed")))?
    }

    fn activate(&self, mnemonic: Zeroizing<String>, identity: SigningIdentity) -> Address {
        let address = identity.address();
        let lifetime = CancellationToken::new();

        let previous = {
            let mut state = self.inner.state();
            std::mem::replace(
                &mut *state,
                SessionState::Unlocked(ActiveSession {
                    mnemonic,
                    identity,
                    lifetime: lifetime.clone(),
                    subscription: None,
                }),
            )
        };
        drop(previous);

        self.arm_auto_lock(lifetime);
        info!(%address, "wallet unlocked");
        address
    }

    fn arm_auto_lock(&self, timer: CancellationToken) {
        let session: Weak<SessionInner> = Arc::downgrade(&self.inner);
        let after = self.inner.auto_lock_after;

        tokio::spawn(async move {
            tokio::select! {
                _ = timer.cancelled() => {}
                _ = tokio::time::sleep(after) => {
                    let Some(inner) = session.upgrade() else {
                        return;
                    };
                    let previous = {
                        let mut state = inner.state();
                        if timer.is_cancelled() {
                            return;
                        }
                        std::mem::replace(&mut *state, SessionState::Locked)
                    };
                    drop(previous);
                    info!(after_secs = after.as_secs(), "wallet auto-locked after inactivity");
                }
            }
        });
    }

    /// Drop all session material. Idempotent.
    pub fn lock(&self) {
        let previous = std::mem::replace(&mut *self.inner.state(), SessionState::Locked);
        if matches!(previous, SessionState::Unlocked(_)) {
            info!("wallet locked");
        }
    }

    pub fn is_unlocked(&self) -> bool {
        matches!(*self.inner.state(), SessionState::Unlocked(_))
    }

    fn with_active<T>(
        &self,
        f: impl FnOnce(&mut ActiveSession) -> Result<T, SessionError>,
    ) -> Result<T, SessionError> {
        match &mut *self.inner.state() {
            SessionState::Unlocked(active) => f(active),
            SessionState::Locked => Err(SessionError::Locked),
        }
    }

    pub fn address(&self) -> Result<Address, SessionError> {
        self.with_active(|active| Ok(active.identity.address()))
    }

    /// Compressed public key of the session identity.
    pub fn public_key(&self) -> Result<String, SessionError> {
        self.with_active(|active| Ok(active.identity.public_key()))
    }

    /// Run `f` against the plaintext recovery phrase without letting it
    /// escape the session.
    pub fn with_mnemonic<R>(&self, f: impl FnOnce(&str) -> R) -> Result<R, SessionError> {
        self.with_active(|active| Ok(f(active.mnemonic.as_str())))
    }

    pub(crate) fn identity(&self) -> Result<SigningIdentity, SessionError> {
        self.with_active(|active| Ok(active.identity.clone()))
    }

    fn transport(&self) -> Result<Arc<dyn MessageTransport>, SessionError> {
        self.inner.transport.clone().ok_or_else(|| {
            MessagingError::Unavailable("no messaging transport configured".to_string()).into()
        })
    }

    /// Open the inbox stream, replacing any live subscription.
    pub fn subscribe_inbox(&self) -> Result<Subscription, SessionError> {
        self.with_active(|active| {
            if let Some(previous) = active.subscription.take() {
                previous.cancel();
            }

            let transport = self.transport()?;
            let cancel = CancellationToken::new();
            let rx = transport.open_stream(active.identity.address(), cancel.clone())?;
            active.subscription = Some(cancel.clone());

            debug!(address = %active.identity.address(), "inbox subscription opened");
            Ok(Subscription::new(rx, cancel))
        })
    }

    /// Stop the live inbox subscription, if any. Idempotent.
    pub fn cancel_subscription(&self) {
        if let SessionState::Unlocked(active) = &mut *self.inner.state() {
            if let Some(subscription) = active.subscription.take() {
                subscription.cancel();
                debug!("inbox subscription cancelled");
            }
        }
    }

    /// Send `text` to `peer`. Empty text is sent as a placeholder.
    ///
    /// A send still in flight when the session locks is abandoned and
    /// reported as [`SessionError::Locked`].
    pub async fn send_message(&self, peer: &str, text: &str) -> Result<(), SessionError> {
        let (identity, lifetime) =
            self.with_active(|active| Ok((active.identity.clone(), active.lifetime.clone())))?;
        let to = parse_address(peer).map_err(SessionError::InvalidAddress)?;
        let transport = self.transport()?;

        tokio::select! {
            biased;
            _ = lifetime.cancelled() => {
                warn!(%to, "session locked while a message was in flight");
                Err(SessionError::Locked)
            }
            sent = transport.send(identity.signer(), to, messaging::outgoing_body(text)) => {
                sent?;
                debug!(%to, "message sent");
                Ok(())
            }
        }
    }
}
