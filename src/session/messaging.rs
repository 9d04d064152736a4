// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet-to-wallet messaging seam.
//!
//! The session owns at most one inbox subscription. The concrete network
//! lives behind [`MessageTransport`]; the session only decides when a stream
//! is opened and when it must stop.

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Placeholder body sent when the user submits an empty message.
pub const EMPTY_MESSAGE_PLACEHOLDER: &str = "(no text)";

#[derive(Debug, thiserror::Error)]
pub enum MessagingError {
    #[error("messaging transport unavailable: {0}")]
    Unavailable(String),

    #[error("failed to send message: {0}")]
    Send(String),
}

/// A message delivered to the unlocked wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub peer: Address,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

/// Messaging network used by the session.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// Start streaming messages addressed to `owner`.
    ///
    /// The transport must stop producing (and drop its sender) once `cancel`
    /// fires.
    fn open_stream(
        &self,
        owner: Address,
        cancel: CancellationToken,
    ) -> Result<mpsc::Receiver<InboundMessage>, MessagingError>;

    /// Deliver `content` from `sender` to `to`.
    async fn send(
        &self,
        sender: &PrivateKeySigner,
        to: Address,
        content: &str,
    ) -> Result<(), MessagingError>;
}

/// Live inbox stream. Ends for good once cancelled.
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::Receiver<InboundMessage>,
    cancel: CancellationToken,
}

impl Subscription {
    pub(crate) fn new(rx: mpsc::Receiver<InboundMessage>, cancel: CancellationToken) -> Self {
        Self { rx, cancel }
    }

    /// Next message, or `None` once the subscription is cancelled or the
    /// transport closes the stream.
    pub async fn next(&mut self) -> Option<InboundMessage> {
        if self.cancel.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            message = self.rx.recv() => message,
        }
    }

    /// Handle that can stop this subscription from elsewhere.
    pub fn handle(&self) -> SubscriptionHandle {
        SubscriptionHandle(self.cancel.clone())
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stop the stream. Idempotent.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Cancellation handle detached from the stream itself.
#[derive(Debug, Clone)]
pub struct SubscriptionHandle(CancellationToken);

impl SubscriptionHandle {
    pub fn cancel(&self) {
        self.0.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.is_cancelled()
    }
}

/// Body actually sent for user-entered `text`.
pub(crate) fn outgoing_body(text: &str) -> &str {
    if text.trim().is_empty() {
        EMPTY_MESSAGE_PLACEHOLDER
    } else {
        text
    }
}
