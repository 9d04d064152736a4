// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Screened native-currency transfers.
//!
//! A transfer is signed with the unlocked session identity only after the
//! destination passes the SafeSend gate.

use alloy::{
    network::EthereumWallet,
    primitives::{utils::parse_ether, U256},
    providers::{Provider, ProviderBuilder},
    rpc::types::TransactionRequest,
};
use tracing::{info, warn};

use super::types::parse_address;
use crate::risk::{GateDecision, RiskGateClient};
use crate::session::{Session, SessionError};

/// Broadcast transfer.
#[derive(Debug, Clone)]
pub struct TransferReceipt {
    pub tx_hash: String,
    /// Explorer URL for the transaction
    pub explorer_url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Invalid recipient: {0}")]
    InvalidAddress(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("SafeSend blocked this transfer (risk score {score})")]
    Blocked { score: u8, findings: Vec<String> },

    #[error("RPC error: {0}")]
    Rpc(String),
}

/// Send `amount_eth` of the chain's native currency to `to`.
///
/// Checks run in order: session unlocked, recipient, amount, risk gate.
/// Nothing is signed unless all of them pass.
pub async fn send_native(
    session: &Session,
    gate: &RiskGateClient,
    rpc_url: &str,
    to: &str,
    amount_eth: &str,
) -> Result<TransferReceipt, TransferError> {
    session.address()?;
    let to_addr = parse_address(to).map_err(TransferError::InvalidAddress)?;

    let amount = amount_eth.trim();
    if amount.starts_with('-') {
        return Err(TransferError::InvalidAmount(
            "amount must be greater than zero".to_string(),
        ));
    }
    let value = parse_ether(amount)
        .map_err(|e| TransferError::InvalidAmount(format!("`{amount}`: {e}")))?;
    if value == U256::ZERO {
        return Err(TransferError::InvalidAmount(
            "amount must be greater than zero".to_string(),
        ));
    }

    let assessment = match gate.screen(&to_addr.to_string()).await {
        GateDecision::Allowed(assessment) => assessment,
        GateDecision::Blocked(assessment) => {
            warn!(to = %to_addr, score = assessment.score, "transfer blocked by SafeSend");
            return Err(TransferError::Blocked {
                score: assessment.score,
                findings: assessment.findings,
            });
        }
    };

    let url: url::Url = rpc_url
        .parse()
        .map_err(|e: url::ParseError| TransferError::Rpc(format!("Invalid RPC URL: {e}")))?;

    // The session may have locked while the gate was answering.
    let identity = session.identity()?;
    let wallet = EthereumWallet::from(identity.signer().clone());
    let provider = ProviderBuilder::new().wallet(wallet).connect_http(url);

    let tx = TransactionRequest::default()
        .from(identity.address())
        .to(to_addr)
        .value(value);

    let pending = provider
        .send_transaction(tx)
        .await
        .map_err(|e| TransferError::Rpc(format!("Failed to send transaction: {e}")))?;

    let tx_hash = format!("{:?}", pending.tx_hash());
    let explorer_url = format!("{}/tx/{}", gate.chain().network().explorer_url, tx_hash);

    info!(
        %tx_hash,
        to = %to_addr,
        amount_eth,
        score = assessment.score,
        "native transfer broadcast"
    );

    Ok(TransferReceipt {
        tx_hash,
        explorer_url,
    })
}
