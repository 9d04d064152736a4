// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! SafeSend address risk scoring.
//!
//! - [`explorer`]: Etherscan-compatible signal lookups
//! - [`scorer`]: list checks and heuristic scoring
//! - [`gate`]: client-side pre-send check against a remote scorer

pub mod explorer;
pub mod gate;
pub mod scorer;

pub use explorer::{EtherscanClient, ExplorerApi, SignalError, TxHistory};
pub use gate::{GateDecision, RiskGateClient, DEFAULT_BLOCK_THRESHOLD};
pub use scorer::{RiskAssessment, RiskError, RiskLists, RiskScorer};
