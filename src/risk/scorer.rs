// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Heuristic address risk scoring.
//!
//! The score is a bounded point accumulation: a neutral base, plus a fixed
//! penalty for every signal that fires. Signal failures add nothing and are
//! reported as findings, so a partial upstream outage still yields a usable
//! score. The result is advisory; callers pick their own block threshold.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use utoipa::ToSchema;

use super::explorer::{ExplorerApi, SignalError, TxHistory};
use crate::blockchain::{normalize_address, Chain};

/// Starting score when no list matches.
pub const BASE_SCORE: i32 = 20;
/// Score returned for blocklisted addresses.
pub const BLOCKLIST_SCORE: u8 = 95;
/// Score returned for allowlisted addresses.
pub const ALLOWLIST_SCORE: u8 = 5;
/// Penalty when the address holds contract code.
pub const CONTRACT_PENALTY: i32 = 30;
/// Penalty when the address has never transacted.
pub const NO_HISTORY_PENALTY: i32 = 30;
/// Penalty when the first transaction is younger than [`NEW_ADDRESS_WINDOW_HOURS`].
pub const VERY_NEW_PENALTY: i32 = 20;
/// Score served when scoring itself fails.
pub const FAIL_SAFE_SCORE: u8 = 50;
/// Upper bound of every score.
pub const MAX_SCORE: u8 = 100;

/// Age, in hours, below which an address counts as very new.
pub const NEW_ADDRESS_WINDOW_HOURS: i64 = 48;

pub const FINDING_BLOCKLIST: &str = "Blocklist match: known scam";
pub const FINDING_ALLOWLIST: &str = "Allowlist: known good address";
pub const FINDING_CONTRACT: &str = "Address is a contract";
pub const FINDING_NEW_ACCOUNT: &str = "No transactions (new account)";
pub const FINDING_VERY_NEW: &str = "Very new address (<2 days old)";
pub const FINDING_HAS_HISTORY: &str = "Address has history";
pub const FINDING_CODE_CHECK_FAILED: &str = "Explorer code check failed";
pub const FINDING_TX_CHECK_FAILED: &str = "Explorer tx history check failed";
pub const FINDING_NO_TX_DATA: &str = "Explorer returned no tx data";
pub const FINDING_INTERNAL_ERROR: &str = "SafeSend internal error - default medium";

/// Addresses that short-circuit scoring.
pub const DEFAULT_BLOCKLIST: &[&str] = &["0x000000000000000000000000000000000000dead"];

/// Score plus the evidence behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RiskAssessment {
    /// Risk score in `[0, 100]`.
    pub score: u8,
    /// Human-readable evidence, in evaluation order.
    pub findings: Vec<String>,
}

impl RiskAssessment {
    /// Build an assessment from an accumulated score, clamping it to `[0, 100]`.
    pub fn from_points(points: i32, findings: Vec<String>) -> Self {
        Self {
            score: points.clamp(0, i32::from(MAX_SCORE)) as u8,
            findings,
        }
    }

    /// Medium-risk default used whenever no real score can be produced.
    pub fn fail_safe(finding: impl Into<String>) -> Self {
        Self {
            score: FAIL_SAFE_SCORE,
            findings: vec![finding.into()],
        }
    }

    /// Same assessment with the score capped at [`MAX_SCORE`].
    pub fn clamped(self) -> Self {
        Self {
            score: self.score.min(MAX_SCORE),
            ..self
        }
    }
}

/// Risk scoring errors surfaced to callers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RiskError {
    #[error("address required")]
    InvalidAddress,
}

/// Static allow/block lists. Entries are stored lowercase.
#[derive(Debug, Clone)]
pub struct RiskLists {
    blocklist: HashSet<String>,
    allowlist: HashSet<String>,
}

impl Default for RiskLists {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCKLIST.iter().copied(), std::iter::empty::<&str>())
    }
}

impl RiskLists {
    pub fn new<B, A>(blocklist: B, allowlist: A) -> Self
    where
        B: IntoIterator,
        B::Item: AsRef<str>,
        A: IntoIterator,
        A::Item: AsRef<str>,
    {
        Self {
            blocklist: blocklist
                .into_iter()
                .map(|a| a.as_ref().trim().to_ascii_lowercase())
                .collect(),
            allowlist: allowlist
                .into_iter()
                .map(|a| a.as_ref().trim().to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn is_blocked(&self, address: &str) -> bool {
        self.blocklist.contains(address)
    }

    pub fn is_allowed(&self, address: &str) -> bool {
        self.allowlist.contains(address)
    }
}

/// SafeSend risk scorer.
#[derive(Clone)]
pub struct RiskScorer {
    explorer: Arc<dyn ExplorerApi>,
    lists: RiskLists,
}

impl RiskScorer {
    pub fn new(explorer: Arc<dyn ExplorerApi>, lists: RiskLists) -> Self {
        Self { explorer, lists }
    }

    /// Score `address` on `chain`.
    ///
    /// List membership short-circuits; otherwise both explorer signals are
    /// fetched concurrently and combined.
    pub async fn assess(&self, address: &str, chain: Chain) -> Result<RiskAssessment, RiskError> {
        let address = normalize_address(address).ok_or(RiskError::InvalidAddress)?;

        if self.lists.is_blocked(&address) {
            return Ok(RiskAssessment {
                score: BLOCKLIST_SCORE,
                findings: vec![FINDING_BLOCKLIST.to_string()],
            });
        }
        if self.lists.is_allowed(&address) {
            return Ok(RiskAssessment {
                score: ALLOWLIST_SCORE,
                findings: vec![FINDING_ALLOWLIST.to_string()],
            });
        }

        let (code, history) = tokio::join!(
            self.explorer.has_code(chain, &address),
            self.explorer.transaction_history(chain, &address),
        );

        let mut points = BASE_SCORE;
        let mut findings = Vec::new();

        match code {
            Ok(true) => {
                points += CONTRACT_PENALTY;
                findings.push(FINDING_CONTRACT.to_string());
            }
            Ok(false) => {}
            Err(e) => {
                warn!(%chain, error = %e, "SafeSend code check failed");
                findings.push(FINDING_CODE_CHECK_FAILED.to_string());
            }
        }

        match history {
            Ok(TxHistory::Empty) => {
                points += NO_HISTORY_PENALTY;
                findings.push(FINDING_NEW_ACCOUNT.to_string());
            }
            Ok(TxHistory::FirstSeenAt(first_seen)) => {
                if Utc::now() - first_seen < Duration::hours(NEW_ADDRESS_WINDOW_HOURS) {
                    points += VERY_NEW_PENALTY;
                    findings.push(FINDING_VERY_NEW.to_string());
                } else {
                    findings.push(FINDING_HAS_HISTORY.to_string());
                }
            }
            Err(SignalError::NoData(message)) => {
                debug!(%chain, %message, "SafeSend explorer returned no tx data");
                findings.push(FINDING_NO_TX_DATA.to_string());
            }
            Err(e) => {
                warn!(%chain, error = %e, "SafeSend tx history check failed");
                findings.push(FINDING_TX_CHECK_FAILED.to_string());
            }
        }

        Ok(RiskAssessment::from_points(points, findings))
    }
}
