// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Client-side pre-send gate backed by a remote `/check` endpoint.
//!
//! The gate fails open to a medium score: an unreachable scorer must not
//! strand funds, and a medium score stays below the default threshold.

use std::time::Duration;

use tracing::{info, warn};

use super::scorer::{RiskAssessment, FAIL_SAFE_SCORE};
use crate::blockchain::Chain;

/// Scores strictly above this value block a send.
pub const DEFAULT_BLOCK_THRESHOLD: u8 = 70;

/// Finding attached when the remote scorer cannot be used.
pub const FINDING_UNREACHABLE: &str = "SafeSend backend unreachable - default medium";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of screening a destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allowed(RiskAssessment),
    Blocked(RiskAssessment),
}

impl GateDecision {
    pub fn assessment(&self) -> &RiskAssessment {
        match self {
            Self::Allowed(assessment) | Self::Blocked(assessment) => assessment,
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked(_))
    }
}

/// HTTP client for a SafeSend `/check` endpoint.
#[derive(Debug, Clone)]
pub struct RiskGateClient {
    check_url: String,
    chain: Chain,
    threshold: u8,
    http: reqwest::Client,
}

impl RiskGateClient {
    /// Gate against `check_url` (the full `/check` URL) for `chain`.
    pub fn new(check_url: impl Into<String>, chain: Chain) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            check_url: check_url.into(),
            chain,
            threshold: DEFAULT_BLOCK_THRESHOLD,
            http,
        })
    }

    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn chain(&self) -> Chain {
        self.chain
    }

    /// Fetch the assessment for `address`.
    ///
    /// Never fails: transport errors, non-2xx statuses and unparseable
    /// bodies all collapse into [`RiskAssessment::fail_safe`].
    pub async fn check(&self, address: &str) -> RiskAssessment {
        let response = self
            .http
            .get(&self.check_url)
            .query(&[("address", address), ("chain", self.chain.as_str())])
            .send()
            .await;

        let response = match response {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                warn!(status = %response.status(), "SafeSend check returned an error status");
                return RiskAssessment::fail_safe(FINDING_UNREACHABLE);
            }
            Err(e) => {
                warn!(error = %e.without_url(), "SafeSend check unreachable");
                return RiskAssessment::fail_safe(FINDING_UNREACHABLE);
            }
        };

        match response.json::<RiskAssessment>().await {
            Ok(assessment) => assessment.clamped(),
            Err(e) => {
                warn!(error = %e.without_url(), "SafeSend check returned an unreadable body");
                RiskAssessment::fail_safe(FINDING_UNREACHABLE)
            }
        }
    }

    /// Apply the block threshold to an assessment.
    pub fn evaluate(&self, assessment: RiskAssessment) -> GateDecision {
        if assessment.score > self.threshold {
            GateDecision::Blocked(assessment)
        } else {
            GateDecision::Allowed(assessment)
        }
    }

    /// Check `address` and decide whether a send may proceed.
    pub async fn screen(&self, address: &str) -> GateDecision {
        let decision = self.evaluate(self.check(address).await);
        info!(
            chain = %self.chain,
            score = decision.assessment().score,
            blocked = decision.is_blocked(),
            "SafeSend screened destination"
        );
        decision
    }
}

// Keeps the fail-open default below the block threshold.
const _: () = assert!(FAIL_SAFE_SCORE <= DEFAULT_BLOCK_THRESHOLD);
