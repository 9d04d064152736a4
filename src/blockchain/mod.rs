// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EVM chain integration.
//!
//! This module provides:
//! - Supported chains and their explorer endpoints
//! - Address validation shared by the risk scorer and the wallet session
//! - Native ETH transfers gated by the session lock and SafeSend

pub mod transfer;
pub mod types;

pub use transfer::{send_native, TransferError, TransferReceipt};
pub use types::*;
