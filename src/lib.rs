// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! SafeSend - non-custodial wallet core and address risk service
//!
//! The library keeps a recovery phrase encrypted at rest, unlocks it into a
//! time-limited session, and screens transfer destinations with a heuristic
//! risk score before anything is signed.
//!
//! ## Modules
//!
//! - `vault` - Password-based encryption and single-slot vault storage
//! - `session` - Lock state machine, signing identity, messaging seam
//! - `risk` - Explorer signals, scoring, client-side send gate
//! - `market` - Cached CoinGecko price proxy
//! - `blockchain` - Chain metadata, address parsing, native transfers
//! - `api` - HTTP API handlers (Axum)

pub mod api;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod market;
pub mod risk;
pub mod session;
pub mod state;
pub mod vault;
