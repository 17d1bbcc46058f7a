//! Claim relay for a token drop contract
//!
//! A single HTTP endpoint that takes `{ to, qty }` and turns it into a signed
//! `claimTo(address,uint256)` transaction:
//! - Optional bearer-token check against a shared secret
//! - JSON or URL-encoded request bodies
//! - Exact decimal → base-unit conversion
//! - EIP-155 signing and broadcast over JSON-RPC, then a wait for the receipt

pub mod api;
pub mod client;
pub mod config;
pub mod contract;
pub mod error;
pub mod logging;
pub mod request;
pub mod rpc;
pub mod service;
pub mod transaction;
pub mod units;

pub use api::{router, ClaimResponse};
pub use client::{ClaimClient, EvmClaimClient};
pub use config::{ChainSettings, ClaimConfig};
pub use contract::ClaimCall;
pub use error::{ClaimError, ClaimResult};
pub use service::{ClaimService, ClaimStatus};
