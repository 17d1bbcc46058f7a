//! Claim service core logic

use super::client::ClaimClient;
use super::config::ClaimConfig;
use super::contract::ClaimCall;
use super::error::ClaimResult;
use super::request::ClaimFields;
use super::transaction::Signer;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Claim service
pub struct ClaimService {
    config: Arc<ClaimConfig>,
    client: Arc<dyn ClaimClient>,
}

impl ClaimService {
    pub fn new(config: ClaimConfig, client: Arc<dyn ClaimClient>) -> Self {
        Self {
            config: Arc::new(config),
            client,
        }
    }

    pub fn config(&self) -> &ClaimConfig {
        &self.config
    }

    /// Check the bearer token against the configured shared secret.
    /// Always passes when no secret is configured.
    pub fn authorize(&self, authorization: Option<&str>) -> bool {
        if !self.config.auth_required() {
            return true;
        }
        match (self.config.signer_secret.as_deref(), authorization) {
            (Some(secret), Some(header)) => strip_bearer(header) == secret,
            _ => false,
        }
    }

    /// Validate, price and submit one claim. Returns the mined transaction hash.
    pub async fn claim(&self, fields: &ClaimFields) -> ClaimResult<String> {
        // 1. Validate input
        let request = fields.validate()?;

        // 2. Resolve chain settings
        let chain = self.config.resolve_chain()?;

        // 3. Price the call
        let call = ClaimCall::build(&request, &chain)?;
        debug!(
            quantity = %call.quantity,
            value = %call.value,
            gas_limit = call.gas_limit,
            "Claim call priced"
        );

        info!(
            "Submitting claim of {} to 0x{} via 0x{}",
            request.qty,
            hex::encode(request.to.as_bytes()),
            hex::encode(call.contract.as_bytes())
        );

        // 4. Sign, broadcast and wait for the receipt
        let tx_hash = self.client.claim_to(&chain, &call).await?;

        info!("Successfully claimed for 0x{}, tx: {}", hex::encode(request.to.as_bytes()), tx_hash);
        Ok(tx_hash)
    }

    /// Relay status. Never touches the network and never exposes the key.
    pub fn get_status(&self) -> ClaimStatus {
        let signer = self.config.private_key.as_deref().and_then(|key| match Signer::from_private_key(key) {
            Ok(signer) => Some(format!("0x{}", hex::encode(signer.address().as_bytes()))),
            Err(e) => {
                warn!("Configured PRIVATE_KEY is unusable: {}", e);
                None
            }
        });

        ClaimStatus {
            signer,
            chain_id: self.config.chain_id.clone(),
            drop_address: self.config.drop_address.clone(),
            token_decimals: self.config.token_decimals.clone(),
            claim_value_wei_per_unit: self.config.claim_value_wei_per_unit.clone(),
            auth_required: self.config.auth_required(),
        }
    }
}

/// Strip a leading, case-insensitive `Bearer` scheme and the whitespace after it
fn strip_bearer(header: &str) -> &str {
    const SCHEME: &str = "bearer";
    if header.len() > SCHEME.len()
        && header.is_char_boundary(SCHEME.len())
        && header[..SCHEME.len()].eq_ignore_ascii_case(SCHEME)
    {
        let rest = &header[SCHEME.len()..];
        let token = rest.trim_start();
        if token.len() < rest.len() {
            return token;
        }
    }
    header
}

/// Relay status
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimStatus {
    pub signer: Option<String>,
    pub chain_id: String,
    pub drop_address: String,
    pub token_decimals: String,
    pub claim_value_wei_per_unit: String,
    pub auth_required: bool,
}
