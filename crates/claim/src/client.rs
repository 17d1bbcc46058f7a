//! Signing client: builds, signs, broadcasts and confirms a claim transaction

use crate::config::ChainSettings;
use crate::contract::ClaimCall;
use crate::error::{ClaimError, ClaimResult};
use crate::rpc::BlockchainRpcClient;
use crate::transaction::{LegacyTransaction, Signer};
use async_trait::async_trait;
use tracing::{info, warn};

/// Submits a priced claim call and resolves once it is mined
#[async_trait]
pub trait ClaimClient: Send + Sync {
    /// Returns the mined transaction hash
    async fn claim_to(&self, chain: &ChainSettings, call: &ClaimCall) -> ClaimResult<String>;
}

/// [`ClaimClient`] that talks JSON-RPC to an EVM node
#[derive(Clone, Default)]
pub struct EvmClaimClient {
    http: reqwest::Client,
}

impl EvmClaimClient {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClaimClient for EvmClaimClient {
    async fn claim_to(&self, chain: &ChainSettings, call: &ClaimCall) -> ClaimResult<String> {
        let signer = Signer::from_private_key(&chain.private_key)?;
        let rpc = BlockchainRpcClient::with_client(self.http.clone(), chain.rpc_url.clone());

        let node_chain_id = rpc.get_chain_id().await?;
        if node_chain_id != chain.chain_id {
            return Err(ClaimError::Execution(format!(
                "network mismatch: expected chain id {}, node reports {}",
                chain.chain_id, node_chain_id
            )));
        }

        let nonce = rpc.get_transaction_count(&signer.address()).await?;
        let gas_price = rpc.gas_price().await?;

        let tx = LegacyTransaction {
            nonce,
            gas_price,
            gas_limit: call.gas_limit,
            to: call.contract,
            value: call.value,
            data: call.encode_input()?,
            chain_id: chain.chain_id,
        };
        let signed = tx.sign(&signer)?;
        let local_hash = signed.hash_hex();

        let node_hash = rpc.send_raw_transaction(&signed.raw_hex()).await?;
        if !node_hash.is_empty() && !node_hash.eq_ignore_ascii_case(&local_hash) {
            warn!(local = %local_hash, node = %node_hash, "node returned a different transaction hash");
        }

        info!(
            tx_hash = %local_hash,
            nonce = %nonce,
            recipient = %format!("0x{}", hex::encode(call.recipient.as_bytes())),
            "Claim transaction broadcast"
        );

        let receipt = rpc.wait_for_receipt(&local_hash, chain.receipt_poll_interval).await?;
        if !receipt.succeeded() {
            return Err(ClaimError::Execution(format!("transaction {} reverted", local_hash)));
        }

        let mined_hash = receipt
            .transaction_hash
            .filter(|h| !h.is_empty())
            .unwrap_or(local_hash);

        info!(tx_hash = %mined_hash, block = ?receipt.block_number, "Claim transaction mined");
        Ok(mined_hash)
    }
}
