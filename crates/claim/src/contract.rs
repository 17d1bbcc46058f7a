//! Drop contract call encoding

use crate::config::ChainSettings;
use crate::error::{ClaimError, ClaimResult};
use crate::request::ClaimRequest;
use crate::units::to_uint;
use ethabi::{Address, Contract, Token, Uint};

/// ABI of the only drop contract function the relay calls
const DROP_ABI: &str = r#"[
    {
        "type": "function",
        "name": "claimTo",
        "inputs": [
            { "name": "_to", "type": "address" },
            { "name": "_quantity", "type": "uint256" }
        ],
        "outputs": [],
        "stateMutability": "payable"
    }
]"#;

/// A fully-priced `claimTo` call, ready to be signed
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimCall {
    pub contract: Address,
    pub recipient: Address,
    /// Quantity in token base units
    pub quantity: Uint,
    /// Native value attached to the call (in wei)
    pub value: Uint,
    pub gas_limit: u64,
}

impl ClaimCall {
    /// Price a validated request against the resolved chain settings.
    ///
    /// A quantity that passed validation can still be unpriceable here: more
    /// fractional digits than the token has, a `uint256` overflow, or a
    /// fractional amount of wei. Those are execution failures, not bad input.
    pub fn build(request: &ClaimRequest, chain: &ChainSettings) -> ClaimResult<Self> {
        let units = request.qty.to_base_units(chain.token_decimals).ok_or_else(|| {
            ClaimError::Execution(format!(
                "quantity {} has more than {} decimals",
                request.qty, chain.token_decimals
            ))
        })?;
        let quantity = to_uint(&units)
            .ok_or_else(|| ClaimError::Execution(format!("quantity {} overflows uint256", request.qty)))?;

        let wei = request.qty.scale_value(&chain.value_per_unit).ok_or_else(|| {
            ClaimError::Execution(format!(
                "value for quantity {} at {} wei per unit is not a whole number of wei",
                request.qty, chain.value_per_unit
            ))
        })?;
        let value = to_uint(&wei)
            .ok_or_else(|| ClaimError::Execution(format!("value {} wei overflows uint256", wei)))?;

        Ok(Self {
            contract: chain.drop_address,
            recipient: request.to,
            quantity,
            value,
            gas_limit: chain.gas_limit,
        })
    }

    /// ABI-encoded call data for `claimTo(recipient, quantity)`
    pub fn encode_input(&self) -> ClaimResult<Vec<u8>> {
        let contract = Contract::load(DROP_ABI.as_bytes())?;
        let function = contract.function("claimTo")?;
        Ok(function.encode_input(&[Token::Address(self.recipient), Token::Uint(self.quantity)])?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::Quantity;
    use num_bigint::BigUint;
    use std::time::Duration;

    fn chain(decimals: u32, per_unit: u64) -> ChainSettings {
        ChainSettings {
            rpc_url: "http://localhost:8545".to_string(),
            chain_id: 8453,
            private_key: "0x01".to_string(),
            drop_address: Address::from_slice(&[0x11; 20]),
            token_decimals: decimals,
            value_per_unit: BigUint::from(per_unit),
            gas_limit: 350_000,
            receipt_poll_interval: Duration::from_millis(10),
        }
    }

    fn request(qty: &str) -> ClaimRequest {
        ClaimRequest {
            to: Address::from_slice(&[0xaa; 20]),
            qty: Quantity::parse(qty).unwrap(),
        }
    }

    #[test]
    fn test_build_scales_quantity_and_value() {
        let call = ClaimCall::build(&request("2"), &chain(18, 500)).unwrap();
        assert_eq!(call.quantity, Uint::exp10(18) * Uint::from(2u64));
        assert_eq!(call.value, Uint::from(1000u64));
        assert_eq!(call.gas_limit, 350_000);
        assert_eq!(call.contract, Address::from_slice(&[0x11; 20]));
    }

    fn build_error(qty: &str, chain: &ChainSettings) -> String {
        match ClaimCall::build(&request(qty), chain) {
            Err(ClaimError::Execution(msg)) => msg,
            other => panic!("expected an execution error for {}, got {:?}", qty, other),
        }
    }

    #[test]
    fn test_unpriceable_quantities_are_execution_errors() {
        assert_eq!(build_error("1.5", &chain(0, 0)), "quantity 1.5 has more than 0 decimals");
        assert_eq!(
            build_error("0.5", &chain(18, 3)),
            "value for quantity 0.5 at 3 wei per unit is not a whole number of wei"
        );
        assert_eq!(
            build_error("1e70", &chain(18, 0)),
            format!("quantity 1{} overflows uint256", "0".repeat(70))
        );
        assert!(ClaimError::Execution(build_error("1.5", &chain(0, 0))).status_code().is_server_error());
    }

    #[test]
    fn test_encode_input() {
        let call = ClaimCall::build(&request("1"), &chain(0, 0)).unwrap();
        let data = call.encode_input().unwrap();

        let selector = &keccak_hash::keccak("claimTo(address,uint256)").0[..4];
        assert_eq!(&data[..4], selector);
        assert_eq!(data.len(), 4 + 32 + 32);
        assert_eq!(&data[4 + 12..4 + 32], &[0xaa; 20]);
        assert_eq!(data[4 + 63], 1);
    }
}
