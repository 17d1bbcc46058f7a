//! EIP-155 legacy transactions and secp256k1 signing

use crate::error::{ClaimError, ClaimResult};
use ethabi::{Address, Hash, Uint};
use k256::ecdsa::{RecoveryId, SigningKey};
use rlp::RlpStream;

/// Transaction signer holding a secp256k1 key
pub struct Signer {
    signing_key: SigningKey,
    address: Address,
}

impl Signer {
    /// Build a signer from a hex-encoded private key, with or without `0x`
    pub fn from_private_key(private_key: &str) -> ClaimResult<Self> {
        let key_hex = private_key.trim();
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);
        let key_bytes = hex::decode(key_hex)
            .map_err(|e| ClaimError::Execution(format!("invalid private key: {}", e)))?;
        if key_bytes.len() != 32 {
            return Err(ClaimError::Execution(format!(
                "invalid private key: expected 32 bytes, got {}",
                key_bytes.len()
            )));
        }

        let signing_key = SigningKey::from_slice(&key_bytes)
            .map_err(|e| ClaimError::Execution(format!("invalid private key: {}", e)))?;
        let address = address_of(&signing_key);

        Ok(Self { signing_key, address })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign a 32-byte prehash. Returns `(r, s, recovery id)` with `s`
    /// normalized to the lower half of the curve order.
    pub fn sign_hash(&self, hash: &Hash) -> ClaimResult<([u8; 32], [u8; 32], u8)> {
        let (mut signature, mut recovery_id) = self.signing_key.sign_prehash_recoverable(hash.as_bytes())?;

        if let Some(normalized) = signature.normalize_s() {
            signature = normalized;
            recovery_id = RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced());
        }

        let r: [u8; 32] = signature.r().to_bytes().into();
        let s: [u8; 32] = signature.s().to_bytes().into();
        Ok((r, s, recovery_id.to_byte()))
    }
}

/// Ethereum address of a signing key: the last 20 bytes of the keccak hash
/// of the uncompressed public key, without its `0x04` prefix.
pub fn address_of(signing_key: &SigningKey) -> Address {
    let public_key = signing_key.verifying_key().to_encoded_point(false);
    let hash = keccak_hash::keccak(&public_key.as_bytes()[1..]);
    Address::from_slice(&hash.0[12..])
}

/// Unsigned legacy transaction
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyTransaction {
    pub nonce: Uint,
    pub gas_price: Uint,
    pub gas_limit: u64,
    pub to: Address,
    pub value: Uint,
    pub data: Vec<u8>,
    pub chain_id: u64,
}

/// Signed, broadcast-ready transaction
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    pub raw: Vec<u8>,
    pub hash: Hash,
}

impl SignedTransaction {
    pub fn raw_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.raw))
    }

    pub fn hash_hex(&self) -> String {
        format!("0x{}", hex::encode(self.hash.as_bytes()))
    }
}

impl LegacyTransaction {
    fn append_body(&self, stream: &mut RlpStream) {
        stream.append(&trimmed(self.nonce));
        stream.append(&trimmed(self.gas_price));
        stream.append(&self.gas_limit);
        stream.append(&self.to.as_bytes().to_vec());
        stream.append(&trimmed(self.value));
        stream.append(&self.data);
    }

    /// EIP-155 signing hash: `keccak(rlp([nonce, gasPrice, gas, to, value, data, chainId, 0, 0]))`
    pub fn signing_hash(&self) -> Hash {
        let mut stream = RlpStream::new_list(9);
        self.append_body(&mut stream);
        stream.append(&self.chain_id);
        stream.append(&0u8);
        stream.append(&0u8);
        Hash::from(keccak_hash::keccak(&stream.out()).0)
    }

    pub fn sign(&self, signer: &Signer) -> ClaimResult<SignedTransaction> {
        let (r, s, recovery_id) = signer.sign_hash(&self.signing_hash())?;
        let v = self
            .chain_id
            .checked_mul(2)
            .and_then(|v| v.checked_add(35 + recovery_id as u64))
            .ok_or_else(|| ClaimError::Execution(format!("chain id {} too large", self.chain_id)))?;

        let mut stream = RlpStream::new_list(9);
        self.append_body(&mut stream);
        stream.append(&v);
        stream.append(&strip_leading_zeros(&r));
        stream.append(&strip_leading_zeros(&s));

        let raw = stream.out().to_vec();
        let hash = Hash::from(keccak_hash::keccak(&raw).0);
        Ok(SignedTransaction { raw, hash })
    }
}

/// Minimal big-endian encoding of an integer, as RLP requires
fn trimmed(value: Uint) -> Vec<u8> {
    let mut buf = [0u8; 32];
    value.to_big_endian(&mut buf);
    strip_leading_zeros(&buf)
}

fn strip_leading_zeros(bytes: &[u8]) -> Vec<u8> {
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    bytes[first..].to_vec()
}
