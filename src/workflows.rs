use std::time::{SystemTime, UNIX_EPOCH};

use bitcoin::hashes::{sha256, Hash};
use bitcoin::{Address, Network};
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::{debug, info};

use crate::config::HtlcConfig;
use crate::errors::{HtlcError, Result};
use crate::hashing::sha256 as sha256_bytes;
use crate::keys::{parse_address, pubkey_hash_of};
use crate::scripts::HtlcScript;
use crate::types::SwapContract;

/// Caller intent for a new contract, as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractParams {
    pub recipient_address: String,
    pub refund_address: String,
    pub network: Network,
    /// Counterparty's hash, hex. When absent a secret is generated here.
    pub contract_hash: Option<String>,
    /// UNIX timestamp in seconds. Defaults to now plus the configured window.
    pub expiration: Option<String>,
}

/// Turns [`ContractParams`] into a [`SwapContract`]. Pure computation apart
/// from reading the clock and the OS entropy source.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContractFactory {
    config: HtlcConfig,
}

impl ContractFactory {
    pub fn new(config: HtlcConfig) -> Self {
        ContractFactory { config }
    }

    pub fn config(&self) -> &HtlcConfig {
        &self.config
    }

    /// Create a contract, taking "now" from the system clock.
    pub fn create(&self, params: &ContractParams) -> Result<SwapContract> {
        self.create_at(params, unix_now()?)
    }

    /// Create a contract as of `now` (UNIX seconds).
    pub fn create_at(&self, params: &ContractParams, now: u64) -> Result<SwapContract> {
        let recipient_address = parse_address(&params.recipient_address, params.network)?;
        let refund_address = parse_address(&params.refund_address, params.network)?;
        let recipient_pubkey_hash = pubkey_hash_of(&recipient_address)?;
        let refund_pubkey_hash = pubkey_hash_of(&refund_address)?;

        let expiration = match &params.expiration {
            Some(text) => parse_expiration(text, now)?,
            None => {
                let expiration = now
                    .checked_add(self.config.expiration_window_secs)
                    .ok_or_else(|| HtlcError::Parameter("expiration overflows".to_string()))?;
                require_after(expiration, now)?
            }
        };

        let (secret, contract_hash) = match &params.contract_hash {
            Some(hash) => (None, parse_contract_hash(hash)?),
            None => {
                let secret = generate_secret()?;
                (Some(secret), sha256::Hash::from_byte_array(sha256_bytes(&secret)))
            }
        };

        let htlc = HtlcScript::new(
            recipient_pubkey_hash,
            refund_pubkey_hash,
            contract_hash,
            expiration,
            self.config.script_variant,
        )?;

        let contract = assemble_contract(
            recipient_address,
            refund_address,
            secret,
            &htlc,
            params.network,
        )?;

        info!(
            htlc_address = %contract.htlc_address,
            expiration = contract.expiration,
            has_secret = contract.secret.is_some(),
            "created HTLC contract"
        );
        Ok(contract)
    }
}

/// Put a contract together from checked parts. The witness script and the
/// funding address are always derived here, never taken from outside.
pub(crate) fn assemble_contract(
    recipient_address: Address,
    refund_address: Address,
    secret: Option<[u8; 32]>,
    htlc: &HtlcScript,
    network: Network,
) -> Result<SwapContract> {
    if let Some(secret) = &secret {
        if sha256_bytes(secret) != htlc.contract_hash.to_byte_array() {
            return Err(HtlcError::Parameter(
                "preimage does not hash to the contract hash".to_string(),
            ));
        }
    }
    if pubkey_hash_of(&recipient_address)? != htlc.recipient_pubkey_hash
        || pubkey_hash_of(&refund_address)? != htlc.refund_pubkey_hash
    {
        return Err(HtlcError::Address(
            "addresses do not match the script's pubkey hashes".to_string(),
        ));
    }

    let witness_script = htlc.compile()?;
    let htlc_address = Address::p2wsh(&witness_script, network);
    debug!(%htlc_address, script_len = witness_script.len(), "derived funding address");

    Ok(SwapContract {
        recipient_address,
        refund_address,
        secret,
        contract_hash: htlc.contract_hash,
        expiration: htlc.expiration,
        network,
        variant: htlc.variant,
        witness_script,
        htlc_address,
    })
}

/// 32 bytes from the OS entropy source. Never falls back to a weaker source.
pub fn generate_secret() -> Result<[u8; 32]> {
    let mut secret = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut secret)
        .map_err(|e| HtlcError::Randomness(e.to_string()))?;
    Ok(secret)
}

/// Parse a 64 character hex SHA256 hash.
pub fn parse_contract_hash(text: &str) -> Result<sha256::Hash> {
    let bytes = hex::decode(text.trim())
        .map_err(|e| HtlcError::Parameter(format!("contract hash is not hex: {e}")))?;
    let bytes: [u8; 32] = bytes.try_into().map_err(|bytes: Vec<u8>| {
        HtlcError::Parameter(format!("contract hash is {} bytes, expected 32", bytes.len()))
    })?;
    Ok(sha256::Hash::from_byte_array(bytes))
}

/// Parse a 64 character hex preimage.
pub fn parse_preimage(text: &str) -> Result<[u8; 32]> {
    let bytes = hex::decode(text.trim())
        .map_err(|e| HtlcError::Parameter(format!("preimage is not hex: {e}")))?;
    bytes.try_into().map_err(|bytes: Vec<u8>| {
        HtlcError::Parameter(format!("preimage is {} bytes, expected 32", bytes.len()))
    })
}

/// Parse an expiration timestamp that must lie strictly after `now`.
pub fn parse_expiration(text: &str, now: u64) -> Result<u64> {
    let expiration: u64 = text
        .trim()
        .parse()
        .map_err(|_| HtlcError::Parameter(format!("expiration {text:?} is not a number")))?;
    require_after(expiration, now)
}

fn require_after(expiration: u64, now: u64) -> Result<u64> {
    if expiration <= now {
        return Err(HtlcError::Parameter(format!(
            "expiration {expiration} is not after the current time {now}"
        )));
    }
    Ok(expiration)
}

fn unix_now() -> Result<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| HtlcError::Parameter(format!("system clock is before the epoch: {e}")))
}
