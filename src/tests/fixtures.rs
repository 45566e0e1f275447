use std::str::FromStr;

use bitcoin::{Amount, Network, Txid};

use crate::keys::keypair_from_secret;
use crate::types::{FundingOutpoint, KeyPair, ScriptVariant, SpendRequest, SwapContract};
use crate::workflows::{ContractFactory, ContractParams};
use crate::HtlcConfig;

pub const NETWORK: Network = Network::Regtest;

/// 2023-11-14T22:13:20Z
pub const NOW: u64 = 1_700_000_000;

pub const FUNDING_TXID: &str = "fd2105607605d2302994ffea703b09f66b6351816ee737a93e42a841ea20bbad";

pub fn alice() -> KeyPair {
    keypair_from_secret([0x01; 32], NETWORK).unwrap()
}

pub fn bob() -> KeyPair {
    keypair_from_secret([0x02; 32], NETWORK).unwrap()
}

pub fn mallory() -> KeyPair {
    keypair_from_secret([0x03; 32], NETWORK).unwrap()
}

/// Bob can redeem with the secret, Alice can refund after an hour.
pub fn bob_redeems_alice_refunds(variant: ScriptVariant) -> SwapContract {
    let params = ContractParams {
        recipient_address: bob().address.to_string(),
        refund_address: alice().address.to_string(),
        network: NETWORK,
        contract_hash: None,
        expiration: Some((NOW + 3600).to_string()),
    };
    ContractFactory::new(HtlcConfig::default().with_script_variant(variant))
        .create_at(&params, NOW)
        .unwrap()
}

pub fn funding_outpoint(value: u64) -> FundingOutpoint {
    FundingOutpoint {
        txid: Txid::from_str(FUNDING_TXID).unwrap(),
        vout: 0,
        value: Amount::from_sat(value),
    }
}

pub fn spend_request(
    contract: &SwapContract,
    signer: &KeyPair,
    value: u64,
    fee_rate: u64,
) -> SpendRequest {
    SpendRequest {
        witness_script: contract.witness_script().clone(),
        outpoint: funding_outpoint(value),
        network: NETWORK,
        fee_rate,
        signing_key: signer.private_key,
        destination: None,
    }
}
