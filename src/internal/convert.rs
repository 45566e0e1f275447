use std::convert::TryFrom;

use bitcoin::script::ScriptBuf;
use bitcoin::Network;
use serde::{Deserialize, Serialize};

use crate::errors::{HtlcError, Result};
use crate::keys::parse_address;
use crate::scripts::HtlcScript;
use crate::types::SwapContract;
use crate::workflows::{assemble_contract, parse_contract_hash, parse_preimage};

/// A contract as exchanged with counterparties and written to the backup
/// store. Hex strings for byte fields, an empty preimage when unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractRecord {
    pub recipient_address: String,
    pub refund_address: String,
    pub preimage: String,
    pub contract_hash: String,
    pub expiration: u32,
    pub network: Network,
    pub witness_script: String,
    pub htlc_address: String,
}

impl From<&SwapContract> for ContractRecord {
    fn from(contract: &SwapContract) -> Self {
        ContractRecord {
            recipient_address: contract.recipient_address().to_string(),
            refund_address: contract.refund_address().to_string(),
            preimage: contract.secret().map(hex::encode).unwrap_or_default(),
            contract_hash: contract.contract_hash().to_string(),
            expiration: contract.expiration(),
            network: contract.network(),
            witness_script: hex::encode(contract.witness_script().as_bytes()),
            htlc_address: contract.htlc_address().to_string(),
        }
    }
}

/// Rebuild a contract from a record, re-deriving the script and address and
/// rejecting the record if anything it states disagrees with them.
impl TryFrom<ContractRecord> for SwapContract {
    type Error = HtlcError;

    fn try_from(record: ContractRecord) -> Result<Self> {
        let network = record.network;
        let recipient_address = parse_address(&record.recipient_address, network)?;
        let refund_address = parse_address(&record.refund_address, network)?;

        let script_bytes = hex::decode(&record.witness_script).map_err(|e| {
            HtlcError::ScriptConstruction(format!("witness script is not hex: {e}"))
        })?;
        let htlc = HtlcScript::from_script(&ScriptBuf::from_bytes(script_bytes))?;

        if parse_contract_hash(&record.contract_hash)? != htlc.contract_hash {
            return Err(HtlcError::Parameter(
                "contract hash does not match the witness script".to_string(),
            ));
        }
        if record.expiration != htlc.expiration {
            return Err(HtlcError::Parameter(
                "expiration does not match the witness script".to_string(),
            ));
        }

        let secret = if record.preimage.is_empty() {
            None
        } else {
            Some(parse_preimage(&record.preimage)?)
        };

        let contract =
            assemble_contract(recipient_address, refund_address, secret, &htlc, network)?;
        if contract.htlc_address().to_string() != record.htlc_address {
            return Err(HtlcError::Address(format!(
                "recorded address {} does not match derived address {}",
                record.htlc_address,
                contract.htlc_address()
            )));
        }

        Ok(contract)
    }
}

impl SwapContract {
    /// Pretty JSON in the record shape.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&ContractRecord::from(self))
    }
}
