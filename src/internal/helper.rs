use std::str::FromStr;

use bitcoin::script::ScriptBuf;
use bitcoin::Txid;

use crate::errors::{HtlcError, Result};

/// Parse a txid as printed by explorers and bitcoind (byte-reversed hex).
pub fn parse_txid(txid: &str) -> Result<Txid> {
    Txid::from_str(txid.trim())
        .map_err(|e| HtlcError::Parameter(format!("invalid txid {txid:?}: {e}")))
}

/// Parse a hex witness script. Shape checks happen in the script builder.
pub fn parse_witness_script(script_hex: &str) -> Result<ScriptBuf> {
    let bytes = hex::decode(script_hex.trim())
        .map_err(|e| HtlcError::ScriptConstruction(format!("witness script is not hex: {e}")))?;
    Ok(ScriptBuf::from_bytes(bytes))
}
