//! Error types for HTLC construction and spending
//!
//! Every failure is surfaced to the caller as-is and nothing here is retried.

use thiserror::Error;

/// Errors raised while building a contract or a spending transaction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum HtlcError {
    /// The compiled or supplied witness script does not have the template's shape
    #[error("Script construction error: {0}")]
    ScriptConstruction(String),

    /// Address could not be decoded for this network or carries no pubkey hash
    #[error("Address error: {0}")]
    Address(String),

    /// Invalid caller-supplied parameter such as the expiration or hash
    #[error("Parameter error: {0}")]
    Parameter(String),

    /// Private key is unusable or does not match the spending path
    #[error("Key error: {0}")]
    Key(String),

    /// Fee leaves nothing to spend
    #[error("Fee error: fee {fee} sat leaves nothing of input value {value} sat")]
    Fee {
        /// Value held at the funding outpoint
        value: u64,
        /// Fee computed from the fee rate and the size estimate
        fee: u64,
    },

    /// Fee rate times the size estimate does not fit in a sat amount
    #[error("Fee error: {fee_rate} sat/vB over {vsize} vB overflows")]
    FeeOverflow { fee_rate: u64, vsize: u64 },

    /// The OS entropy source failed while drawing a secret
    #[error("Randomness error: {0}")]
    Randomness(String),
}

/// Result type for HTLC operations
pub type Result<T> = std::result::Result<T, HtlcError>;

/// Errors from the local contract backup file
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A line in the store decoded as JSON but not as a contract
    #[error("Corrupt store record for {address}: {source}")]
    Corrupt {
        address: String,
        #[source]
        source: HtlcError,
    },
}

/// Errors from the bitcoind JSON-RPC client
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("RPC transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The node answered with a JSON-RPC error object
    #[error("RPC error {code}: {message}")]
    Node { code: i64, message: String },

    #[error("Malformed RPC response: {0}")]
    Malformed(String),

    #[error("Output {vout} not found in transaction {txid}")]
    MissingOutput { txid: String, vout: u32 },

    #[error("RPC request gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fee_error_display() {
        let err = HtlcError::Fee { value: 1_000, fee: 1_000 };
        assert_eq!(
            err.to_string(),
            "Fee error: fee 1000 sat leaves nothing of input value 1000 sat"
        );
    }

    #[test]
    fn script_construction_display() {
        let err = HtlcError::ScriptConstruction("length 12".to_string());
        assert_eq!(err.to_string(), "Script construction error: length 12");
    }

    #[test]
    fn fee_overflow_display() {
        let err = HtlcError::FeeOverflow { fee_rate: u64::MAX, vsize: 143 };
        assert_eq!(
            err.to_string(),
            format!("Fee error: {} sat/vB over 143 vB overflows", u64::MAX)
        );
    }
}
