//! BIP-199 hash time locked contracts.
//!
//! Compile the HTLC witness script, derive its P2WSH funding address, and
//! build signed redeem (secret) or refund (timeout) spends of a funded output.

pub mod config;
pub mod errors;
pub mod hashing;
pub mod internal;
pub mod keys;
pub mod scripts;
pub mod signing;
pub mod transactions;
pub mod types;
pub mod workflows;

#[cfg(test)]
mod tests;

// Re-export main types for convenience
pub use config::HtlcConfig;
pub use errors::{HtlcError, Result, RpcError, StoreError};
pub use internal::convert::ContractRecord;
pub use internal::store::ContractStore;
pub use scripts::{compile_htlc_script, HtlcScript, ScriptBranch};
pub use transactions::{build_redeem, build_refund, funding_script_pubkey};
pub use types::*;
pub use workflows::{ContractFactory, ContractParams};
