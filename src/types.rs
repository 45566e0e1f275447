use bitcoin::address::Address;
use bitcoin::hashes::sha256;
use bitcoin::script::ScriptBuf;
use bitcoin::{Amount, Network, OutPoint, PrivateKey, Txid};

// ============================================================================
// SCRIPT SHAPE
// ============================================================================

/// Which HTLC template a witness script is compiled with.
///
/// The choice is made once, when the contract is created. A script's variant
/// is never guessed from the secret or the hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScriptVariant {
    /// `OP_SIZE 32 OP_EQUALVERIFY` guards the preimage before it is hashed
    #[default]
    SizeChecked,
    /// The preimage is hashed without a size check
    Unchecked,
}

// ============================================================================
// CONTRACT
// ============================================================================

/// One HTLC instance. Immutable once created: the witness script and the
/// funding address are derived from the other fields and cannot be set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapContract {
    pub(crate) recipient_address: Address,
    pub(crate) refund_address: Address,
    pub(crate) secret: Option<[u8; 32]>,
    pub(crate) contract_hash: sha256::Hash,
    pub(crate) expiration: u32,
    pub(crate) network: Network,
    pub(crate) variant: ScriptVariant,
    pub(crate) witness_script: ScriptBuf,
    pub(crate) htlc_address: Address,
}

impl SwapContract {
    pub fn recipient_address(&self) -> &Address {
        &self.recipient_address
    }

    pub fn refund_address(&self) -> &Address {
        &self.refund_address
    }

    /// The preimage, if this party generated it.
    pub fn secret(&self) -> Option<&[u8; 32]> {
        self.secret.as_ref()
    }

    pub fn contract_hash(&self) -> sha256::Hash {
        self.contract_hash
    }

    /// UNIX timestamp after which the refund path is spendable
    pub fn expiration(&self) -> u32 {
        self.expiration
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn variant(&self) -> ScriptVariant {
        self.variant
    }

    pub fn witness_script(&self) -> &ScriptBuf {
        &self.witness_script
    }

    /// P2WSH address to fund
    pub fn htlc_address(&self) -> &Address {
        &self.htlc_address
    }
}

// ============================================================================
// SPENDING
// ============================================================================

/// The funded HTLC output being spent. `value` is trusted as given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FundingOutpoint {
    pub txid: Txid,
    pub vout: u32,
    pub value: Amount,
}

impl FundingOutpoint {
    pub fn outpoint(&self) -> OutPoint {
        OutPoint {
            txid: self.txid,
            vout: self.vout,
        }
    }
}

/// Everything needed to sign one spend of a funded HTLC. Consumed by the
/// builder; never kept around afterwards.
#[derive(Debug, Clone)]
pub struct SpendRequest {
    pub witness_script: ScriptBuf,
    pub outpoint: FundingOutpoint,
    pub network: Network,
    /// Sats per virtual byte
    pub fee_rate: u64,
    /// Recipient key for redeem, refund key for refund
    pub signing_key: PrivateKey,
    /// Where the funds go. Defaults to the P2WPKH address of the path's pubkey hash.
    pub destination: Option<Address>,
}

// ============================================================================
// KEYS
// ============================================================================

/// A fresh single-sig key and its bech32 address.
#[derive(Debug, Clone)]
pub struct KeyPair {
    pub private_key: PrivateKey,
    pub address: Address,
}
