use bitcoin::address::{AddressType, NetworkUnchecked};
use bitcoin::hashes::Hash;
use bitcoin::script::ScriptBuf;
use bitcoin::{Address, Network, PubkeyHash, WPubkeyHash};

use crate::errors::{HtlcError, Result};

/// Parse address text and check it belongs to `network`.
pub fn parse_address(address: &str, network: Network) -> Result<Address> {
    let unchecked: Address<NetworkUnchecked> = address
        .trim()
        .parse()
        .map_err(|e| HtlcError::Address(format!("{address}: {e}")))?;

    unchecked
        .require_network(network)
        .map_err(|e| HtlcError::Address(format!("{address}: {e}")))
}

/// The 20 byte pubkey hash an address pays to.
///
/// Accepts P2WPKH (bech32) and P2PKH (base58). Both commit to
/// HASH160(pubkey), which is what the HTLC script checks against.
pub fn pubkey_hash_of(address: &Address) -> Result<PubkeyHash> {
    match address.address_type() {
        Some(AddressType::P2wpkh) => {
            let program = address
                .witness_program()
                .ok_or_else(|| HtlcError::Address(format!("{address}: missing witness program")))?;
            let bytes: [u8; 20] = program
                .program()
                .as_bytes()
                .try_into()
                .map_err(|_| HtlcError::Address(format!("{address}: program is not 20 bytes")))?;
            Ok(PubkeyHash::from_byte_array(bytes))
        }
        Some(AddressType::P2pkh) => address
            .pubkey_hash()
            .ok_or_else(|| HtlcError::Address(format!("{address}: missing pubkey hash"))),
        other => Err(HtlcError::Address(format!(
            "{address}: expected a P2WPKH or P2PKH address, got {other:?}"
        ))),
    }
}

/// Decode address text straight to its pubkey hash.
pub fn decode_pubkey_hash(address: &str, network: Network) -> Result<PubkeyHash> {
    pubkey_hash_of(&parse_address(address, network)?)
}

/// The P2WPKH address paying to `pubkey_hash`.
pub fn p2wpkh_address_for_hash(pubkey_hash: &PubkeyHash, network: Network) -> Result<Address> {
    let wpubkey_hash = WPubkeyHash::from_byte_array(pubkey_hash.to_byte_array());
    let script_pubkey = ScriptBuf::new_p2wpkh(&wpubkey_hash);
    Address::from_script(&script_pubkey, network)
        .map_err(|e| HtlcError::Address(e.to_string()))
}
