use bitcoin::key::CompressedPublicKey;
use bitcoin::secp256k1::{rand, Secp256k1, SecretKey};
use bitcoin::{Address, Network, NetworkKind, PrivateKey, PubkeyHash};

use crate::errors::{HtlcError, Result};
use crate::types::KeyPair;

/// Generate a random key and its P2WPKH address.
pub fn generate_keypair(network: Network) -> KeyPair {
    let secp = Secp256k1::new();
    let (secret_key, _) = secp.generate_keypair(&mut rand::thread_rng());
    build_keypair(&secp, secret_key, network)
}

/// Build a keypair from known secret bytes.
pub fn keypair_from_secret(secret: [u8; 32], network: Network) -> Result<KeyPair> {
    let secp = Secp256k1::new();
    let secret_key = SecretKey::from_slice(&secret)
        .map_err(|e| HtlcError::Key(format!("invalid secret key: {e}")))?;
    Ok(build_keypair(&secp, secret_key, network))
}

fn build_keypair(
    secp: &Secp256k1<bitcoin::secp256k1::All>,
    secret_key: SecretKey,
    network: Network,
) -> KeyPair {
    let private_key = PrivateKey::new(secret_key, network);
    let pubkey = CompressedPublicKey(secret_key.public_key(secp));
    let address = Address::p2wpkh(&pubkey, network);

    KeyPair {
        private_key,
        address,
    }
}

/// Parse a WIF private key and check it belongs to `network`.
///
/// Only compressed keys are accepted: the HTLC pays to the hash of a
/// compressed public key, same as a P2WPKH address.
pub fn import_wif(wif: &str, network: Network) -> Result<PrivateKey> {
    let key = PrivateKey::from_wif(wif.trim())
        .map_err(|e| HtlcError::Key(format!("invalid WIF: {e}")))?;

    if key.network != NetworkKind::from(network) {
        return Err(HtlcError::Key(format!(
            "WIF key is for {:?}, expected {:?}",
            key.network,
            NetworkKind::from(network)
        )));
    }
    if !key.compressed {
        return Err(HtlcError::Key("uncompressed keys are not supported".to_string()));
    }

    Ok(key)
}

/// HASH160 of the key's compressed public key, as committed to in the script.
pub fn signing_pubkey_hash(key: &PrivateKey) -> Result<PubkeyHash> {
    let secp = Secp256k1::new();
    let pubkey = CompressedPublicKey::from_private_key(&secp, key)
        .map_err(|e| HtlcError::Key(e.to_string()))?;
    Ok(pubkey.pubkey_hash())
}
