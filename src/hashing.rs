use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// SHA256 of arbitrary bytes.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// RIPEMD160(SHA256(data)), the hash behind every P2PKH/P2WPKH address.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let mut ripemd_hasher = Ripemd160::new();
    ripemd_hasher.update(sha256(data));
    ripemd_hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_of_empty_input() {
        assert_eq!(
            hex::encode(sha256(&[])),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn hash160_matches_bitcoin_hashes() {
        use bitcoin::hashes::{hash160 as reference, Hash};
        let data = b"ProgrammingLightning";
        assert_eq!(hash160(data), reference::Hash::hash(data).to_byte_array());
    }
}
