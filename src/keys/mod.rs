pub mod address;
pub mod derivation;

// Re-export commonly used items
pub use address::{decode_pubkey_hash, p2wpkh_address_for_hash, parse_address, pubkey_hash_of};
pub use derivation::{generate_keypair, import_wif, keypair_from_secret, signing_pubkey_hash};
