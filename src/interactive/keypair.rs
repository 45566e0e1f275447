use bitcoin::Network;
use bitcoin_htlc::keys::generate_keypair;

/// Print a fresh WIF key and its bech32 address.
pub fn run(network: Network) {
    let keypair = generate_keypair(network);
    println!("Private Key (WIF): {}", keypair.private_key.to_wif());
    println!("Address (bech32): {}", keypair.address);
}
