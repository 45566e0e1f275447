use anyhow::{Context, Result};
use bitcoin::Network;
use bitcoin_htlc::{ContractFactory, ContractParams, ContractStore, HtlcConfig};
use tracing::warn;

/// Create an HTLC, print its record and append it to the backup store.
pub fn run(
    network: Network,
    config: HtlcConfig,
    recipient_address: String,
    refund_address: String,
    hash: Option<String>,
    expiration: Option<String>,
    store: String,
) -> Result<()> {
    let params = ContractParams {
        recipient_address,
        refund_address,
        network,
        contract_hash: hash,
        expiration,
    };
    let contract = ContractFactory::new(config)
        .create(&params)
        .context("creating HTLC")?;

    println!("{}", contract.to_json()?);

    // Printed above already; a failed backup only warns.
    let store = ContractStore::open(store);
    if let Err(e) = store.append(&contract) {
        warn!(path = %store.path().display(), error = %e, "could not back up contract");
    }
    Ok(())
}
