use anyhow::{Context, Result};
use bitcoin_htlc::ContractStore;

/// Print the stored record for an HTLC address, if there is one.
pub fn run(htlc_address: String, store: String) -> Result<()> {
    let store = ContractStore::open(store);
    match store
        .find(&htlc_address)
        .with_context(|| format!("reading {}", store.path().display()))?
    {
        Some(contract) => println!("{}", contract.to_json()?),
        None => println!("No contract stored for {htlc_address}"),
    }
    Ok(())
}
