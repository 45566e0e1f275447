use anyhow::{bail, Context, Result};
use bitcoin::consensus::encode::serialize_hex;
use bitcoin::{Amount, Network, PrivateKey};
use bitcoin_htlc::config::DEFAULT_SPEND_VSIZE;
use bitcoin_htlc::internal::bitcoind_client::{
    BitcoindClient, DEFAULT_RPC_ATTEMPTS, DEFAULT_RPC_BACKOFF, DEFAULT_RPC_TIMEOUT,
};
use bitcoin_htlc::internal::helper::{parse_txid, parse_witness_script};
use bitcoin_htlc::keys::{import_wif, parse_address};
use bitcoin_htlc::workflows::parse_preimage;
use bitcoin_htlc::{
    build_redeem, build_refund, funding_script_pubkey, FundingOutpoint, HtlcConfig, SpendRequest,
};
use clap::Args;
use tracing::warn;

/// Arguments shared by the redeem and refund commands.
#[derive(Args, Debug)]
pub struct SpendArgs {
    /// Transaction hash with the HTLC output you want to unlock
    pub txid: String,
    /// Index of the output you want to unlock in <txid>
    pub vout: u32,
    /// Witness script for HTLC in hex format
    #[arg(long)]
    pub witness_script: String,
    /// Fee rate in sat/vB
    #[arg(long)]
    pub fee_rate: u64,
    /// Value of the HTLC output in sats. Looked up over RPC when omitted.
    #[arg(long)]
    pub value: Option<u64>,
    /// Pay here instead of the key's own P2WPKH address
    #[arg(long)]
    pub destination: Option<String>,
    /// Virtual size the fee rate is multiplied by
    #[arg(long, default_value_t = DEFAULT_SPEND_VSIZE)]
    pub vsize: u64,
}

/// bitcoind connection, only needed when `--value` is not given.
#[derive(Args, Debug)]
pub struct RpcArgs {
    #[arg(long, env = "BITCOIND_RPC_URL")]
    pub rpc_url: Option<String>,
    #[arg(long, env = "BITCOIND_RPC_USER")]
    pub rpc_user: Option<String>,
    #[arg(long, env = "BITCOIND_RPC_PASSWORD", hide_env_values = true)]
    pub rpc_password: Option<String>,
    /// Attempts per RPC call before giving up
    #[arg(long, default_value_t = DEFAULT_RPC_ATTEMPTS)]
    pub rpc_attempts: u32,
}

pub async fn run_redeem(
    network: Network,
    args: SpendArgs,
    rpc: RpcArgs,
    preimage: String,
    recipient_wif: String,
) -> Result<()> {
    let secret = parse_preimage(&preimage)?;
    let key = import_wif(&recipient_wif, network).context("recipient key")?;
    let config = HtlcConfig::default().with_spend_vsize(args.vsize);

    let request = spend_request(network, args, rpc, key).await?;
    let tx = build_redeem(&config, request, secret)?;
    println!("{}", serialize_hex(&tx));
    Ok(())
}

pub async fn run_refund(
    network: Network,
    args: SpendArgs,
    rpc: RpcArgs,
    refund_wif: String,
) -> Result<()> {
    let key = import_wif(&refund_wif, network).context("refund key")?;
    let config = HtlcConfig::default().with_spend_vsize(args.vsize);

    let request = spend_request(network, args, rpc, key).await?;
    let tx = build_refund(&config, request)?;
    println!("{}", serialize_hex(&tx));
    Ok(())
}

async fn spend_request(
    network: Network,
    args: SpendArgs,
    rpc: RpcArgs,
    signing_key: PrivateKey,
) -> Result<SpendRequest> {
    let txid = parse_txid(&args.txid)?;
    let witness_script = parse_witness_script(&args.witness_script)?;
    let destination = args
        .destination
        .as_deref()
        .map(|address| parse_address(address, network))
        .transpose()?;

    let value = match args.value {
        Some(value) => Amount::from_sat(value),
        None => {
            let Some(rpc_url) = rpc.rpc_url else {
                bail!("--value is required when no --rpc-url is configured");
            };
            let client =
                BitcoindClient::new(rpc_url, rpc.rpc_user, rpc.rpc_password, DEFAULT_RPC_TIMEOUT)?
                    .with_retry(rpc.rpc_attempts, DEFAULT_RPC_BACKOFF);
            let output = client
                .get_funding_output(&txid, args.vout)
                .await
                .context("looking up funding output")?;

            let expected = funding_script_pubkey(&witness_script)?;
            if output.script_pubkey != expected {
                warn!(
                    found = %output.script_pubkey,
                    expected = %expected,
                    "funding output does not pay to the witness script"
                );
                bail!("{}:{} does not pay to this HTLC", txid, args.vout);
            }
            output.value
        }
    };

    Ok(SpendRequest {
        witness_script,
        outpoint: FundingOutpoint {
            txid,
            vout: args.vout,
            value,
        },
        network,
        fee_rate: args.fee_rate,
        signing_key,
        destination,
    })
}
