use anyhow::{Context, Result};
use bitcoin::Network;
use bitcoin_htlc::hashing::{hash160, sha256};
use bitcoin_htlc::types::ScriptVariant;
use bitcoin_htlc::HtlcConfig;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod interactive;

use interactive::spend::{RpcArgs, SpendArgs};

// ============================================================================
// CLI DEFINITION
// ============================================================================

/// Main CLI structure
#[derive(Parser)]
#[command(name = "bitcoin-htlc")]
#[command(version)]
#[command(about = "BIP-199 and atomic swap helpers", long_about = None)]
struct Cli {
    #[arg(long, value_enum, global = true, default_value_t = NetworkArg::Bitcoin)]
    network: NetworkArg,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum NetworkArg {
    Bitcoin,
    Testnet,
    Signet,
    Regtest,
}

impl From<NetworkArg> for Network {
    fn from(network: NetworkArg) -> Self {
        match network {
            NetworkArg::Bitcoin => Network::Bitcoin,
            NetworkArg::Testnet => Network::Testnet,
            NetworkArg::Signet => Network::Signet,
            NetworkArg::Regtest => Network::Regtest,
        }
    }
}

/// CLI Subcommands
#[derive(Subcommand)]
enum Commands {
    /// Create a keypair and its bech32 address
    #[command(name = "createkeypair")]
    CreateKeypair,

    /// Create an HTLC and back it up to the store
    #[command(name = "createhtlc")]
    CreateHtlc {
        /// bech32 address of recipient
        recipient_address: String,
        /// bech32 address for refund if HTLC expires
        refund_address: String,
        /// Custom hash to lock the HTLC. Hash and preimage are generated if not provided.
        #[arg(long)]
        hash: Option<String>,
        /// UNIX timestamp to expire the HTLC. Defaults to 1 day ahead of current time.
        #[arg(long)]
        expiration: Option<String>,
        /// Leave out the OP_SIZE preimage length check
        #[arg(long)]
        no_size_check: bool,
        #[arg(long, env = "HTLC_STORE", default_value = "htlc-backup.jsonl")]
        store: String,
    },

    /// Redeem an HTLC with its preimage
    #[command(name = "redeemhtlc")]
    RedeemHtlc {
        #[command(flatten)]
        spend: SpendArgs,
        /// Preimage to unlock the HTLC, hex
        #[arg(long)]
        preimage: String,
        /// Private key of recipient address in WIF format
        #[arg(long)]
        recipient_wif: String,
        #[command(flatten)]
        rpc: RpcArgs,
    },

    /// Refund an expired HTLC
    #[command(name = "refundhtlc")]
    RefundHtlc {
        #[command(flatten)]
        spend: SpendArgs,
        /// Private key of refund address in WIF format
        #[arg(long)]
        refund_wif: String,
        #[command(flatten)]
        rpc: RpcArgs,
    },

    /// Look up a stored contract by its funding address
    Show {
        htlc_address: String,
        #[arg(long, env = "HTLC_STORE", default_value = "htlc-backup.jsonl")]
        store: String,
    },

    /// Calculate SHA256 hash of hex input
    Sha256 {
        #[arg(short = 'd', long, help = "Input to hash (hex)")]
        input: String,
    },

    /// Calculate RIPEMD160(SHA256()) hash of hex input
    Hash160 {
        #[arg(short = 'd', long, help = "Input to hash (hex)")]
        input: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let network = Network::from(cli.network);

    match cli.command {
        Commands::CreateKeypair => interactive::keypair::run(network),
        Commands::CreateHtlc {
            recipient_address,
            refund_address,
            hash,
            expiration,
            no_size_check,
            store,
        } => {
            let variant = if no_size_check {
                ScriptVariant::Unchecked
            } else {
                ScriptVariant::SizeChecked
            };
            let config = HtlcConfig::default().with_script_variant(variant);
            interactive::create::run(
                network,
                config,
                recipient_address,
                refund_address,
                hash,
                expiration,
                store,
            )?;
        }
        Commands::RedeemHtlc {
            spend,
            preimage,
            recipient_wif,
            rpc,
        } => {
            interactive::spend::run_redeem(network, spend, rpc, preimage, recipient_wif)
                .await
                .context("redeem failed")?;
        }
        Commands::RefundHtlc {
            spend,
            refund_wif,
            rpc,
        } => {
            interactive::spend::run_refund(network, spend, rpc, refund_wif)
                .await
                .context("refund failed")?;
        }
        Commands::Show {
            htlc_address,
            store,
        } => interactive::show::run(htlc_address, store)?,
        Commands::Sha256 { input } => {
            let data = hex::decode(input).context("input is not hex")?;
            println!("SHA256 Hash: {}", hex::encode(sha256(&data)));
        }
        Commands::Hash160 { input } => {
            let data = hex::decode(input).context("input is not hex")?;
            println!("RIPEMD160(SHA256()) Hash: {}", hex::encode(hash160(&data)));
        }
    }

    Ok(())
}
