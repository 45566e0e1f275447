use bitcoin::hashes::Hash;
use bitcoin::key::CompressedPublicKey;
use bitcoin::locktime::absolute::LockTime;
use bitcoin::script::{Script, ScriptBuf};
use bitcoin::secp256k1::Secp256k1;
use bitcoin::transaction::Version;
use bitcoin::{Address, Amount, Sequence, Transaction, TxIn, TxOut, Witness};
use tracing::{debug, info, instrument};

use crate::config::HtlcConfig;
use crate::errors::{HtlcError, Result};
use crate::hashing::sha256;
use crate::keys::{p2wpkh_address_for_hash, signing_pubkey_hash};
use crate::scripts::{HtlcScript, ScriptBranch};
use crate::signing::{create_redeem_witness, create_refund_witness, sign_transaction_input};
use crate::transactions::fees::{calculate_spend_fee, spend_output_value};
use crate::types::{FundingOutpoint, SpendRequest};

/// `OP_0 <sha256(witness_script)>`: what the funding output must pay to.
///
/// The builder never looks the funding output up; callers that can should
/// compare this against the real output before broadcasting.
pub fn funding_script_pubkey(witness_script: &Script) -> Result<ScriptBuf> {
    HtlcScript::from_script(witness_script)?.p2wsh_script_pubkey()
}

/// Build the unsigned single-input, single-output spend of an HTLC output.
pub fn create_spend_transaction(
    outpoint: &FundingOutpoint,
    destination: &Address,
    output_value: Amount,
    lock_time: LockTime,
    sequence: Sequence,
) -> Transaction {
    let tx_in = TxIn {
        previous_output: outpoint.outpoint(),
        script_sig: ScriptBuf::new(), // Empty for SegWit
        sequence,
        witness: Witness::new(),
    };

    let tx_out = TxOut {
        value: output_value,
        script_pubkey: destination.script_pubkey(),
    };

    Transaction {
        version: Version::TWO,
        lock_time,
        input: vec![tx_in],
        output: vec![tx_out],
    }
}

/// Spend a funded HTLC through the secret branch.
///
/// `secret` must hash to the script's contract hash and the signing key must
/// be the recipient's. Locktime is left at zero.
#[instrument(skip_all, fields(txid = %request.outpoint.txid, vout = request.outpoint.vout))]
pub fn build_redeem(
    config: &HtlcConfig,
    request: SpendRequest,
    secret: [u8; 32],
) -> Result<Transaction> {
    let htlc = HtlcScript::from_script(&request.witness_script)?;
    if sha256(&secret) != htlc.contract_hash.to_byte_array() {
        return Err(HtlcError::Parameter(
            "preimage does not hash to the contract hash".to_string(),
        ));
    }

    build_spend(config, request, &htlc, ScriptBranch::Secret, Some(secret))
}

/// Spend a funded HTLC through the timeout branch.
///
/// Locktime is set to the contract's expiration and the input sequence to
/// `0xfffffffe` so `OP_CHECKLOCKTIMEVERIFY` is enforced. Nodes will not
/// accept the result before the expiration has passed.
#[instrument(skip_all, fields(txid = %request.outpoint.txid, vout = request.outpoint.vout))]
pub fn build_refund(config: &HtlcConfig, request: SpendRequest) -> Result<Transaction> {
    let htlc = HtlcScript::from_script(&request.witness_script)?;
    build_spend(config, request, &htlc, ScriptBranch::Timeout, None)
}

fn build_spend(
    config: &HtlcConfig,
    request: SpendRequest,
    htlc: &HtlcScript,
    branch: ScriptBranch,
    secret: Option<[u8; 32]>,
) -> Result<Transaction> {
    let secp = Secp256k1::new();
    let expected_pubkey_hash = htlc.pubkey_hash(branch);

    if bitcoin::NetworkKind::from(request.network) != request.signing_key.network {
        return Err(HtlcError::Key(format!(
            "signing key is not for {}",
            request.network
        )));
    }
    if signing_pubkey_hash(&request.signing_key)? != expected_pubkey_hash {
        return Err(HtlcError::Key(format!(
            "signing key does not match the {branch:?} branch pubkey hash {expected_pubkey_hash}"
        )));
    }
    let pubkey = CompressedPublicKey::from_private_key(&secp, &request.signing_key)
        .map_err(|e| HtlcError::Key(e.to_string()))?;

    let destination = match request.destination {
        Some(destination) if destination.as_unchecked().is_valid_for_network(request.network) => {
            destination
        }
        Some(destination) => {
            return Err(HtlcError::Address(format!(
                "destination {destination} is not valid for {}",
                request.network
            )))
        }
        None => p2wpkh_address_for_hash(&expected_pubkey_hash, request.network)?,
    };

    let value = request.outpoint.value;
    let fee = calculate_spend_fee(request.fee_rate, config.spend_vsize)?;
    let output_value = spend_output_value(value, fee)?;

    let (lock_time, sequence) = match branch {
        ScriptBranch::Secret => (LockTime::ZERO, Sequence::MAX),
        ScriptBranch::Timeout => (htlc.lock_time(), Sequence::ENABLE_LOCKTIME_NO_RBF),
    };

    let mut tx = create_spend_transaction(
        &request.outpoint,
        &destination,
        output_value,
        lock_time,
        sequence,
    );

    let signature = sign_transaction_input(
        &tx,
        0,
        &request.witness_script,
        value,
        &request.signing_key.inner,
        &secp,
    )?;

    let witness = match (branch, secret) {
        (ScriptBranch::Secret, Some(secret)) => {
            create_redeem_witness(&signature, &pubkey, &secret, &request.witness_script)
        }
        (ScriptBranch::Secret, None) => {
            return Err(HtlcError::Parameter(
                "redeem requires the preimage".to_string(),
            ))
        }
        (ScriptBranch::Timeout, _) => {
            create_refund_witness(&signature, &pubkey, &request.witness_script)
        }
    };
    tx.input[0].witness = witness;

    debug!(
        estimated_vsize = config.spend_vsize,
        actual_vsize = tx.vsize(),
        "spend size"
    );
    info!(
        spend_txid = %tx.compute_txid(),
        branch = ?branch,
        fee = fee.to_sat(),
        output = output_value.to_sat(),
        %destination,
        "built HTLC spend"
    );

    Ok(tx)
}
