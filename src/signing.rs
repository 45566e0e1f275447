use bitcoin::hashes::Hash;
use bitcoin::key::CompressedPublicKey;
use bitcoin::script::Script;
use bitcoin::secp256k1::{ecdsa, All, Message, Secp256k1, SecretKey};
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::{Amount, Transaction, Witness};

use crate::errors::{HtlcError, Result};
use crate::scripts::ScriptBranch;

// ============================================================================
// TRANSACTION SIGNING & VERIFICATION
// ============================================================================

/// Sign a P2WSH input with SIGHASH_ALL.
///
/// Returns the DER signature with the sighash byte appended, ready to go on
/// the witness stack.
pub fn sign_transaction_input(
    tx: &Transaction,
    input_index: usize,
    witness_script: &Script,
    amount: Amount,
    secret_key: &SecretKey,
    secp_ctx: &Secp256k1<All>,
) -> Result<Vec<u8>> {
    let message = p2wsh_message(tx, input_index, witness_script, amount)?;
    let sig = secp_ctx.sign_ecdsa(&message, secret_key);

    let mut sig_bytes = sig.serialize_der().to_vec();
    sig_bytes.push(EcdsaSighashType::All as u8);
    Ok(sig_bytes)
}

/// Verify a SIGHASH_ALL signature produced by [`sign_transaction_input`].
pub fn verify_signature(
    tx: &Transaction,
    input_index: usize,
    witness_script: &Script,
    amount: Amount,
    signature: &[u8],
    pubkey: &CompressedPublicKey,
    secp_ctx: &Secp256k1<All>,
) -> Result<bool> {
    let message = p2wsh_message(tx, input_index, witness_script, amount)?;

    // Remove sighash type byte
    let Some((_, der)) = signature.split_last() else {
        return Ok(false);
    };
    let sig = ecdsa::Signature::from_der(der)
        .map_err(|e| HtlcError::Key(format!("invalid signature encoding: {e}")))?;

    Ok(secp_ctx.verify_ecdsa(&message, &sig, &pubkey.0).is_ok())
}

fn p2wsh_message(
    tx: &Transaction,
    input_index: usize,
    witness_script: &Script,
    amount: Amount,
) -> Result<Message> {
    let sighash = SighashCache::new(tx)
        .p2wsh_signature_hash(input_index, witness_script, amount, EcdsaSighashType::All)
        .map_err(|e| HtlcError::Key(format!("cannot compute sighash: {e}")))?;

    Ok(Message::from_digest(sighash.to_byte_array()))
}

// ============================================================================
// WITNESS ASSEMBLY
// ============================================================================

/// Witness for the secret branch: `[sig, pubkey, secret, 0x01, witness_script]`
pub fn create_redeem_witness(
    signature: &[u8],
    pubkey: &CompressedPublicKey,
    secret: &[u8],
    witness_script: &Script,
) -> Witness {
    Witness::from_slice(&[
        signature,
        &pubkey.to_bytes()[..],
        secret,
        ScriptBranch::Secret.selector(),
        witness_script.as_bytes(),
    ])
}

/// Witness for the timeout branch: `[sig, pubkey, <empty>, witness_script]`
pub fn create_refund_witness(
    signature: &[u8],
    pubkey: &CompressedPublicKey,
    witness_script: &Script,
) -> Witness {
    Witness::from_slice(&[
        signature,
        &pubkey.to_bytes()[..],
        ScriptBranch::Timeout.selector(),
        witness_script.as_bytes(),
    ])
}
