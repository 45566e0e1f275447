use bitcoin::blockdata::opcodes::all as opcodes;
use bitcoin::blockdata::opcodes::Opcode;
use bitcoin::hashes::{sha256, Hash};
use bitcoin::locktime::absolute::{LockTime, LOCK_TIME_THRESHOLD};
use bitcoin::script::{Builder, Instruction, Script, ScriptBuf};
use bitcoin::{Address, Network, PubkeyHash};
use tracing::debug;

use crate::errors::{HtlcError, Result};
use crate::types::ScriptVariant;

/// Required preimage length, checked by `OP_SIZE` in the size-checked template.
pub const PREIMAGE_SIZE: usize = 32;

/// Valid lengths of a size-checked script. The expiration push is 4 bytes
/// below 2^31 and 5 bytes from there up to `u32::MAX`.
pub const SIZE_CHECKED_SCRIPT_LENGTHS: [usize; 2] = [97, 98];

/// Valid lengths of a script without the preimage size check.
pub const UNCHECKED_SCRIPT_LENGTHS: [usize; 2] = [93, 94];

impl ScriptVariant {
    /// The two byte lengths a correctly built script of this variant can have.
    pub fn script_lengths(self) -> [usize; 2] {
        match self {
            ScriptVariant::SizeChecked => SIZE_CHECKED_SCRIPT_LENGTHS,
            ScriptVariant::Unchecked => UNCHECKED_SCRIPT_LENGTHS,
        }
    }
}

/// One side of the script's `OP_IF`.
///
/// Both branches finish with `OP_DUP OP_HASH160 <pubkey hash>` and share the
/// trailing `OP_EQUALVERIFY OP_CHECKSIG` after `OP_ENDIF`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptBranch {
    /// Preimage revealed, recipient signs (redeem)
    Secret,
    /// Expiration passed, refund key signs (refund)
    Timeout,
}

impl ScriptBranch {
    /// Witness item consumed by `OP_IF` to pick this branch. Segwit requires
    /// exactly `0x01` or empty.
    pub fn selector(self) -> &'static [u8] {
        match self {
            ScriptBranch::Secret => &[0x01],
            ScriptBranch::Timeout => &[],
        }
    }
}

/// The parameters a BIP-199 HTLC witness script is compiled from.
///
/// ```text
/// OP_IF
///     [OP_SIZE 32 OP_EQUALVERIFY]
///     OP_SHA256 <contract_hash> OP_EQUALVERIFY
///     OP_DUP OP_HASH160 <recipient_pubkey_hash>
/// OP_ELSE
///     <expiration> OP_CHECKLOCKTIMEVERIFY OP_DROP
///     OP_DUP OP_HASH160 <refund_pubkey_hash>
/// OP_ENDIF
/// OP_EQUALVERIFY
/// OP_CHECKSIG
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HtlcScript {
    pub recipient_pubkey_hash: PubkeyHash,
    pub refund_pubkey_hash: PubkeyHash,
    pub contract_hash: sha256::Hash,
    pub expiration: u32,
    pub variant: ScriptVariant,
}

impl HtlcScript {
    /// Checks that `expiration` is a UNIX timestamp usable as a transaction locktime.
    pub fn new(
        recipient_pubkey_hash: PubkeyHash,
        refund_pubkey_hash: PubkeyHash,
        contract_hash: sha256::Hash,
        expiration: u64,
        variant: ScriptVariant,
    ) -> Result<Self> {
        let expiration = u32::try_from(expiration).map_err(|_| {
            HtlcError::Parameter(format!("expiration {expiration} does not fit a locktime"))
        })?;
        if expiration < LOCK_TIME_THRESHOLD {
            return Err(HtlcError::Parameter(format!(
                "expiration {expiration} is a block height, expected a UNIX timestamp"
            )));
        }

        Ok(HtlcScript {
            recipient_pubkey_hash,
            refund_pubkey_hash,
            contract_hash,
            expiration,
            variant,
        })
    }

    /// The pubkey hash whose key must sign to take `branch`.
    pub fn pubkey_hash(&self, branch: ScriptBranch) -> PubkeyHash {
        match branch {
            ScriptBranch::Secret => self.recipient_pubkey_hash,
            ScriptBranch::Timeout => self.refund_pubkey_hash,
        }
    }

    pub fn lock_time(&self) -> LockTime {
        LockTime::from_consensus(self.expiration)
    }

    /// Compile the witness script and check its length.
    pub fn compile(&self) -> Result<ScriptBuf> {
        let builder = Builder::new().push_opcode(opcodes::OP_IF);
        let builder = self
            .push_branch(builder, ScriptBranch::Secret)
            .push_opcode(opcodes::OP_ELSE);
        let script = self
            .push_branch(builder, ScriptBranch::Timeout)
            .push_opcode(opcodes::OP_ENDIF)
            .push_opcode(opcodes::OP_EQUALVERIFY)
            .push_opcode(opcodes::OP_CHECKSIG)
            .into_script();

        validate_script_length(&script, self.variant)?;
        debug!(len = script.len(), variant = ?self.variant, "compiled HTLC script");
        Ok(script)
    }

    fn push_branch(&self, builder: Builder, branch: ScriptBranch) -> Builder {
        let builder = match branch {
            ScriptBranch::Secret => {
                let builder = match self.variant {
                    ScriptVariant::SizeChecked => builder
                        .push_opcode(opcodes::OP_SIZE)
                        .push_int(PREIMAGE_SIZE as i64)
                        .push_opcode(opcodes::OP_EQUALVERIFY),
                    ScriptVariant::Unchecked => builder,
                };
                builder
                    .push_opcode(opcodes::OP_SHA256)
                    .push_slice(self.contract_hash.to_byte_array())
                    .push_opcode(opcodes::OP_EQUALVERIFY)
            }
            ScriptBranch::Timeout => builder
                .push_lock_time(self.lock_time())
                .push_opcode(opcodes::OP_CLTV)
                .push_opcode(opcodes::OP_DROP),
        };

        builder
            .push_opcode(opcodes::OP_DUP)
            .push_opcode(opcodes::OP_HASH160)
            .push_slice(self.pubkey_hash(branch).to_byte_array())
    }

    /// Recover the parameters from a witness script.
    ///
    /// The script is recompiled from what was parsed and must come out
    /// byte-identical, so non-minimal pushes or trailing data are rejected.
    pub fn from_script(script: &Script) -> Result<Self> {
        validate_any_script_length(script)?;

        let instructions = script
            .instructions()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| HtlcError::ScriptConstruction(format!("unparsable script: {e}")))?;
        let mut cursor = InstructionCursor {
            instructions: &instructions,
            position: 0,
        };

        cursor.expect_op(opcodes::OP_IF)?;
        let variant = if cursor.peek_op(opcodes::OP_SIZE) {
            cursor.expect_op(opcodes::OP_SIZE)?;
            let size = cursor.expect_push(1)?;
            if size != [PREIMAGE_SIZE as u8] {
                return Err(HtlcError::ScriptConstruction(format!(
                    "preimage size check is {}, expected {PREIMAGE_SIZE}",
                    hex::encode(size)
                )));
            }
            cursor.expect_op(opcodes::OP_EQUALVERIFY)?;
            ScriptVariant::SizeChecked
        } else {
            ScriptVariant::Unchecked
        };

        cursor.expect_op(opcodes::OP_SHA256)?;
        let contract_hash = sha256::Hash::from_byte_array(to_array(cursor.expect_push(32)?)?);
        cursor.expect_op(opcodes::OP_EQUALVERIFY)?;
        cursor.expect_op(opcodes::OP_DUP)?;
        cursor.expect_op(opcodes::OP_HASH160)?;
        let recipient_pubkey_hash = PubkeyHash::from_byte_array(to_array(cursor.expect_push(20)?)?);

        cursor.expect_op(opcodes::OP_ELSE)?;
        let expiration = cursor.next_push()?;
        let expiration = read_script_num(expiration, 5).ok_or_else(|| {
            HtlcError::ScriptConstruction("expiration is not a minimal script number".to_string())
        })?;
        cursor.expect_op(opcodes::OP_CLTV)?;
        cursor.expect_op(opcodes::OP_DROP)?;
        cursor.expect_op(opcodes::OP_DUP)?;
        cursor.expect_op(opcodes::OP_HASH160)?;
        let refund_pubkey_hash = PubkeyHash::from_byte_array(to_array(cursor.expect_push(20)?)?);

        cursor.expect_op(opcodes::OP_ENDIF)?;
        cursor.expect_op(opcodes::OP_EQUALVERIFY)?;
        cursor.expect_op(opcodes::OP_CHECKSIG)?;
        cursor.expect_end()?;

        let expiration = u64::try_from(expiration).map_err(|_| {
            HtlcError::ScriptConstruction(format!("negative expiration {expiration}"))
        })?;
        let htlc = HtlcScript::new(
            recipient_pubkey_hash,
            refund_pubkey_hash,
            contract_hash,
            expiration,
            variant,
        )
        .map_err(|e| HtlcError::ScriptConstruction(e.to_string()))?;

        if htlc.compile()?.as_script() != script {
            return Err(HtlcError::ScriptConstruction(
                "script does not recompile to the same bytes".to_string(),
            ));
        }

        Ok(htlc)
    }

    /// `OP_0 <sha256(witness script)>`, the output the contract is funded with.
    pub fn p2wsh_script_pubkey(&self) -> Result<ScriptBuf> {
        Ok(self.compile()?.to_p2wsh())
    }

    /// The P2WSH funding address.
    pub fn address(&self, network: Network) -> Result<Address> {
        Ok(Address::p2wsh(&self.compile()?, network))
    }
}

/// Compile an HTLC witness script from its raw parameters.
pub fn compile_htlc_script(
    recipient_pubkey_hash: PubkeyHash,
    refund_pubkey_hash: PubkeyHash,
    contract_hash: sha256::Hash,
    expiration: u64,
    variant: ScriptVariant,
) -> Result<ScriptBuf> {
    HtlcScript::new(
        recipient_pubkey_hash,
        refund_pubkey_hash,
        contract_hash,
        expiration,
        variant,
    )?
    .compile()
}

/// Fails closed unless `script` has one of the lengths `variant` allows.
pub fn validate_script_length(script: &Script, variant: ScriptVariant) -> Result<()> {
    if variant.script_lengths().contains(&script.len()) {
        Ok(())
    } else {
        Err(HtlcError::ScriptConstruction(format!(
            "{variant:?} script is {} bytes, expected one of {:?}",
            script.len(),
            variant.script_lengths()
        )))
    }
}

fn validate_any_script_length(script: &Script) -> Result<()> {
    validate_script_length(script, ScriptVariant::SizeChecked)
        .or_else(|_| validate_script_length(script, ScriptVariant::Unchecked))
        .map_err(|_| {
            HtlcError::ScriptConstruction(format!(
                "script is {} bytes, not an HTLC witness script",
                script.len()
            ))
        })
}

/// Decode a minimally encoded script number of at most `max_len` bytes.
fn read_script_num(bytes: &[u8], max_len: usize) -> Option<i64> {
    if bytes.len() > max_len {
        return None;
    }
    let Some((&last, rest)) = bytes.split_last() else {
        return Some(0);
    };
    if last & 0x7f == 0 && rest.last().map_or(true, |prev| prev & 0x80 == 0) {
        return None;
    }

    let mut value: i64 = 0;
    for (i, byte) in bytes.iter().enumerate() {
        value |= i64::from(*byte) << (8 * i);
    }
    if last & 0x80 != 0 {
        value &= !(0x80_i64 << (8 * (bytes.len() - 1)));
        Some(-value)
    } else {
        Some(value)
    }
}

fn to_array<const N: usize>(bytes: &[u8]) -> Result<[u8; N]> {
    bytes
        .try_into()
        .map_err(|_| HtlcError::ScriptConstruction(format!("expected a {N} byte push")))
}

struct InstructionCursor<'a> {
    instructions: &'a [Instruction<'a>],
    position: usize,
}

impl<'a> InstructionCursor<'a> {
    fn next(&mut self) -> Result<Instruction<'a>> {
        let instruction = self
            .instructions
            .get(self.position)
            .copied()
            .ok_or_else(|| HtlcError::ScriptConstruction("script ends early".to_string()))?;
        self.position += 1;
        Ok(instruction)
    }

    fn peek_op(&self, opcode: Opcode) -> bool {
        matches!(self.instructions.get(self.position), Some(Instruction::Op(op)) if *op == opcode)
    }

    fn expect_op(&mut self, opcode: Opcode) -> Result<()> {
        match self.next()? {
            Instruction::Op(op) if op == opcode => Ok(()),
            other => Err(HtlcError::ScriptConstruction(format!(
                "expected {opcode} at instruction {}, found {other:?}",
                self.position - 1
            ))),
        }
    }

    fn next_push(&mut self) -> Result<&'a [u8]> {
        match self.next()? {
            Instruction::PushBytes(bytes) => Ok(bytes.as_bytes()),
            other => Err(HtlcError::ScriptConstruction(format!(
                "expected a push at instruction {}, found {other:?}",
                self.position - 1
            ))),
        }
    }

    fn expect_push(&mut self, len: usize) -> Result<&'a [u8]> {
        let bytes = self.next_push()?;
        if bytes.len() != len {
            return Err(HtlcError::ScriptConstruction(format!(
                "expected a {len} byte push at instruction {}, found {} bytes",
                self.position - 1,
                bytes.len()
            )));
        }
        Ok(bytes)
    }

    fn expect_end(&self) -> Result<()> {
        if self.position == self.instructions.len() {
            Ok(())
        } else {
            Err(HtlcError::ScriptConstruction(
                "trailing data after OP_CHECKSIG".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_numbers_must_be_minimal() {
        assert_eq!(read_script_num(&[0x00, 0xf1, 0x53, 0x65], 5), Some(1_700_000_000));
        assert_eq!(read_script_num(&[0x00, 0x5e, 0xd0, 0xb2, 0x00], 5), Some(3_000_000_000));
        assert_eq!(read_script_num(&[0x81], 5), Some(-1));
        assert_eq!(read_script_num(&[0x20, 0x00], 5), None);
        assert_eq!(read_script_num(&[0x00], 5), None);
        assert_eq!(read_script_num(&[0x01, 0x02, 0x03, 0x04, 0x05, 0x06], 5), None);
    }
}
