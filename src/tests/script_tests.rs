use bitcoin::hashes::{sha256, Hash};
use bitcoin::script::ScriptBuf;
use bitcoin::{Address, PubkeyHash};

use crate::errors::HtlcError;
use crate::hashing;
use crate::scripts::*;
use crate::types::ScriptVariant;

fn recipient_hash() -> PubkeyHash {
    PubkeyHash::from_byte_array([0x11; 20])
}

fn refund_hash() -> PubkeyHash {
    PubkeyHash::from_byte_array([0x22; 20])
}

fn contract_hash() -> sha256::Hash {
    sha256::Hash::from_byte_array(hashing::sha256(b"funstuff"))
}

fn htlc(expiration: u64, variant: ScriptVariant) -> HtlcScript {
    HtlcScript::new(recipient_hash(), refund_hash(), contract_hash(), expiration, variant).unwrap()
}

#[test]
fn test_size_checked_script_bytes() {
    println!("\n=== Testing HTLC Script Template ===\n");

    let script = htlc(1_700_000_000, ScriptVariant::SizeChecked).compile().unwrap();

    let expected_hex = format!(
        "63{}{}a820{}8876a914{}67{}b17576a914{}6888ac",
        "82", // OP_SIZE
        "012088", // <32> OP_EQUALVERIFY
        hex::encode(contract_hash().to_byte_array()),
        "11".repeat(20),
        "0400f15365", // <1700000000>
        "22".repeat(20),
    );

    println!("Expected script: {}", expected_hex);
    println!("Actual script:   {}\n", hex::encode(script.as_bytes()));

    assert_eq!(
        hex::encode(script.as_bytes()),
        expected_hex,
        "Compiled script does not follow the BIP-199 template"
    );
    assert_eq!(script.len(), 97);
}

#[test]
fn test_unchecked_script_omits_size_check() {
    let checked = htlc(1_700_000_000, ScriptVariant::SizeChecked).compile().unwrap();
    let unchecked = htlc(1_700_000_000, ScriptVariant::Unchecked).compile().unwrap();

    assert_eq!(unchecked.len(), 93);
    assert_eq!(
        &checked.as_bytes()[..1],
        &unchecked.as_bytes()[..1],
        "Both variants start with OP_IF"
    );
    assert_eq!(
        &checked.as_bytes()[5..],
        &unchecked.as_bytes()[1..],
        "Unchecked variant should only drop OP_SIZE <32> OP_EQUALVERIFY"
    );
}

#[test]
fn test_script_lengths_follow_expiration_width() {
    // At and above 2^31 the expiration needs a fifth byte to stay positive.
    let cases = [
        (ScriptVariant::SizeChecked, 2_147_483_647u64, 97usize),
        (ScriptVariant::SizeChecked, 2_147_483_648, 98),
        (ScriptVariant::SizeChecked, u32::MAX as u64, 98),
        (ScriptVariant::Unchecked, 500_000_000, 93),
        (ScriptVariant::Unchecked, 3_000_000_000, 94),
    ];

    for (variant, expiration, expected_len) in cases {
        let script = htlc(expiration, variant).compile().unwrap();
        assert_eq!(
            script.len(),
            expected_len,
            "{variant:?} script with expiration {expiration} has the wrong length"
        );
    }
}

#[test]
fn test_compile_is_deterministic() {
    let first = compile_htlc_script(
        recipient_hash(),
        refund_hash(),
        contract_hash(),
        1_800_000_000,
        ScriptVariant::SizeChecked,
    )
    .unwrap();
    let second = compile_htlc_script(
        recipient_hash(),
        refund_hash(),
        contract_hash(),
        1_800_000_000,
        ScriptVariant::SizeChecked,
    )
    .unwrap();

    assert_eq!(first, second, "Same inputs must give byte-identical scripts");
}

#[test]
fn test_expiration_must_be_a_timestamp() {
    let block_height = HtlcScript::new(
        recipient_hash(),
        refund_hash(),
        contract_hash(),
        840_000,
        ScriptVariant::SizeChecked,
    );
    assert!(matches!(block_height, Err(HtlcError::Parameter(_))));

    let too_large = HtlcScript::new(
        recipient_hash(),
        refund_hash(),
        contract_hash(),
        u32::MAX as u64 + 1,
        ScriptVariant::SizeChecked,
    );
    assert!(matches!(too_large, Err(HtlcError::Parameter(_))));
}

#[test]
fn test_wrong_length_fails_closed() {
    let script = htlc(1_700_000_000, ScriptVariant::SizeChecked).compile().unwrap();

    // A valid unchecked length is still wrong for the size-checked variant.
    assert!(matches!(
        validate_script_length(&script, ScriptVariant::Unchecked),
        Err(HtlcError::ScriptConstruction(_))
    ));

    let mut bytes = script.to_bytes();
    bytes.push(0x51);
    assert!(matches!(
        validate_script_length(&ScriptBuf::from_bytes(bytes), ScriptVariant::SizeChecked),
        Err(HtlcError::ScriptConstruction(_))
    ));
}

#[test]
fn test_from_script_recovers_parameters() {
    for variant in [ScriptVariant::SizeChecked, ScriptVariant::Unchecked] {
        for expiration in [1_700_000_000u64, 3_000_000_000] {
            let original = htlc(expiration, variant);
            let script = original.compile().unwrap();
            let parsed = HtlcScript::from_script(&script).unwrap();

            assert_eq!(parsed, original, "Parsed {variant:?} script differs from the original");
        }
    }
}

#[test]
fn test_from_script_rejects_foreign_scripts() {
    let script = htlc(1_700_000_000, ScriptVariant::SizeChecked).compile().unwrap();

    let truncated = ScriptBuf::from_bytes(script.as_bytes()[..60].to_vec());
    assert!(matches!(
        HtlcScript::from_script(&truncated),
        Err(HtlcError::ScriptConstruction(_))
    ));

    // OP_CHECKSIG swapped for OP_CHECKSIGVERIFY keeps the length.
    let mut bytes = script.to_bytes();
    let last = bytes.len() - 1;
    bytes[last] = 0xad;
    assert!(matches!(
        HtlcScript::from_script(&ScriptBuf::from_bytes(bytes)),
        Err(HtlcError::ScriptConstruction(_))
    ));

    // Preimage size check of 33 instead of 32.
    let mut bytes = script.to_bytes();
    bytes[3] = 0x21;
    assert!(matches!(
        HtlcScript::from_script(&ScriptBuf::from_bytes(bytes)),
        Err(HtlcError::ScriptConstruction(_))
    ));

    let multisig = ScriptBuf::from_bytes(vec![0x52; 97]);
    assert!(HtlcScript::from_script(&multisig).is_err());
}

#[test]
fn test_p2wsh_output_and_address() {
    let htlc = htlc(1_700_000_000, ScriptVariant::SizeChecked);
    let script = htlc.compile().unwrap();
    let script_pubkey = htlc.p2wsh_script_pubkey().unwrap();

    assert_eq!(&script_pubkey.as_bytes()[..2], &[0x00, 0x20]);
    assert_eq!(&script_pubkey.as_bytes()[2..], &hashing::sha256(script.as_bytes())[..]);

    let address = htlc.address(bitcoin::Network::Regtest).unwrap();
    assert!(address.to_string().starts_with("bcrt1q"));
    assert_eq!(address, Address::p2wsh(&script, bitcoin::Network::Regtest));
    assert_eq!(
        address,
        htlc.address(bitcoin::Network::Regtest).unwrap(),
        "Funding address must be reproducible"
    );
}

#[test]
fn test_branch_selectors() {
    assert_eq!(ScriptBranch::Secret.selector(), &[0x01]);
    assert!(ScriptBranch::Timeout.selector().is_empty());

    let htlc = htlc(1_700_000_000, ScriptVariant::SizeChecked);
    assert_eq!(htlc.pubkey_hash(ScriptBranch::Secret), recipient_hash());
    assert_eq!(htlc.pubkey_hash(ScriptBranch::Timeout), refund_hash());
}
