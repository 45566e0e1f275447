use std::fs;
use std::io::Write;
use std::path::PathBuf;

use serial_test::serial;

use crate::errors::StoreError;
use crate::internal::store::ContractStore;
use crate::tests::fixtures::*;
use crate::types::ScriptVariant;

fn fresh_store() -> ContractStore {
    let path: PathBuf = std::env::temp_dir().join("bitcoin-htlc-store-test.jsonl");
    let _ = fs::remove_file(&path);
    ContractStore::open(path)
}

#[test]
#[serial]
fn test_missing_store_is_a_miss() {
    let store = fresh_store();
    let contract = bob_redeems_alice_refunds(ScriptVariant::SizeChecked);

    assert!(store
        .find(&contract.htlc_address().to_string())
        .unwrap()
        .is_none());
}

#[test]
#[serial]
fn test_append_then_find() {
    let store = fresh_store();
    let first = bob_redeems_alice_refunds(ScriptVariant::SizeChecked);
    let second = bob_redeems_alice_refunds(ScriptVariant::Unchecked);

    store.append(&first).unwrap();
    store.append(&second).unwrap();

    let found = store
        .find(&first.htlc_address().to_string())
        .unwrap()
        .expect("first contract should be stored");
    assert_eq!(found, first);
    assert_eq!(
        found.secret(),
        first.secret(),
        "Backup must keep the preimage"
    );

    let found = store
        .find(&second.htlc_address().to_string())
        .unwrap()
        .expect("second contract should be stored");
    assert_eq!(found.variant(), ScriptVariant::Unchecked);

    assert!(store.find("bcrt1qunknown").unwrap().is_none());
    let _ = fs::remove_file(store.path());
}

#[test]
#[serial]
fn test_latest_entry_wins_and_bad_lines_are_skipped() {
    let store = fresh_store();
    let contract = bob_redeems_alice_refunds(ScriptVariant::SizeChecked);
    store.append(&contract).unwrap();

    let mut file = fs::OpenOptions::new()
        .append(true)
        .open(store.path())
        .unwrap();
    writeln!(file, "this is not json").unwrap();
    drop(file);

    store.append(&contract).unwrap();
    let found = store.find(&contract.htlc_address().to_string()).unwrap();
    assert_eq!(found, Some(contract));
    let _ = fs::remove_file(store.path());
}

#[test]
#[serial]
fn test_corrupt_record_is_reported() {
    let store = fresh_store();
    let contract = bob_redeems_alice_refunds(ScriptVariant::SizeChecked);
    let address = contract.htlc_address().to_string();
    store.append(&contract).unwrap();

    // Keep the lookup key, break the script inside the record.
    let text = fs::read_to_string(store.path()).unwrap();
    let script_hex = hex::encode(contract.witness_script().as_bytes());
    fs::write(store.path(), text.replace(&script_hex, &script_hex[..100])).unwrap();

    let result = store.find(&address);
    assert!(
        matches!(result, Err(StoreError::Corrupt { .. })),
        "tampered record should not load"
    );
    let _ = fs::remove_file(store.path());
}
