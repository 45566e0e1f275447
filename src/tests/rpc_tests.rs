use std::str::FromStr;
use std::time::{Duration, Instant};

use bitcoin::Txid;

use crate::errors::RpcError;
use crate::internal::bitcoind_client::BitcoindClient;
use crate::tests::fixtures::FUNDING_TXID;

// Nothing listens on port 1, so every request fails at the transport.
const UNREACHABLE_NODE: &str = "http://127.0.0.1:1";

fn unreachable_client(attempts: u32, backoff: Duration) -> BitcoindClient {
    BitcoindClient::new(
        UNREACHABLE_NODE.to_string(),
        Some("user".to_string()),
        Some("pass".to_string()),
        Duration::from_secs(2),
    )
    .unwrap()
    .with_retry(attempts, backoff)
}

#[tokio::test]
async fn test_rpc_gives_up_after_configured_attempts() {
    let backoff = Duration::from_millis(400);
    let client = unreachable_client(2, backoff);
    let txid = Txid::from_str(FUNDING_TXID).unwrap();

    let started = Instant::now();
    let result = client.get_funding_output(&txid, 0).await;
    let elapsed = started.elapsed();

    println!("RPC result after {:?}: {:?}", elapsed, result);

    assert!(
        matches!(result, Err(RpcError::Exhausted { attempts: 2, .. })),
        "Expected two failed attempts, got {result:?}"
    );
    assert!(elapsed >= backoff, "Should back off between attempts");
    assert!(
        elapsed < backoff * 2 + Duration::from_millis(200),
        "Should not sleep after the last attempt, took {elapsed:?}"
    );
}

#[tokio::test]
async fn test_rpc_always_makes_one_attempt() {
    let client = unreachable_client(0, Duration::from_millis(10));
    let txid = Txid::from_str(FUNDING_TXID).unwrap();

    let result = client.get_raw_transaction(&txid).await;
    assert!(
        matches!(result, Err(RpcError::Exhausted { attempts: 1, .. })),
        "Zero attempts should be raised to one, got {result:?}"
    );
}
