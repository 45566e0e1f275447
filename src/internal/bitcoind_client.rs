use std::time::Duration;

use bitcoin::consensus::encode;
use bitcoin::{Transaction, TxOut, Txid};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::errors::RpcError;

pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_RPC_ATTEMPTS: u32 = 3;
/// Added once more before each further attempt.
pub const DEFAULT_RPC_BACKOFF: Duration = Duration::from_millis(500);

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Minimal bitcoind JSON-RPC client for looking up funding outputs.
///
/// Only the CLI uses this. Timeouts and retries are decided here, never in
/// the contract or spend code.
#[derive(Debug, Clone)]
pub struct BitcoindClient {
    http: reqwest::Client,
    url: String,
    auth: Option<String>,
    attempts: u32,
    backoff: Duration,
}

impl BitcoindClient {
    pub fn new(
        url: String,
        rpc_user: Option<String>,
        rpc_password: Option<String>,
        timeout: Duration,
    ) -> Result<Self, RpcError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let auth = rpc_user.map(|user| {
            let credentials = format!("{}:{}", user, rpc_password.unwrap_or_default());
            format!("Basic {}", base64::encode(credentials))
        });

        Ok(BitcoindClient {
            http,
            url,
            auth,
            attempts: DEFAULT_RPC_ATTEMPTS,
            backoff: DEFAULT_RPC_BACKOFF,
        })
    }

    pub fn with_retry(mut self, attempts: u32, backoff: Duration) -> Self {
        self.attempts = attempts.max(1);
        self.backoff = backoff;
        self
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, RpcError> {
        let body = json!({
            "jsonrpc": "1.0",
            "id": "bitcoin-htlc",
            "method": method,
            "params": params,
        });

        let mut last_error = String::new();
        for attempt in 1..=self.attempts {
            let mut request = self
                .http
                .post(&self.url)
                .header(CONTENT_TYPE, "application/json")
                .json(&body);
            if let Some(auth) = &self.auth {
                request = request.header(AUTHORIZATION, auth);
            }

            // bitcoind answers RPC errors with a non-2xx status and a JSON body,
            // so the body is read regardless of status.
            let response = match request.send().await {
                Ok(response) => response,
                Err(e) => {
                    warn!(method, attempt, error = %e, "RPC request failed");
                    last_error = e.to_string();
                    if attempt < self.attempts {
                        tokio::time::sleep(self.backoff * attempt).await;
                    }
                    continue;
                }
            };

            let response: RpcResponse<T> = response.json().await?;
            if let Some(error) = response.error {
                return Err(RpcError::Node {
                    code: error.code,
                    message: error.message,
                });
            }
            debug!(method, attempt, "RPC call succeeded");
            return response
                .result
                .ok_or_else(|| RpcError::Malformed(format!("{method} returned no result")));
        }

        Err(RpcError::Exhausted {
            attempts: self.attempts,
            last: last_error,
        })
    }

    pub async fn get_raw_transaction(&self, txid: &Txid) -> Result<Transaction, RpcError> {
        let tx_hex: String = self
            .call("getrawtransaction", json!([txid.to_string()]))
            .await?;
        let bytes = hex::decode(tx_hex.trim())
            .map_err(|e| RpcError::Malformed(format!("transaction is not hex: {e}")))?;
        encode::deserialize(&bytes)
            .map_err(|e| RpcError::Malformed(format!("undecodable transaction: {e}")))
    }

    /// The output at `txid:vout`, as it is on chain.
    pub async fn get_funding_output(&self, txid: &Txid, vout: u32) -> Result<TxOut, RpcError> {
        let tx = self.get_raw_transaction(txid).await?;
        tx.output
            .get(vout as usize)
            .cloned()
            .ok_or(RpcError::MissingOutput {
                txid: txid.to_string(),
                vout,
            })
    }
}
