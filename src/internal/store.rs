use std::convert::TryFrom;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::StoreError;
use crate::internal::convert::ContractRecord;
use crate::types::SwapContract;

/// One line of the backup file.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreEntry {
    htlc_address: String,
    contract: ContractRecord,
}

/// Append-only JSON-lines backup of created contracts, keyed by funding address.
///
/// A convenience cache only. Anyone who can read the file can read every
/// preimage in it, and nothing in here should be trusted without re-deriving
/// the script.
#[derive(Debug, Clone)]
pub struct ContractStore {
    path: PathBuf,
}

impl ContractStore {
    pub fn open(path: impl AsRef<Path>) -> Self {
        ContractStore {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, contract: &SwapContract) -> Result<(), StoreError> {
        let entry = StoreEntry {
            htlc_address: contract.htlc_address().to_string(),
            contract: ContractRecord::from(contract),
        };
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.flush()?;

        debug!(path = %self.path.display(), htlc_address = %entry.htlc_address, "stored contract");
        Ok(())
    }

    /// The most recent record for `htlc_address`. A missing file is a miss.
    pub fn find(&self, htlc_address: &str) -> Result<Option<SwapContract>, StoreError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut found = None;
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: StoreEntry = match serde_json::from_str(&line) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "skipping unreadable store line");
                    continue;
                }
            };
            if entry.htlc_address == htlc_address {
                found = Some(entry.contract);
            }
        }

        found
            .map(|record| {
                SwapContract::try_from(record).map_err(|source| StoreError::Corrupt {
                    address: htlc_address.to_string(),
                    source,
                })
            })
            .transpose()
    }
}
