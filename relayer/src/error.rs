use l33_merkle_tree::error::MerkleTreeError;
use thiserror::Error;

use crate::{ledger::LedgerError, store::StoreError};

/// Terminal relayer outcomes. Transient conditions never surface here;
/// they are absorbed by the retry loops and show up only as attempt
/// counts and log records.
#[derive(Error, Debug)]
pub enum RelayerError {
    #[error("artifact error: {0}")]
    Artifact(#[from] MerkleTreeError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// The on-chain verifier rejected a committed proof. This means the
    /// artifact and the verifier diverged (or the artifact was corrupted
    /// after validation) and needs operator investigation.
    #[error("proof for leaf {index} rejected by the on-chain verifier")]
    ProofRejected { index: u64 },

    /// The vault cannot cover the next batch. Terminal for the whole
    /// distribution; claim state is not advanced.
    #[error("vault balance {balance} cannot cover batch total {required}")]
    InsufficientFunds { balance: u64, required: u64 },
}
