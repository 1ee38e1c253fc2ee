//! Claim relayer: drives committed payouts from a distribution artifact
//! to confirmed on-chain claims.
//!
//! The relayer is untrusted by construction: every claim it submits
//! carries a Merkle proof the on-chain program checks against the
//! committed root, and the per-leaf uniqueness marker makes replays
//! inert. Its job is therefore purely operational: reconcile local claim
//! state with ledger truth, batch claim instructions under the
//! transaction budget, retry within bounds, and record outcomes in the
//! claim store.

pub mod config;
pub mod error;
pub mod instructions;
pub mod ledger;
pub mod memory;
pub mod mock;
pub mod relayer;
pub mod rpc;
pub mod store;

pub use config::RelayerConfig;
pub use error::RelayerError;
pub use ledger::{LedgerClient, LedgerError};
pub use memory::MemoryClaimStore;
pub use relayer::{Relayer, RunSummary};
pub use rpc::RpcLedgerClient;
pub use store::{ClaimRecord, ClaimState, ClaimStore, DistributionRecord, DistributionState, StoreError};
