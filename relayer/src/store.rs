//! Durable claim state, defined by its operations rather than a schema.
//!
//! Any backend satisfying [`ClaimStore`] is acceptable; the in-process
//! [`crate::memory::MemoryClaimStore`] backs tests and single-node
//! deployments, while production points the trait at the relational
//! store. Mutations are atomic per record; a batch of submissions needs
//! no enclosing transaction because ledger reconciliation corrects any
//! partial progress.

use async_trait::async_trait;
use l33_merkle_tree::artifact::DistributionArtifact;
use solana_program::pubkey::Pubkey;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimState {
    Pending,
    Submitted,
    Confirmed,
    Failed,
}

/// Per-leaf claim state. `(distribution_id, index)` is unique.
#[derive(Debug, Clone)]
pub struct ClaimRecord {
    pub distribution_id: [u8; 32],
    pub index: u64,
    pub recipient: Pubkey,
    pub amount: u64,
    pub state: ClaimState,
    /// Incremented exactly once per observed submission, by
    /// `mark_submitted`. Monotonically non-decreasing.
    pub attempts: u32,
    pub last_attempt_at: Option<u64>,
    /// Set at most once, iff the claim is confirmed.
    pub confirmed_at: Option<u64>,
    pub tx_reference: Option<String>,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistributionState {
    Pending,
    Funded,
    Active,
    Completed,
    ClawedBack,
}

/// Coarse envelope state, one per distribution.
#[derive(Debug, Clone)]
pub struct DistributionRecord {
    pub distribution_id: [u8; 32],
    pub state: DistributionState,
    pub recipient_count: u64,
    pub confirmed_count: u64,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("claim ({0}, {1}) not found")]
    ClaimNotFound(String, u64),
    #[error("distribution {0} not found")]
    DistributionNotFound(String),
    #[error("claim ({0}, {1}) is confirmed; transition forbidden")]
    AlreadyConfirmed(String, u64),
    #[error("store backend failure: {0}")]
    Backend(String),
}

#[async_trait]
pub trait ClaimStore: Send + Sync {
    /// Insert one pending [`ClaimRecord`] per artifact proof and the
    /// coarse [`DistributionRecord`]. Idempotent against
    /// `(distribution_id, index)`; returns the number of newly inserted
    /// claims.
    async fn seed_from_artifact(
        &self,
        artifact: &DistributionArtifact,
    ) -> Result<u64, StoreError>;

    /// Claims in `{pending, failed}` with `attempts < max_attempts`,
    /// ordered by index.
    async fn next_pending(
        &self,
        distribution_id: &[u8; 32],
        max_attempts: u32,
    ) -> Result<Vec<ClaimRecord>, StoreError>;

    /// All claims of a distribution, ordered by index.
    async fn list_claims(
        &self,
        distribution_id: &[u8; 32],
    ) -> Result<Vec<ClaimRecord>, StoreError>;

    /// Record an imminent submission: state becomes `submitted` and
    /// `attempts` is incremented. Called before broadcast so a crash
    /// after broadcast cannot silently repeat work.
    async fn mark_submitted(
        &self,
        distribution_id: &[u8; 32],
        index: u64,
    ) -> Result<(), StoreError>;

    /// Record settlement. Idempotent: confirming a confirmed claim keeps
    /// its original `confirmed_at` and reference. `tx_reference` is
    /// `None` when the claim was reconciled from ledger truth and the
    /// original signature is unknown.
    async fn mark_confirmed(
        &self,
        distribution_id: &[u8; 32],
        index: u64,
        tx_reference: Option<&str>,
    ) -> Result<(), StoreError>;

    /// Record a failed submission. Does not touch `attempts` (that
    /// happened in `mark_submitted`). Forbidden on confirmed claims.
    async fn mark_failed(
        &self,
        distribution_id: &[u8; 32],
        index: u64,
        error_message: &str,
    ) -> Result<(), StoreError>;

    /// Claims not yet confirmed, for coarse state transitions.
    async fn count_unconfirmed(&self, distribution_id: &[u8; 32]) -> Result<u64, StoreError>;

    async fn distribution(
        &self,
        distribution_id: &[u8; 32],
    ) -> Result<Option<DistributionRecord>, StoreError>;

    /// Idempotent coarse transition (`active → completed` may be issued
    /// repeatedly without harm).
    async fn set_distribution_state(
        &self,
        distribution_id: &[u8; 32],
        state: DistributionState,
    ) -> Result<(), StoreError>;
}
