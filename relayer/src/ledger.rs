//! Ledger access, defined as a narrow trait so the relayer can run
//! against the live RPC or an in-memory mock.

use async_trait::async_trait;
use solana_program::pubkey::Pubkey;
use solana_sdk::{hash::Hash, signature::Signature, transaction::Transaction};
use thiserror::Error;

/// Classified ledger failures. `is_transient` decides whether the
/// relayer's submit loop retries or records a terminal outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("transport failure: {0}")]
    Transport(String),

    /// The recent-blockhash window elapsed mid-submission. Treated as a
    /// transport failure.
    #[error("recent blockhash expired")]
    Expired,

    /// The uniqueness marker already exists; the leaf has been paid.
    /// Never an error to the caller: reconciliation turns it into a
    /// confirmation.
    #[error("claim already processed")]
    AlreadyClaimed,

    /// The on-chain verifier rejected the proof. Terminal for the claim.
    #[error("merkle proof rejected by the program")]
    ProofInvalid,

    /// The vault cannot cover the transfer. Terminal for the
    /// distribution.
    #[error("vault has insufficient funds")]
    InsufficientFunds,
}

impl LedgerError {
    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::Transport(_) | LedgerError::Expired)
    }
}

/// Map an RPC error message onto the taxonomy. The RPC surfaces program
/// and runtime failures as text, so this matches on the stable substrings
/// the ledger emits.
pub fn classify_rpc_error(message: &str) -> LedgerError {
    if message.contains("already in use") {
        // The claim-marker account exists: creating it again fails at
        // the system program. The leaf has already been paid.
        LedgerError::AlreadyClaimed
    } else if message.contains("InvalidProof") || message.contains("custom program error: 0x1770") {
        LedgerError::ProofInvalid
    } else if message.contains("insufficient funds") {
        LedgerError::InsufficientFunds
    } else if message.contains("Blockhash not found")
        || message.contains("block height exceeded")
    {
        LedgerError::Expired
    } else {
        LedgerError::Transport(message.to_string())
    }
}

#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Whether any account exists at `address`. Used for claim-marker
    /// reconciliation and token-account existence checks.
    async fn account_exists(&self, address: &Pubkey) -> Result<bool, LedgerError>;

    /// Balance of a token account in base units, `None` when the account
    /// does not exist.
    async fn token_account_balance(&self, address: &Pubkey)
        -> Result<Option<u64>, LedgerError>;

    async fn latest_blockhash(&self) -> Result<Hash, LedgerError>;

    /// Broadcast and wait for confirmation. One call is one submission
    /// attempt; retries belong to the relayer loop.
    async fn send_and_confirm(&self, transaction: &Transaction)
        -> Result<Signature, LedgerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_covers_the_taxonomy() {
        assert_eq!(
            classify_rpc_error("Allocate: account Address { .. } already in use"),
            LedgerError::AlreadyClaimed
        );
        assert_eq!(
            classify_rpc_error("custom program error: 0x1770"),
            LedgerError::ProofInvalid
        );
        assert_eq!(
            classify_rpc_error("Error: insufficient funds"),
            LedgerError::InsufficientFunds
        );
        assert_eq!(classify_rpc_error("Blockhash not found"), LedgerError::Expired);
        assert!(matches!(
            classify_rpc_error("connection reset by peer"),
            LedgerError::Transport(_)
        ));
    }

    #[test]
    fn transience_split() {
        assert!(LedgerError::Transport("x".into()).is_transient());
        assert!(LedgerError::Expired.is_transient());
        assert!(!LedgerError::AlreadyClaimed.is_transient());
        assert!(!LedgerError::ProofInvalid.is_transient());
        assert!(!LedgerError::InsufficientFunds.is_transient());
    }
}
