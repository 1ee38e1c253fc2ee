//! In-process claim store backend.
//!
//! Backs tests and single-node deployments. State lives in RwLock-guarded
//! maps keyed by `(distribution_id, index)`; every lock is held only for
//! the duration of one synchronous mutation, never across an await.

use std::{
    collections::HashMap,
    sync::RwLock,
    time::{SystemTime, UNIX_EPOCH},
};

use async_trait::async_trait;
use l33_merkle_tree::artifact::DistributionArtifact;

use crate::store::{
    ClaimRecord, ClaimState, ClaimStore, DistributionRecord, DistributionState, StoreError,
};

#[derive(Default)]
pub struct MemoryClaimStore {
    claims: RwLock<HashMap<([u8; 32], u64), ClaimRecord>>,
    distributions: RwLock<HashMap<[u8; 32], DistributionRecord>>,
}

impl MemoryClaimStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }

    fn short_id(distribution_id: &[u8; 32]) -> String {
        hex::encode(&distribution_id[..8])
    }
}

#[async_trait]
impl ClaimStore for MemoryClaimStore {
    async fn seed_from_artifact(
        &self,
        artifact: &DistributionArtifact,
    ) -> Result<u64, StoreError> {
        let mut claims = self.claims.write().expect("claim store lock poisoned");
        let mut inserted = 0u64;

        for entry in &artifact.proofs {
            let key = (artifact.distribution_id, entry.index);
            if claims.contains_key(&key) {
                continue;
            }
            claims.insert(
                key,
                ClaimRecord {
                    distribution_id: artifact.distribution_id,
                    index: entry.index,
                    recipient: entry.recipient,
                    amount: entry.amount,
                    state: ClaimState::Pending,
                    attempts: 0,
                    last_attempt_at: None,
                    confirmed_at: None,
                    tx_reference: None,
                    last_error: None,
                },
            );
            inserted += 1;
        }
        drop(claims);

        let mut distributions = self
            .distributions
            .write()
            .expect("claim store lock poisoned");
        distributions
            .entry(artifact.distribution_id)
            .or_insert_with(|| DistributionRecord {
                distribution_id: artifact.distribution_id,
                state: DistributionState::Pending,
                recipient_count: artifact.recipient_count,
                confirmed_count: 0,
            });

        Ok(inserted)
    }

    async fn next_pending(
        &self,
        distribution_id: &[u8; 32],
        max_attempts: u32,
    ) -> Result<Vec<ClaimRecord>, StoreError> {
        let claims = self.claims.read().expect("claim store lock poisoned");
        let mut eligible: Vec<ClaimRecord> = claims
            .values()
            .filter(|c| {
                c.distribution_id == *distribution_id
                    && matches!(c.state, ClaimState::Pending | ClaimState::Failed)
                    && c.attempts < max_attempts
            })
            .cloned()
            .collect();
        eligible.sort_by_key(|c| c.index);
        Ok(eligible)
    }

    async fn list_claims(
        &self,
        distribution_id: &[u8; 32],
    ) -> Result<Vec<ClaimRecord>, StoreError> {
        let claims = self.claims.read().expect("claim store lock poisoned");
        let mut all: Vec<ClaimRecord> = claims
            .values()
            .filter(|c| c.distribution_id == *distribution_id)
            .cloned()
            .collect();
        all.sort_by_key(|c| c.index);
        Ok(all)
    }

    async fn mark_submitted(
        &self,
        distribution_id: &[u8; 32],
        index: u64,
    ) -> Result<(), StoreError> {
        let mut claims = self.claims.write().expect("claim store lock poisoned");
        let claim = claims
            .get_mut(&(*distribution_id, index))
            .ok_or_else(|| StoreError::ClaimNotFound(Self::short_id(distribution_id), index))?;

        if claim.state == ClaimState::Confirmed {
            return Err(StoreError::AlreadyConfirmed(
                Self::short_id(distribution_id),
                index,
            ));
        }

        claim.state = ClaimState::Submitted;
        claim.attempts += 1;
        claim.last_attempt_at = Some(Self::now());
        Ok(())
    }

    async fn mark_confirmed(
        &self,
        distribution_id: &[u8; 32],
        index: u64,
        tx_reference: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut claims = self.claims.write().expect("claim store lock poisoned");
        let claim = claims
            .get_mut(&(*distribution_id, index))
            .ok_or_else(|| StoreError::ClaimNotFound(Self::short_id(distribution_id), index))?;

        if claim.state == ClaimState::Confirmed {
            // Idempotent; confirmed_at is set at most once.
            return Ok(());
        }

        claim.state = ClaimState::Confirmed;
        claim.confirmed_at = Some(Self::now());
        claim.tx_reference = tx_reference.map(str::to_string);
        claim.last_error = None;
        drop(claims);

        let mut distributions = self
            .distributions
            .write()
            .expect("claim store lock poisoned");
        if let Some(record) = distributions.get_mut(distribution_id) {
            record.confirmed_count += 1;
        }
        Ok(())
    }

    async fn mark_failed(
        &self,
        distribution_id: &[u8; 32],
        index: u64,
        error_message: &str,
    ) -> Result<(), StoreError> {
        let mut claims = self.claims.write().expect("claim store lock poisoned");
        let claim = claims
            .get_mut(&(*distribution_id, index))
            .ok_or_else(|| StoreError::ClaimNotFound(Self::short_id(distribution_id), index))?;

        if claim.state == ClaimState::Confirmed {
            return Err(StoreError::AlreadyConfirmed(
                Self::short_id(distribution_id),
                index,
            ));
        }

        claim.state = ClaimState::Failed;
        claim.last_error = Some(error_message.to_string());
        Ok(())
    }

    async fn count_unconfirmed(&self, distribution_id: &[u8; 32]) -> Result<u64, StoreError> {
        let claims = self.claims.read().expect("claim store lock poisoned");
        Ok(claims
            .values()
            .filter(|c| c.distribution_id == *distribution_id && c.state != ClaimState::Confirmed)
            .count() as u64)
    }

    async fn distribution(
        &self,
        distribution_id: &[u8; 32],
    ) -> Result<Option<DistributionRecord>, StoreError> {
        let distributions = self.distributions.read().expect("claim store lock poisoned");
        Ok(distributions.get(distribution_id).cloned())
    }

    async fn set_distribution_state(
        &self,
        distribution_id: &[u8; 32],
        state: DistributionState,
    ) -> Result<(), StoreError> {
        let mut distributions = self
            .distributions
            .write()
            .expect("claim store lock poisoned");
        let record = distributions.get_mut(distribution_id).ok_or_else(|| {
            StoreError::DistributionNotFound(Self::short_id(distribution_id))
        })?;
        record.state = state;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use l33_merkle_tree::{
        artifact::{DistributionArtifact, DistributionParams},
        payout_entry::PayoutEntry,
    };
    use solana_program::pubkey::Pubkey;

    use super::*;

    fn artifact(amounts: &[u64]) -> DistributionArtifact {
        let params = DistributionParams {
            reward_id: "rewards-q3".to_string(),
            window_id: "2024-07".to_string(),
            mint: Pubkey::new_unique(),
        };
        let entries: Vec<PayoutEntry> = amounts
            .iter()
            .enumerate()
            .map(|(i, amount)| PayoutEntry {
                index: i as u64,
                recipient: Pubkey::new_unique(),
                amount: *amount,
            })
            .collect();
        DistributionArtifact::new(&params, &entries, b"src").unwrap()
    }

    #[tokio::test]
    async fn seed_is_idempotent() {
        let store = MemoryClaimStore::new();
        let artifact = artifact(&[100, 200]);

        assert_eq!(store.seed_from_artifact(&artifact).await.unwrap(), 2);
        assert_eq!(store.seed_from_artifact(&artifact).await.unwrap(), 0);
        assert_eq!(
            store.count_unconfirmed(&artifact.distribution_id).await.unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn lifecycle_pending_submitted_confirmed() {
        let store = MemoryClaimStore::new();
        let artifact = artifact(&[100]);
        let id = artifact.distribution_id;
        store.seed_from_artifact(&artifact).await.unwrap();

        store.mark_submitted(&id, 0).await.unwrap();
        let claim = &store.list_claims(&id).await.unwrap()[0];
        assert_eq!(claim.state, ClaimState::Submitted);
        assert_eq!(claim.attempts, 1);

        store.mark_confirmed(&id, 0, Some("sig")).await.unwrap();
        let claim = &store.list_claims(&id).await.unwrap()[0];
        assert_eq!(claim.state, ClaimState::Confirmed);
        assert_eq!(claim.tx_reference.as_deref(), Some("sig"));
        assert!(claim.confirmed_at.is_some());
        assert_eq!(store.count_unconfirmed(&id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn confirmed_is_terminal() {
        let store = MemoryClaimStore::new();
        let artifact = artifact(&[100]);
        let id = artifact.distribution_id;
        store.seed_from_artifact(&artifact).await.unwrap();

        store.mark_submitted(&id, 0).await.unwrap();
        store.mark_confirmed(&id, 0, Some("sig")).await.unwrap();

        // Re-confirming is an idempotent no-op that preserves the record.
        store.mark_confirmed(&id, 0, Some("other")).await.unwrap();
        let claim = &store.list_claims(&id).await.unwrap()[0];
        assert_eq!(claim.tx_reference.as_deref(), Some("sig"));

        // Any other transition out of confirmed is forbidden.
        assert!(matches!(
            store.mark_submitted(&id, 0).await,
            Err(StoreError::AlreadyConfirmed(_, _))
        ));
        assert!(matches!(
            store.mark_failed(&id, 0, "boom").await,
            Err(StoreError::AlreadyConfirmed(_, _))
        ));
    }

    #[tokio::test]
    async fn failed_claims_requeue_until_attempts_exhausted() {
        let store = MemoryClaimStore::new();
        let artifact = artifact(&[100]);
        let id = artifact.distribution_id;
        store.seed_from_artifact(&artifact).await.unwrap();

        for attempt in 1..=3u32 {
            let pending = store.next_pending(&id, 3).await.unwrap();
            assert_eq!(pending.len(), 1, "attempt {attempt}");
            store.mark_submitted(&id, 0).await.unwrap();
            store.mark_failed(&id, 0, "rpc outage").await.unwrap();

            let claim = &store.list_claims(&id).await.unwrap()[0];
            assert_eq!(claim.attempts, attempt);
            assert_eq!(claim.state, ClaimState::Failed);
        }

        // Attempt budget exhausted: no longer eligible.
        assert!(store.next_pending(&id, 3).await.unwrap().is_empty());
        let claim = &store.list_claims(&id).await.unwrap()[0];
        assert_eq!(claim.last_error.as_deref(), Some("rpc outage"));
    }

    #[tokio::test]
    async fn next_pending_is_index_ordered() {
        let store = MemoryClaimStore::new();
        let artifact = artifact(&[10, 20, 30, 40]);
        let id = artifact.distribution_id;
        store.seed_from_artifact(&artifact).await.unwrap();

        store.mark_submitted(&id, 1).await.unwrap();
        store.mark_confirmed(&id, 1, Some("sig")).await.unwrap();

        let pending = store.next_pending(&id, 3).await.unwrap();
        let indices: Vec<u64> = pending.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![0, 2, 3]);
    }

    #[tokio::test]
    async fn distribution_record_transitions() {
        let store = MemoryClaimStore::new();
        let artifact = artifact(&[100]);
        let id = artifact.distribution_id;
        store.seed_from_artifact(&artifact).await.unwrap();

        let record = store.distribution(&id).await.unwrap().unwrap();
        assert_eq!(record.state, DistributionState::Pending);
        assert_eq!(record.recipient_count, 1);

        store
            .set_distribution_state(&id, DistributionState::Active)
            .await
            .unwrap();
        // Idempotent re-issue.
        store
            .set_distribution_state(&id, DistributionState::Active)
            .await
            .unwrap();

        store.mark_submitted(&id, 0).await.unwrap();
        store.mark_confirmed(&id, 0, Some("sig")).await.unwrap();
        let record = store.distribution(&id).await.unwrap().unwrap();
        assert_eq!(record.confirmed_count, 1);
    }
}
