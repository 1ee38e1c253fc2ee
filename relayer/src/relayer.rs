//! The claim lifecycle state machine.
//!
//! One logical worker per distribution. Batches within a distribution
//! are strictly sequential; ledger reconciliation always runs before
//! instruction assembly, and `mark_submitted` always precedes broadcast
//! so a crash after broadcast cannot silently repeat work. Ledger truth
//! is authoritative: any divergence between the claim store and the
//! on-chain uniqueness markers is resolved in favor of the chain.

use std::{
    future::Future,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use l33_merkle_tree::{
    artifact::{DistributionArtifact, ProofEntry},
    error::MerkleTreeError,
    utils::{get_claim_marker_pda, get_distribution_pda, get_vault_pda},
};
use solana_program::{instruction::Instruction, pubkey::Pubkey};
use solana_sdk::{
    signature::{Keypair, Signature},
    signer::Signer,
    transaction::Transaction,
};
use spl_associated_token_account::get_associated_token_address;
use tracing::{debug, info, warn};

use crate::{
    config::RelayerConfig,
    error::RelayerError,
    instructions::{
        build_claim_instruction, build_create_token_account_instruction,
        compute_budget_instructions,
    },
    ledger::{LedgerClient, LedgerError},
    store::{ClaimRecord, ClaimState, ClaimStore, DistributionState, StoreError},
};

/// In-place retries for store operations before a batch is abandoned.
const STORE_RETRY_LIMIT: u32 = 3;

/// Outcome of one main-loop pass.
#[derive(Debug, Default, Clone)]
pub struct RunSummary {
    /// Confirmed from ledger truth without a submission.
    pub reconciled: u64,
    /// Confirmed through our own submissions.
    pub confirmed: u64,
    /// Marked failed this pass (eligible again while attempts remain).
    pub failed: u64,
    /// Claims still unconfirmed after the pass.
    pub unconfirmed: u64,
}

pub struct Relayer<S, L> {
    config: RelayerConfig,
    store: S,
    ledger: L,
    payer: Keypair,
    cancelled: Arc<AtomicBool>,
}

impl<S: ClaimStore, L: LedgerClient> Relayer<S, L> {
    pub fn new(config: RelayerConfig, store: S, ledger: L, payer: Keypair) -> Self {
        Self {
            config,
            store,
            ledger,
            payer,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag checked between batches and between passes; an in-flight
    /// submission is never interrupted.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Drive the distribution until every claim is confirmed or out of
    /// attempts. Passes are bounded: each submission increments a
    /// claim's attempt counter, so `max_attempts + 1` passes exhaust all
    /// eligible work.
    pub async fn run(&self, artifact: &DistributionArtifact) -> Result<RunSummary, RelayerError> {
        let mut summary = RunSummary::default();
        for pass in 0..=self.config.max_attempts {
            summary = self.run_once(artifact).await?;
            info!(
                pass,
                reconciled = summary.reconciled,
                confirmed = summary.confirmed,
                failed = summary.failed,
                unconfirmed = summary.unconfirmed,
                "relay pass complete"
            );
            if summary.unconfirmed == 0 || self.is_cancelled() {
                break;
            }
        }
        Ok(summary)
    }

    /// One main-loop pass: seed, reconcile stale submissions, batch all
    /// eligible claims, close the distribution when nothing is left.
    pub async fn run_once(
        &self,
        artifact: &DistributionArtifact,
    ) -> Result<RunSummary, RelayerError> {
        let distribution_id = artifact.distribution_id;
        let mut summary = RunSummary::default();

        retry_store(|| self.store.seed_from_artifact(artifact)).await?;
        self.activate(&distribution_id).await?;

        let (distribution, _) = get_distribution_pda(&self.config.program_id, &distribution_id);

        self.reconcile_stale_submissions(&distribution_id, &distribution, &mut summary)
            .await?;

        let pending = retry_store(|| {
            self.store
                .next_pending(&distribution_id, self.config.max_attempts)
        })
        .await?;
        debug!(claims = pending.len(), "eligible claims this pass");

        for batch in pending.chunks(self.config.batch_size.max(1)) {
            if self.is_cancelled() {
                info!("cancellation requested; stopping between batches");
                break;
            }
            self.process_batch(artifact, &distribution, batch, &mut summary)
                .await?;
            tokio::time::sleep(self.config.inter_batch_delay).await;
        }

        summary.unconfirmed = retry_store(|| self.store.count_unconfirmed(&distribution_id)).await?;
        if summary.unconfirmed == 0 {
            retry_store(|| {
                self.store
                    .set_distribution_state(&distribution_id, DistributionState::Completed)
            })
            .await?;
            info!("distribution complete");
        }

        Ok(summary)
    }

    async fn activate(&self, distribution_id: &[u8; 32]) -> Result<(), StoreError> {
        if let Some(record) = retry_store(|| self.store.distribution(distribution_id)).await? {
            if matches!(
                record.state,
                DistributionState::Pending | DistributionState::Funded
            ) {
                retry_store(|| {
                    self.store
                        .set_distribution_state(distribution_id, DistributionState::Active)
                })
                .await?;
            }
        }
        Ok(())
    }

    /// Claims left `submitted` by a crash or a batch-wide error are
    /// corrected from ledger truth: marker present means confirmed,
    /// marker absent means the submission never landed and the claim is
    /// requeued.
    async fn reconcile_stale_submissions(
        &self,
        distribution_id: &[u8; 32],
        distribution: &Pubkey,
        summary: &mut RunSummary,
    ) -> Result<(), RelayerError> {
        let claims = retry_store(|| self.store.list_claims(distribution_id)).await?;
        for claim in claims
            .iter()
            .filter(|c| c.state == ClaimState::Submitted)
        {
            if self.claim_marker_exists(distribution, claim.index).await {
                retry_store(|| self.store.mark_confirmed(distribution_id, claim.index, None))
                    .await?;
                summary.reconciled += 1;
            } else {
                retry_store(|| {
                    self.store.mark_failed(
                        distribution_id,
                        claim.index,
                        "submission outcome unknown; requeued",
                    )
                })
                .await?;
            }
        }
        Ok(())
    }

    async fn claim_marker_exists(&self, distribution: &Pubkey, index: u64) -> bool {
        let (marker, _) = get_claim_marker_pda(&self.config.program_id, distribution, index);
        match self.ledger.account_exists(&marker).await {
            Ok(exists) => exists,
            Err(e) => {
                // Can't read the chain right now: assume absent. A replay
                // is inert on-chain and gets reconciled on the next pass.
                warn!(index, error = %e, "marker lookup failed");
                false
            }
        }
    }

    async fn process_batch(
        &self,
        artifact: &DistributionArtifact,
        distribution: &Pubkey,
        batch: &[ClaimRecord],
        summary: &mut RunSummary,
    ) -> Result<(), RelayerError> {
        let distribution_id = artifact.distribution_id;

        // (a) Ledger reconciliation: already-processed claims are
        // confirmed and never re-submitted in this batch.
        let mut remaining: Vec<&ClaimRecord> = Vec::with_capacity(batch.len());
        for claim in batch {
            if self.claim_marker_exists(distribution, claim.index).await {
                retry_store(|| self.store.mark_confirmed(&distribution_id, claim.index, None))
                    .await?;
                summary.reconciled += 1;
                debug!(index = claim.index, "reconciled from ledger truth");
            } else {
                remaining.push(claim);
            }
        }
        if remaining.is_empty() {
            return Ok(());
        }

        let entries = self.artifact_entries(artifact, &remaining)?;
        let batch_total: u64 = entries.iter().map(|e| e.amount).sum();

        // The vault must cover the batch before any claim state is
        // advanced; a shortfall is terminal for the whole distribution.
        let (vault, _) = get_vault_pda(&self.config.program_id, &distribution_id);
        match self.ledger.token_account_balance(&vault).await {
            Ok(balance) => {
                let balance = balance.unwrap_or(0);
                if balance < batch_total {
                    return Err(RelayerError::InsufficientFunds {
                        balance,
                        required: batch_total,
                    });
                }
            }
            Err(e) => {
                // Unreadable vault is a transport problem; submission
                // will surface the real outcome.
                warn!(error = %e, "vault balance lookup failed");
            }
        }

        // (b, c) Account preparation and instruction assembly.
        let mut instructions = compute_budget_instructions(&self.config);
        for entry in &entries {
            let token_account = get_associated_token_address(&entry.recipient, &self.config.mint);
            if !self.ledger.account_exists(&token_account).await.unwrap_or(true) {
                instructions.push(build_create_token_account_instruction(
                    &self.payer.pubkey(),
                    &entry.recipient,
                    &self.config.mint,
                ));
            }
            instructions.push(build_claim_instruction(
                &self.config.program_id,
                &self.config.mint,
                &distribution_id,
                &self.payer.pubkey(),
                entry,
            ));
        }

        // (d) Optimistic state update before broadcast.
        for claim in &remaining {
            retry_store(|| self.store.mark_submitted(&distribution_id, claim.index)).await?;
        }

        // (e, f) Submission and settlement.
        match self.submit_with_retries(&instructions).await {
            Ok(signature) => {
                let reference = signature.to_string();
                for claim in &remaining {
                    retry_store(|| {
                        self.store
                            .mark_confirmed(&distribution_id, claim.index, Some(&reference))
                    })
                    .await?;
                    summary.confirmed += 1;
                }
                info!(claims = remaining.len(), %signature, "batch confirmed");
            }
            Err(LedgerError::AlreadyClaimed) => {
                // Someone else paid part of this batch between
                // reconciliation and submission. Leave the claims
                // submitted; the next pass resolves them from markers.
                info!("batch hit an existing claim marker; deferring to reconciliation");
            }
            Err(LedgerError::ProofInvalid) => {
                for claim in &remaining {
                    retry_store(|| {
                        self.store.mark_failed(
                            &distribution_id,
                            claim.index,
                            "proof rejected by the on-chain verifier",
                        )
                    })
                    .await?;
                }
                // Artifact/verifier divergence needs an operator; stop.
                return Err(RelayerError::ProofRejected {
                    index: remaining[0].index,
                });
            }
            Err(LedgerError::InsufficientFunds) => {
                return Err(RelayerError::InsufficientFunds {
                    balance: 0,
                    required: batch_total,
                });
            }
            Err(e) => {
                let message = e.to_string();
                warn!(error = %message, "batch failed after retries");
                for claim in &remaining {
                    retry_store(|| {
                        self.store
                            .mark_failed(&distribution_id, claim.index, &message)
                    })
                    .await?;
                    summary.failed += 1;
                }
            }
        }

        Ok(())
    }

    fn artifact_entries<'a>(
        &self,
        artifact: &'a DistributionArtifact,
        claims: &[&ClaimRecord],
    ) -> Result<Vec<&'a ProofEntry>, RelayerError> {
        claims
            .iter()
            .map(|claim| {
                artifact
                    .proofs
                    .get(claim.index as usize)
                    .filter(|p| p.index == claim.index)
                    .ok_or_else(|| {
                        RelayerError::Artifact(MerkleTreeError::ArtifactInvalid(format!(
                            "claim index {} has no artifact proof",
                            claim.index
                        )))
                    })
            })
            .collect()
    }

    /// One submission: sign against a fresh blockhash and broadcast,
    /// retrying transient failures up to the attempt budget. The
    /// per-claim attempt counter is not touched here; these are
    /// transaction-level retries within one observed submission.
    async fn submit_with_retries(
        &self,
        instructions: &[Instruction],
    ) -> Result<Signature, LedgerError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let result = async {
                let blockhash = self.ledger.latest_blockhash().await?;
                let transaction = Transaction::new_signed_with_payer(
                    instructions,
                    Some(&self.payer.pubkey()),
                    &[&self.payer],
                    blockhash,
                );
                self.ledger.send_and_confirm(&transaction).await
            }
            .await;

            match result {
                Ok(signature) => return Ok(signature),
                Err(e) if e.is_transient() && attempt < self.config.max_attempts => {
                    warn!(attempt, error = %e, "submission attempt failed; retrying");
                    tokio::time::sleep(self.config.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Retry a store operation in place a small, bounded number of times;
/// afterwards the batch is abandoned and the error surfaced.
async fn retry_store<T, Fut>(mut op: impl FnMut() -> Fut) -> Result<T, StoreError>
where
    Fut: Future<Output = Result<T, StoreError>>,
{
    let mut delay = Duration::from_millis(50);
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < STORE_RETRY_LIMIT && matches!(e, StoreError::Backend(_)) => {
                warn!(attempt, error = %e, "store operation failed; retrying");
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
            Err(e) => return Err(e),
        }
    }
}
