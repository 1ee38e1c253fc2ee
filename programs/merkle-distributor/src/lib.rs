//! Merkle distributor program.
//!
//! Distributes SPL tokens to a pre-committed recipient set through a
//! single Merkle root. The authority (a multisig) initializes and funds
//! one distribution; anyone may then submit claims carrying Merkle
//! proofs, and each leaf can be paid exactly once.
//!
//! Security properties:
//! - only the committed root can authorize claims;
//! - a per-leaf claim PDA blocks replays;
//! - domain separation prevents cross-distribution replay;
//! - the authority alone controls initialization and clawback.

#![allow(clippy::result_large_err)]
use anchor_lang::prelude::*;
use instructions::*;

pub mod error;
pub mod instructions;
pub mod state;

declare_id!("8LMVzwtrcVCLJPFfUFviqWv49WoyN1PKNLd9EDj4X4H4");

/// Domain separator for leaf hashing. Must match the off-chain builder
/// verbatim; changing it invalidates all prior distributions.
pub const DOMAIN_SEPARATOR: &[u8] = b"L33_MERKLE_V1";

#[program]
pub mod merkle_distributor {
    use super::*;

    /// Create the distribution and vault accounts and commit the Merkle
    /// root. Callable only by the distribution authority (typically a
    /// multisig).
    pub fn initialize(
        ctx: Context<Initialize>,
        distribution_id: [u8; 32],
        merkle_root: [u8; 32],
        total_amount: u64,
        num_recipients: u64,
    ) -> Result<()> {
        handle_initialize(ctx, distribution_id, merkle_root, total_amount, num_recipients)
    }

    /// Pay one committed leaf. Verifies the proof against the stored
    /// root and creates the claim marker that blocks replays.
    pub fn claim(
        ctx: Context<ProcessClaim>,
        index: u64,
        amount: u64,
        proof: Vec<[u8; 32]>,
    ) -> Result<()> {
        handle_claim(ctx, index, amount, proof)
    }

    /// Designate the relayer recorded for operational tooling. The
    /// operator can submit claims on recipients' behalf but cannot
    /// modify the distribution or redirect funds.
    pub fn set_operator(ctx: Context<SetOperator>, new_operator: Pubkey) -> Result<()> {
        handle_set_operator(ctx, new_operator)
    }

    /// Emergency stop for claims.
    pub fn pause(ctx: Context<AdminAction>) -> Result<()> {
        handle_update_pause(ctx, true)
    }

    pub fn unpause(ctx: Context<AdminAction>) -> Result<()> {
        handle_update_pause(ctx, false)
    }

    /// Return all remaining vault funds to the authority, typically
    /// after the claim period ends.
    pub fn clawback(ctx: Context<Clawback>) -> Result<()> {
        handle_clawback(ctx)
    }
}
