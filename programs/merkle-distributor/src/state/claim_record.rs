use anchor_lang::prelude::*;

/// Uniqueness marker for one paid leaf. The account's existence is what
/// prevents replays; the fields are bookkeeping for indexers.
#[account]
#[derive(InitSpace)]
pub struct ClaimRecord {
    /// The distribution this claim belongs to.
    pub distribution: Pubkey,
    /// Leaf index in the Merkle tree.
    pub index: u64,
    /// Recipient wallet.
    pub recipient: Pubkey,
    /// Amount paid.
    pub amount: u64,
    /// Unix timestamp of the claim.
    pub claimed_at: i64,
    pub bump: u8,
}
