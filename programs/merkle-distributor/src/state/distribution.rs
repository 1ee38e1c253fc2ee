use anchor_lang::prelude::*;

/// State of one committed payout round.
#[account]
#[derive(InitSpace)]
pub struct Distribution {
    /// Authority that manages this distribution.
    pub authority: Pubkey,
    /// Relayer designated to submit claims on recipients' behalf.
    pub operator: Pubkey,
    /// The SPL token mint being distributed.
    pub mint: Pubkey,
    /// Vault holding the committed tokens.
    pub vault: Pubkey,
    /// 32-byte identifier; also the seed of this account and the vault.
    pub distribution_id: [u8; 32],
    /// Merkle root committing to all (recipient, amount) pairs.
    pub merkle_root: [u8; 32],
    /// Total tokens allocated.
    pub total_amount: u64,
    /// Tokens claimed so far.
    pub claimed_amount: u64,
    /// Number of committed recipients.
    pub num_recipients: u64,
    /// Number of claims processed.
    pub num_claimed: u64,
    /// Emergency pause flag.
    pub paused: bool,
    pub bump: u8,
    pub vault_bump: u8,
}
