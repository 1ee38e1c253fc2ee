use anchor_lang::{prelude::*, solana_program::keccak};
use anchor_spl::token::{self, Token, TokenAccount, Transfer};
use l33_merkle_verify::{verify, MAX_PROOF_LEN};

use crate::{
    error::DistributorError,
    state::{ClaimRecord, Distribution},
    DOMAIN_SEPARATOR,
};

/// [crate::merkle_distributor::claim] accounts.
#[derive(Accounts)]
#[instruction(index: u64, amount: u64)]
pub struct ProcessClaim<'info> {
    #[account(
        mut,
        has_one = vault @ DistributorError::InvalidVault
    )]
    pub distribution: Account<'info, Distribution>,

    /// Uniqueness marker for `(distribution, index)`. `init` fails when
    /// it already exists, which is exactly the replay protection.
    #[account(
        init,
        payer = payer,
        space = 8 + ClaimRecord::INIT_SPACE,
        seeds = [
            b"claim",
            distribution.key().as_ref(),
            index.to_le_bytes().as_ref()
        ],
        bump
    )]
    pub claim_record: Account<'info, ClaimRecord>,

    #[account(mut)]
    pub vault: Account<'info, TokenAccount>,

    /// The recipient wallet.
    /// CHECK: verified through the Merkle proof.
    pub recipient: UncheckedAccount<'info>,

    /// The recipient's token account.
    #[account(
        mut,
        token::mint = distribution.mint,
        token::authority = recipient
    )]
    pub recipient_token_account: Account<'info, TokenAccount>,

    /// Anyone can submit claims (relayer pattern). The Merkle proof
    /// pins the payout to the verified recipient regardless of who
    /// signs the transaction.
    #[account(mut)]
    pub payer: Signer<'info>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

/// Pay one committed leaf:
/// 1. recompute the leaf from on-chain state and the arguments;
/// 2. fold the proof against the stored root;
/// 3. transfer `amount` from the vault to the recipient.
pub fn handle_claim(
    ctx: Context<ProcessClaim>,
    index: u64,
    amount: u64,
    proof: Vec<[u8; 32]>,
) -> Result<()> {
    let distribution = &ctx.accounts.distribution;

    require!(!distribution.paused, DistributorError::Paused);
    require!(proof.len() <= MAX_PROOF_LEN, DistributorError::ProofTooLong);

    let leaf = compute_leaf(
        &distribution.distribution_id,
        &ctx.accounts.recipient.key(),
        amount,
    );
    require!(
        verify(&proof, distribution.merkle_root, leaf),
        DistributorError::InvalidProof
    );

    let seeds = &[
        b"distribution".as_ref(),
        distribution.distribution_id.as_ref(),
        &[distribution.bump],
    ];
    let signer = &[&seeds[..]];

    let transfer_ctx = CpiContext::new_with_signer(
        ctx.accounts.token_program.to_account_info(),
        Transfer {
            from: ctx.accounts.vault.to_account_info(),
            to: ctx.accounts.recipient_token_account.to_account_info(),
            authority: ctx.accounts.distribution.to_account_info(),
        },
        signer,
    );
    token::transfer(transfer_ctx, amount)?;

    let distribution = &mut ctx.accounts.distribution;
    distribution.claimed_amount = distribution
        .claimed_amount
        .checked_add(amount)
        .ok_or(DistributorError::Overflow)?;
    distribution.num_claimed = distribution
        .num_claimed
        .checked_add(1)
        .ok_or(DistributorError::Overflow)?;

    let claim_record = &mut ctx.accounts.claim_record;
    claim_record.distribution = ctx.accounts.distribution.key();
    claim_record.index = index;
    claim_record.recipient = ctx.accounts.recipient.key();
    claim_record.amount = amount;
    claim_record.claimed_at = Clock::get()?.unix_timestamp;
    claim_record.bump = ctx.bumps.claim_record;

    msg!(
        "Claimed: recipient={}, amount={}, index={}",
        ctx.accounts.recipient.key(),
        amount,
        index
    );

    Ok(())
}

/// Leaf digest: `keccak(DOMAIN_SEPARATOR || distribution_id || recipient
/// || amount_le)`. Must match the off-chain builder byte for byte.
pub fn compute_leaf(distribution_id: &[u8; 32], recipient: &Pubkey, amount: u64) -> [u8; 32] {
    keccak::hashv(&[
        DOMAIN_SEPARATOR,
        distribution_id,
        recipient.as_ref(),
        &amount.to_le_bytes(),
    ])
    .to_bytes()
}
