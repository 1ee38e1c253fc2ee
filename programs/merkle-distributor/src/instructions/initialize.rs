use anchor_lang::prelude::*;
use anchor_spl::token::{self, Token, TokenAccount};

use crate::state::Distribution;

/// [crate::merkle_distributor::initialize] accounts.
#[derive(Accounts)]
#[instruction(distribution_id: [u8; 32])]
pub struct Initialize<'info> {
    #[account(mut)]
    pub authority: Signer<'info>,

    #[account(
        init,
        payer = authority,
        space = 8 + Distribution::INIT_SPACE,
        seeds = [b"distribution", distribution_id.as_ref()],
        bump
    )]
    pub distribution: Account<'info, Distribution>,

    /// The token mint for this distribution.
    pub mint: Account<'info, token::Mint>,

    #[account(
        init,
        payer = authority,
        token::mint = mint,
        token::authority = distribution,
        seeds = [b"vault", distribution_id.as_ref()],
        bump
    )]
    pub vault: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
    pub rent: Sysvar<'info, Rent>,
}

/// Commit one payout round: store the root and allocate the vault the
/// authority funds in the same multisig-approved transaction.
pub fn handle_initialize(
    ctx: Context<Initialize>,
    distribution_id: [u8; 32],
    merkle_root: [u8; 32],
    total_amount: u64,
    num_recipients: u64,
) -> Result<()> {
    let distribution = &mut ctx.accounts.distribution;

    distribution.authority = ctx.accounts.authority.key();
    // The authority is the operator until one is designated.
    distribution.operator = ctx.accounts.authority.key();
    distribution.mint = ctx.accounts.mint.key();
    distribution.vault = ctx.accounts.vault.key();
    distribution.distribution_id = distribution_id;
    distribution.merkle_root = merkle_root;
    distribution.total_amount = total_amount;
    distribution.claimed_amount = 0;
    distribution.num_recipients = num_recipients;
    distribution.num_claimed = 0;
    distribution.paused = false;
    distribution.bump = ctx.bumps.distribution;
    distribution.vault_bump = ctx.bumps.vault;

    msg!(
        "Distribution initialized: recipients={}, total={}",
        num_recipients,
        total_amount
    );

    Ok(())
}
