use anchor_lang::prelude::*;
use anchor_spl::token::{self, Token, TokenAccount, Transfer};

use crate::{error::DistributorError, state::Distribution};

/// [crate::merkle_distributor::clawback] accounts.
#[derive(Accounts)]
pub struct Clawback<'info> {
    #[account(
        mut,
        has_one = authority @ DistributorError::Unauthorized,
        has_one = vault @ DistributorError::InvalidVault
    )]
    pub distribution: Account<'info, Distribution>,

    #[account(mut)]
    pub vault: Account<'info, TokenAccount>,

    #[account(
        mut,
        token::mint = distribution.mint,
        token::authority = authority
    )]
    pub authority_token_account: Account<'info, TokenAccount>,

    pub authority: Signer<'info>,

    pub token_program: Program<'info, Token>,
}

/// Drain the vault back to the authority after the claim window closes.
pub fn handle_clawback(ctx: Context<Clawback>) -> Result<()> {
    let distribution = &ctx.accounts.distribution;
    let remaining = ctx.accounts.vault.amount;

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
            to: ctx.accounts.authority_token_account.to_account_info(),
            authority: ctx.accounts.distribution.to_account_info(),
        },
        signer,
    );
    token::transfer(transfer_ctx, remaining)?;

    msg!("Clawback: {} tokens returned to authority", remaining);

    Ok(())
}
