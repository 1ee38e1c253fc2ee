use anchor_lang::prelude::*;

use crate::{error::DistributorError, state::Distribution};

/// [crate::merkle_distributor::set_operator] accounts.
#[derive(Accounts)]
pub struct SetOperator<'info> {
    #[account(
        mut,
        has_one = authority @ DistributorError::Unauthorized
    )]
    pub distribution: Account<'info, Distribution>,

    pub authority: Signer<'info>,
}

pub fn handle_set_operator(ctx: Context<SetOperator>, new_operator: Pubkey) -> Result<()> {
    ctx.accounts.distribution.operator = new_operator;
    msg!("Operator set to: {}", new_operator);
    Ok(())
}
