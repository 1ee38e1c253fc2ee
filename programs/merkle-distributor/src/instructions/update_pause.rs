use anchor_lang::prelude::*;

use crate::{error::DistributorError, state::Distribution};

/// Accounts for authority-only toggles.
#[derive(Accounts)]
pub struct AdminAction<'info> {
    #[account(
        mut,
        has_one = authority @ DistributorError::Unauthorized
    )]
    pub distribution: Account<'info, Distribution>,

    pub authority: Signer<'info>,
}

pub fn handle_update_pause(ctx: Context<AdminAction>, paused: bool) -> Result<()> {
    ctx.accounts.distribution.paused = paused;
    msg!(
        "Distribution {}",
        if paused { "paused" } else { "unpaused" }
    );
    Ok(())
}
