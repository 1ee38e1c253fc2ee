use anchor_lang::prelude::*;

#[error_code]
pub enum DistributorError {
    #[msg("Invalid Merkle proof")]
    InvalidProof,
    #[msg("Distribution is paused")]
    Paused,
    #[msg("Unauthorized")]
    Unauthorized,
    #[msg("Invalid vault")]
    InvalidVault,
    #[msg("Arithmetic overflow")]
    Overflow,
    #[msg("Proof too long")]
    ProofTooLong,
}
