use solana_program::pubkey::Pubkey;

/// Seed strings shared with the on-chain program. Verbatim; the account
/// layout breaks if any of these change.
pub const DISTRIBUTION_SEED: &[u8] = b"distribution";
pub const VAULT_SEED: &[u8] = b"vault";
pub const CLAIM_SEED: &[u8] = b"claim";

/// Distribution account address: `("distribution", distribution_id)`.
pub fn get_distribution_pda(program_id: &Pubkey, distribution_id: &[u8; 32]) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[DISTRIBUTION_SEED, distribution_id.as_ref()], program_id)
}

/// Vault token account address: `("vault", distribution_id)`.
pub fn get_vault_pda(program_id: &Pubkey, distribution_id: &[u8; 32]) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[VAULT_SEED, distribution_id.as_ref()], program_id)
}

/// Uniqueness marker for one leaf: `("claim", distribution_pubkey, index_le)`.
/// Its existence on chain means the leaf has been paid.
pub fn get_claim_marker_pda(
    program_id: &Pubkey,
    distribution: &Pubkey,
    index: u64,
) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[
            CLAIM_SEED,
            distribution.as_ref(),
            index.to_le_bytes().as_ref(),
        ],
        program_id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdas_are_deterministic_and_disjoint() {
        let program_id = Pubkey::new_unique();
        let id = [3u8; 32];

        let (dist, _) = get_distribution_pda(&program_id, &id);
        let (vault, _) = get_vault_pda(&program_id, &id);
        assert_eq!(dist, get_distribution_pda(&program_id, &id).0);
        assert_ne!(dist, vault);

        let (marker0, _) = get_claim_marker_pda(&program_id, &dist, 0);
        let (marker1, _) = get_claim_marker_pda(&program_id, &dist, 1);
        assert_ne!(marker0, marker1);
    }

    #[test]
    fn distinct_distribution_ids_get_distinct_accounts() {
        let program_id = Pubkey::new_unique();
        let (a, _) = get_distribution_pda(&program_id, &[1u8; 32]);
        let (b, _) = get_distribution_pda(&program_id, &[2u8; 32]);
        assert_ne!(a, b);
    }
}
