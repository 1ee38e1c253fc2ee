//! Canonical leaf and distribution-identifier digests.
//!
//! Both use keccak-256, the same primitive the on-chain program hashes
//! with. Byte concatenation order is fixed; there is no framing, length
//! prefix, or padding anywhere in either digest.

use solana_program::{keccak::hashv, pubkey::Pubkey};

/// Domain separator mixed into every leaf. Must match the on-chain
/// program verbatim; changing it invalidates all prior distributions.
pub const LEAF_DOMAIN: &[u8] = b"L33_MERKLE_V1";

/// Domain tag for the distribution identifier. Deliberately distinct
/// from [`LEAF_DOMAIN`] so the two digest spaces cannot collide.
pub const DISTRIBUTION_ID_DOMAIN: &[u8] = b"L33_MERKLE_ID_V1";

/// `keccak(LEAF_DOMAIN || distribution_id || recipient || amount_le)`.
pub fn leaf_hash(distribution_id: &[u8; 32], recipient: &Pubkey, amount: u64) -> [u8; 32] {
    hashv(&[
        LEAF_DOMAIN,
        distribution_id,
        recipient.as_ref(),
        &amount.to_le_bytes(),
    ])
    .to_bytes()
}

/// Derive the 32-byte distribution identifier from the identity tuple.
///
/// The identifier doubles as the replay separator: any differing input
/// yields disjoint leaves and disjoint on-chain state. All 32 output
/// bytes are used verbatim; truncated forms are not valid identifiers.
pub fn derive_distribution_id(
    reward_id: &str,
    window_id: &str,
    mint: &Pubkey,
    total_amount: u64,
) -> [u8; 32] {
    hashv(&[
        DISTRIBUTION_ID_DOMAIN,
        reward_id.as_bytes(),
        window_id.as_bytes(),
        mint.as_ref(),
        &total_amount.to_le_bytes(),
    ])
    .to_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domains_are_pinned_and_distinct() {
        assert_eq!(LEAF_DOMAIN, b"L33_MERKLE_V1");
        assert_eq!(DISTRIBUTION_ID_DOMAIN, b"L33_MERKLE_ID_V1");
        assert_ne!(LEAF_DOMAIN, DISTRIBUTION_ID_DOMAIN);
    }

    #[test]
    fn leaf_hash_is_deterministic() {
        let id = [7u8; 32];
        let recipient = Pubkey::new_unique();
        assert_eq!(
            leaf_hash(&id, &recipient, 1000),
            leaf_hash(&id, &recipient, 1000)
        );
    }

    #[test]
    fn leaf_hash_depends_on_every_input() {
        let id = [7u8; 32];
        let recipient = Pubkey::new_unique();
        let base = leaf_hash(&id, &recipient, 1000);

        let mut other_id = id;
        other_id[31] ^= 1;
        assert_ne!(base, leaf_hash(&other_id, &recipient, 1000));
        assert_ne!(base, leaf_hash(&id, &Pubkey::new_unique(), 1000));
        assert_ne!(base, leaf_hash(&id, &recipient, 1001));
    }

    #[test]
    fn distribution_id_depends_on_every_input() {
        let mint = Pubkey::new_unique();
        let base = derive_distribution_id("rewards-q3", "2024-07", &mint, 600);

        assert_ne!(
            base,
            derive_distribution_id("rewards-q4", "2024-07", &mint, 600)
        );
        assert_ne!(
            base,
            derive_distribution_id("rewards-q3", "2024-08", &mint, 600)
        );
        assert_ne!(
            base,
            derive_distribution_id("rewards-q3", "2024-07", &Pubkey::new_unique(), 600)
        );
        assert_ne!(
            base,
            derive_distribution_id("rewards-q3", "2024-07", &mint, 601)
        );
    }
}
