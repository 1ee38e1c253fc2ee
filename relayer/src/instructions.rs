//! Byte-exact instruction builders for the distributor program.
//!
//! Data layout is the program's Anchor wire format: an 8-byte
//! discriminator, then the borsh-encoded arguments. Account order must
//! match the program's account structs position for position.

use l33_merkle_tree::{
    artifact::{DistributionArtifact, ProofEntry},
    utils::{get_claim_marker_pda, get_distribution_pda, get_vault_pda},
};
use solana_program::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    system_program, sysvar,
};
use solana_sdk::compute_budget::ComputeBudgetInstruction;
use spl_associated_token_account::get_associated_token_address;

use crate::config::RelayerConfig;

/// Anchor instruction discriminators: the first 8 bytes of
/// `sha256("global:<instruction_name>")`.
pub mod discriminator {
    pub const INITIALIZE: [u8; 8] = [0xaf, 0xaf, 0x6d, 0x1f, 0x0d, 0x98, 0x9b, 0xed];
    pub const CLAIM: [u8; 8] = [0x3e, 0xc6, 0xd6, 0xc1, 0xd5, 0x9f, 0x6c, 0xd2];
}

/// Position of the claim-marker account within a claim instruction's
/// account list.
pub const CLAIM_MARKER_ACCOUNT_INDEX: usize = 1;

/// Compute-budget hints prepended to every claim transaction.
pub fn compute_budget_instructions(config: &RelayerConfig) -> Vec<Instruction> {
    let mut ixs = vec![ComputeBudgetInstruction::set_compute_unit_limit(
        config.compute_unit_limit,
    )];
    if config.compute_unit_price_micro > 0 {
        ixs.push(ComputeBudgetInstruction::set_compute_unit_price(
            config.compute_unit_price_micro,
        ));
    }
    ixs
}

/// `initialize(distribution_id, merkle_root, total_amount, num_recipients)`.
/// Submitted by the authority (typically through the multisig).
pub fn build_initialize_instruction(
    program_id: &Pubkey,
    mint: &Pubkey,
    authority: &Pubkey,
    artifact: &DistributionArtifact,
) -> Instruction {
    let (distribution, _) = get_distribution_pda(program_id, &artifact.distribution_id);
    let (vault, _) = get_vault_pda(program_id, &artifact.distribution_id);

    let mut data = discriminator::INITIALIZE.to_vec();
    data.extend_from_slice(&artifact.distribution_id);
    data.extend_from_slice(&artifact.merkle_root);
    data.extend_from_slice(&artifact.total_amount.to_le_bytes());
    data.extend_from_slice(&artifact.recipient_count.to_le_bytes());

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*authority, true),
            AccountMeta::new(distribution, false),
            AccountMeta::new_readonly(*mint, false),
            AccountMeta::new(vault, false),
            AccountMeta::new_readonly(spl_token::id(), false),
            AccountMeta::new_readonly(system_program::id(), false),
            AccountMeta::new_readonly(sysvar::rent::id(), false),
        ],
        data,
    }
}

/// `claim(index, amount, proof)` for one committed leaf.
///
/// Data: discriminator, `index` (u64 LE), `amount` (u64 LE), proof
/// length (u32 LE), then the 32-byte nodes. Account order: distribution,
/// claim marker, vault, recipient, recipient token account, payer, token
/// program, system program.
pub fn build_claim_instruction(
    program_id: &Pubkey,
    mint: &Pubkey,
    distribution_id: &[u8; 32],
    payer: &Pubkey,
    entry: &ProofEntry,
) -> Instruction {
    let (distribution, _) = get_distribution_pda(program_id, distribution_id);
    let (claim_marker, _) = get_claim_marker_pda(program_id, &distribution, entry.index);
    let (vault, _) = get_vault_pda(program_id, distribution_id);
    let recipient_token_account = get_associated_token_address(&entry.recipient, mint);

    let mut data = discriminator::CLAIM.to_vec();
    data.extend_from_slice(&entry.index.to_le_bytes());
    data.extend_from_slice(&entry.amount.to_le_bytes());
    data.extend_from_slice(&(entry.proof_nodes.len() as u32).to_le_bytes());
    for node in &entry.proof_nodes {
        data.extend_from_slice(node);
    }

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(distribution, false),
            AccountMeta::new(claim_marker, false),
            AccountMeta::new(vault, false),
            AccountMeta::new_readonly(entry.recipient, false),
            AccountMeta::new(recipient_token_account, false),
            AccountMeta::new(*payer, true),
            AccountMeta::new_readonly(spl_token::id(), false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data,
    }
}

/// Create the recipient's associated token account, funded by the payer.
pub fn build_create_token_account_instruction(
    payer: &Pubkey,
    recipient: &Pubkey,
    mint: &Pubkey,
) -> Instruction {
    spl_associated_token_account::instruction::create_associated_token_account(
        payer,
        recipient,
        mint,
        &spl_token::id(),
    )
}

#[cfg(test)]
mod tests {
    use l33_merkle_tree::{
        artifact::{DistributionArtifact, DistributionParams},
        payout_entry::PayoutEntry,
    };

    use super::*;

    fn artifact() -> DistributionArtifact {
        let params = DistributionParams {
            reward_id: "rewards-q3".to_string(),
            window_id: "2024-07".to_string(),
            mint: Pubkey::new_unique(),
        };
        let entries = vec![
            PayoutEntry {
                index: 0,
                recipient: Pubkey::new_unique(),
                amount: 100,
            },
            PayoutEntry {
                index: 1,
                recipient: Pubkey::new_unique(),
                amount: 200,
            },
        ];
        DistributionArtifact::new(&params, &entries, b"src").unwrap()
    }

    #[test]
    fn claim_data_layout_is_wire_exact() {
        let artifact = artifact();
        let program_id = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let payer = Pubkey::new_unique();

        let entry = &artifact.proofs[1];
        let ix = build_claim_instruction(
            &program_id,
            &mint,
            &artifact.distribution_id,
            &payer,
            entry,
        );

        assert_eq!(&ix.data[..8], &discriminator::CLAIM);
        assert_eq!(&ix.data[8..16], &1u64.to_le_bytes());
        assert_eq!(&ix.data[16..24], &200u64.to_le_bytes());
        let proof_len = u32::from_le_bytes(ix.data[24..28].try_into().unwrap());
        assert_eq!(proof_len as usize, entry.proof_nodes.len());
        assert_eq!(ix.data.len(), 28 + 32 * entry.proof_nodes.len());
        assert_eq!(&ix.data[28..60], &entry.proof_nodes[0]);
    }

    #[test]
    fn claim_account_order() {
        let artifact = artifact();
        let program_id = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let payer = Pubkey::new_unique();
        let entry = &artifact.proofs[0];

        let ix = build_claim_instruction(
            &program_id,
            &mint,
            &artifact.distribution_id,
            &payer,
            entry,
        );

        let (distribution, _) = get_distribution_pda(&program_id, &artifact.distribution_id);
        let (marker, _) = get_claim_marker_pda(&program_id, &distribution, 0);
        let (vault, _) = get_vault_pda(&program_id, &artifact.distribution_id);

        assert_eq!(ix.accounts.len(), 8);
        assert_eq!(ix.accounts[0].pubkey, distribution);
        assert_eq!(ix.accounts[CLAIM_MARKER_ACCOUNT_INDEX].pubkey, marker);
        assert_eq!(ix.accounts[2].pubkey, vault);
        assert_eq!(ix.accounts[3].pubkey, entry.recipient);
        assert_eq!(
            ix.accounts[4].pubkey,
            get_associated_token_address(&entry.recipient, &mint)
        );
        assert_eq!(ix.accounts[5].pubkey, payer);
        assert!(ix.accounts[5].is_signer);
        assert_eq!(ix.accounts[6].pubkey, spl_token::id());
        assert_eq!(ix.accounts[7].pubkey, system_program::id());
    }

    #[test]
    fn initialize_data_layout() {
        let artifact = artifact();
        let program_id = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let authority = Pubkey::new_unique();

        let ix = build_initialize_instruction(&program_id, &mint, &authority, &artifact);

        assert_eq!(&ix.data[..8], &discriminator::INITIALIZE);
        assert_eq!(&ix.data[8..40], &artifact.distribution_id);
        assert_eq!(&ix.data[40..72], &artifact.merkle_root);
        assert_eq!(&ix.data[72..80], &artifact.total_amount.to_le_bytes());
        assert_eq!(&ix.data[80..88], &artifact.recipient_count.to_le_bytes());
        assert_eq!(ix.data.len(), 88);
    }

    #[test]
    fn compute_budget_prefix_respects_zero_price() {
        let mut config = RelayerConfig::default();
        config.compute_unit_price_micro = 0;
        assert_eq!(compute_budget_instructions(&config).len(), 1);
        config.compute_unit_price_micro = 1_000;
        assert_eq!(compute_budget_instructions(&config).len(), 2);
    }
}
