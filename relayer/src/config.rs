//! Relayer configuration.
//!
//! All tunables are explicit inputs constructed at program entry and
//! passed down; nothing is read from the process environment here.

use std::time::Duration;

use solana_program::pubkey::Pubkey;

#[derive(Debug, Clone)]
pub struct RelayerConfig {
    /// Ledger RPC endpoint.
    pub rpc_endpoint: String,
    /// The distributor program.
    pub program_id: Pubkey,
    /// Mint being distributed.
    pub mint: Pubkey,
    /// Claims per transaction. Bounded by the transaction-size limit;
    /// each claim carries a full proof, so this stays small.
    pub batch_size: usize,
    /// Per-claim submission budget. Also bounds transaction-level
    /// retries within one submission.
    pub max_attempts: u32,
    /// Wait between transaction-level retries.
    pub retry_delay: Duration,
    /// Polite pause between batches so one distribution does not
    /// saturate the RPC.
    pub inter_batch_delay: Duration,
    /// Compute-budget hints prepended to every claim transaction.
    pub compute_unit_limit: u32,
    pub compute_unit_price_micro: u64,
}

impl Default for RelayerConfig {
    fn default() -> Self {
        Self {
            rpc_endpoint: "https://api.devnet.solana.com".to_string(),
            program_id: Pubkey::default(),
            mint: Pubkey::default(),
            batch_size: 4,
            max_attempts: 3,
            retry_delay: Duration::from_millis(500),
            inter_batch_delay: Duration::from_millis(200),
            compute_unit_limit: 400_000,
            compute_unit_price_micro: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = RelayerConfig::default();
        assert!(config.batch_size >= 1);
        assert!(config.max_attempts >= 1);
        assert!(config.rpc_endpoint.contains("solana"));
    }
}
