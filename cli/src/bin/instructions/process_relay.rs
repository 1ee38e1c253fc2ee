use l33_relayer::{MemoryClaimStore, Relayer, RpcLedgerClient};

use crate::*;

pub async fn process_relay(args: &Args, relay_args: &RelayArgs) -> Result<()> {
    let artifact = DistributionArtifact::new_from_file(&relay_args.artifact_path)?;
    let keypair = read_keypair_file(args.keypair_path.clone().expect("keypair path required"))
        .expect("Failed reading keypair file");

    let config = RelayerConfig {
        rpc_endpoint: args.rpc_url.clone(),
        program_id: args.program_id,
        mint: args.mint,
        batch_size: relay_args.batch_size,
        max_attempts: relay_args.max_attempts,
        retry_delay: Duration::from_millis(relay_args.retry_delay_ms),
        inter_batch_delay: Duration::from_millis(relay_args.inter_batch_delay_ms),
        compute_unit_limit: relay_args.compute_unit_limit,
        compute_unit_price_micro: relay_args.compute_unit_price_micro,
    };

    let ledger = RpcLedgerClient::new(&config.rpc_endpoint);
    // The store starts empty on every run; ledger reconciliation
    // re-confirms anything already paid before new work is submitted.
    let relayer = Relayer::new(config, MemoryClaimStore::new(), ledger, keypair);

    let summary = relayer.run(&artifact).await?;
    println!(
        "confirmed {} ({} reconciled from chain), failed {}, unconfirmed {}",
        summary.confirmed, summary.reconciled, summary.failed, summary.unconfirmed
    );

    if summary.unconfirmed > 0 {
        anyhow::bail!("{} claims remain unconfirmed", summary.unconfirmed);
    }
    Ok(())
}
