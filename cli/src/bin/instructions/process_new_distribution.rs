use l33_relayer::instructions::build_initialize_instruction;

use crate::*;

pub fn process_new_distribution(args: &Args, new_args: &NewDistributionArgs) -> Result<()> {
    let artifact = DistributionArtifact::new_from_file(&new_args.artifact_path)?;
    let keypair = read_keypair_file(args.keypair_path.clone().expect("keypair path required"))
        .expect("Failed reading keypair file");

    let client = RpcClient::new_with_commitment(&args.rpc_url, CommitmentConfig::finalized());

    let (distribution, _) = get_distribution_pda(&args.program_id, &artifact.distribution_id);
    if client
        .get_account_with_commitment(&distribution, CommitmentConfig::confirmed())?
        .value
        .is_some()
    {
        println!("distribution {distribution} already initialized, nothing to do");
        return Ok(());
    }

    let ix = build_initialize_instruction(&args.program_id, &args.mint, &keypair.pubkey(), &artifact);
    let blockhash = client.get_latest_blockhash()?;
    let tx = Transaction::new_signed_with_payer(
        &[ix],
        Some(&keypair.pubkey()),
        &[&keypair],
        blockhash,
    );

    let signature = client.send_and_confirm_transaction_with_spinner(&tx)?;
    println!("distribution {distribution} initialized with signature {signature}");
    println!(
        "fund the vault with {} base units before relaying claims",
        artifact.total_amount
    );
    Ok(())
}
