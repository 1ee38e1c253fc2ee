use l33_merkle_tree::payout_entry;

use crate::*;

pub fn process_create_artifact(args: &Args, create_args: &CreateArtifactArgs) -> Result<()> {
    // The raw bytes are fingerprinted line-exact for operator audit.
    let source_input = std::fs::read(&create_args.csv_path)?;
    let rows = CsvEntry::new_from_file(&create_args.csv_path)?;
    let entries = payout_entry::ingest(&rows, &args.mint)?;

    let params = DistributionParams {
        reward_id: create_args.reward_id.clone(),
        window_id: create_args.window_id.clone(),
        mint: args.mint,
    };
    let artifact = DistributionArtifact::new(&params, &entries, &source_input)?;
    artifact.write_to_file(&create_args.artifact_path)?;

    println!(
        "created artifact for {} recipients, total {} base units",
        artifact.recipient_count, artifact.total_amount
    );
    println!("distribution id: {}", hex::encode(artifact.distribution_id));
    println!("merkle root:     {}", hex::encode(artifact.merkle_root));
    Ok(())
}
