use crate::*;

pub fn process_verify_artifact(verify_args: &VerifyArtifactArgs) -> Result<()> {
    // Loading re-checks every invariant, including folding each proof
    // back to the committed root.
    let artifact = DistributionArtifact::new_from_file(&verify_args.artifact_path)?;

    println!("artifact valid");
    println!("distribution id: {}", hex::encode(artifact.distribution_id));
    println!("merkle root:     {}", hex::encode(artifact.merkle_root));
    println!("recipients:      {}", artifact.recipient_count);
    println!("total amount:    {}", artifact.total_amount);
    Ok(())
}
