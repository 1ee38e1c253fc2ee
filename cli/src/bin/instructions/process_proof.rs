use crate::*;

pub fn process_proof(proof_args: &ProofArgs) -> Result<()> {
    let artifact = DistributionArtifact::new_from_file(&proof_args.artifact_path)?;

    let entry = artifact
        .proof_for(&proof_args.recipient)
        .ok_or_else(|| anyhow::anyhow!("{} is not in this distribution", proof_args.recipient))?;

    println!("{}", serde_json::to_string_pretty(entry)?);
    Ok(())
}
