//! Read-only HTTP API serving committed proofs to recipients and
//! operator dashboards.

mod error;
mod router;

use std::{net::SocketAddr, path::PathBuf, str::FromStr, sync::Arc};

use clap::Parser;
use l33_merkle_tree::artifact::DistributionArtifact;
use router::RouterState;
use tracing::info;

use crate::error::ApiError;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// Bind address for the server
    #[clap(long, env, default_value_t = SocketAddr::from_str("0.0.0.0:7001").unwrap())]
    bind_addr: SocketAddr,

    /// Path of the distribution artifact
    #[clap(long, env)]
    artifact_path: PathBuf,
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt().init();

    info!("args: {:?}", args);

    // Loading validates the artifact; a corrupted file never serves.
    let artifact = DistributionArtifact::new_from_file(&args.artifact_path)?;
    info!(
        "loaded distribution {} with {} recipients",
        hex::encode(artifact.distribution_id),
        artifact.recipient_count
    );

    let proofs = artifact
        .proofs
        .iter()
        .map(|entry| (entry.recipient, entry.clone()))
        .collect();
    let state = Arc::new(RouterState { artifact, proofs });

    let app = router::get_routes(state);

    info!("starting server at {}", args.bind_addr);
    axum::Server::bind(&args.bind_addr)
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .await?;

    Ok(())
}
