//! Operator CLI for the L33 merkle distribution engine.

pub mod instructions;

use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use clap::{Parser, Subcommand};
use l33_merkle_tree::{
    artifact::{DistributionArtifact, DistributionParams},
    payout_entry::CsvEntry,
    utils::get_distribution_pda,
};
use l33_relayer::RelayerConfig;
use solana_program::pubkey::Pubkey;
use solana_rpc_client::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    signer::{keypair::read_keypair_file, Signer},
    transaction::Transaction,
};

use crate::instructions::*;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Commands,

    /// SPL mint address
    #[clap(long, env, default_value_t = Pubkey::default())]
    pub mint: Pubkey,

    /// RPC url
    #[clap(long, env, default_value = "http://localhost:8899")]
    pub rpc_url: String,

    /// Program id
    #[clap(long, env, default_value_t = merkle_distributor::id())]
    pub program_id: Pubkey,

    /// Payer keypair
    #[clap(long, env)]
    pub keypair_path: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a distribution artifact from a payout CSV
    CreateArtifact(CreateArtifactArgs),
    /// Re-check every invariant of a stored artifact
    VerifyArtifact(VerifyArtifactArgs),
    /// Submit the initialize instruction for a new distribution
    NewDistribution(NewDistributionArgs),
    /// Drive claims for a distribution until confirmed
    Relay(RelayArgs),
    /// Print one recipient's committed proof
    Proof(ProofArgs),
    /// Generate a synthetic payout CSV for testing
    CreateDummyCsv(CreateDummyCsvArgs),
}

#[derive(Parser, Debug)]
pub struct CreateArtifactArgs {
    /// Payout CSV path
    #[clap(long, env)]
    pub csv_path: PathBuf,

    /// Artifact out path
    #[clap(long, env)]
    pub artifact_path: PathBuf,

    /// Reward identifier (e.g. "rewards-q3")
    #[clap(long, env)]
    pub reward_id: String,

    /// Payout window identifier (e.g. "2024-07")
    #[clap(long, env)]
    pub window_id: String,
}

#[derive(Parser, Debug)]
pub struct VerifyArtifactArgs {
    /// Artifact path
    #[clap(long, env)]
    pub artifact_path: PathBuf,
}

#[derive(Parser, Debug)]
pub struct NewDistributionArgs {
    /// Artifact path
    #[clap(long, env)]
    pub artifact_path: PathBuf,
}

#[derive(Parser, Debug)]
pub struct RelayArgs {
    /// Artifact path
    #[clap(long, env)]
    pub artifact_path: PathBuf,

    /// Claims per transaction
    #[clap(long, env, default_value_t = 4)]
    pub batch_size: usize,

    /// Submission budget per claim
    #[clap(long, env, default_value_t = 3)]
    pub max_attempts: u32,

    #[clap(long, env, default_value_t = 500)]
    pub retry_delay_ms: u64,

    #[clap(long, env, default_value_t = 200)]
    pub inter_batch_delay_ms: u64,

    #[clap(long, env, default_value_t = 400_000)]
    pub compute_unit_limit: u32,

    #[clap(long, env, default_value_t = 0)]
    pub compute_unit_price_micro: u64,
}

#[derive(Parser, Debug)]
pub struct ProofArgs {
    /// Artifact path
    #[clap(long, env)]
    pub artifact_path: PathBuf,

    /// Recipient to look up
    #[clap(long, env)]
    pub recipient: Pubkey,
}

#[derive(Parser, Debug)]
pub struct CreateDummyCsvArgs {
    /// CSV out path
    #[clap(long, env)]
    pub csv_path: PathBuf,

    #[clap(long, env)]
    pub num_records: u64,

    /// Amount per recipient, in base units
    #[clap(long, env)]
    pub amount: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();

    let args = Args::parse();
    match &args.command {
        Commands::CreateArtifact(create_args) => process_create_artifact(&args, create_args),
        Commands::VerifyArtifact(verify_args) => process_verify_artifact(verify_args),
        Commands::NewDistribution(new_args) => process_new_distribution(&args, new_args),
        Commands::Relay(relay_args) => process_relay(&args, relay_args).await,
        Commands::Proof(proof_args) => process_proof(proof_args),
        Commands::CreateDummyCsv(csv_args) => process_create_dummy_csv(csv_args),
    }
}
