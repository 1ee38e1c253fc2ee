use std::{collections::HashMap, str::FromStr, sync::Arc, time::Duration};

use axum::{
    body::Body,
    error_handling::HandleErrorLayer,
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use http::Request;
use l33_merkle_tree::artifact::{DistributionArtifact, ProofEntry};
use serde::{Deserialize, Serialize};
use solana_program::pubkey::Pubkey;
use tower::{
    buffer::BufferLayer, limit::RateLimitLayer, load_shed::LoadShedLayer, timeout::TimeoutLayer,
    ServiceBuilder,
};
use tower_http::{
    trace::{DefaultOnResponse, TraceLayer},
    LatencyUnit,
};
use tracing::{info, instrument, Span};

use crate::{error, error::ApiError, Result};

#[derive(Debug)]
pub struct RouterState {
    pub artifact: DistributionArtifact,
    pub proofs: HashMap<Pubkey, ProofEntry>,
}

#[instrument]
pub fn get_routes(state: Arc<RouterState>) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(error::handle_error))
        .layer(BufferLayer::new(1000))
        .layer(RateLimitLayer::new(10000, Duration::from_secs(1)))
        .layer(TimeoutLayer::new(Duration::from_secs(20)))
        .layer(LoadShedLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started {} {}", request.method(), request.uri().path())
                })
                .on_response(
                    DefaultOnResponse::new()
                        .level(tracing_core::Level::INFO)
                        .latency_unit(LatencyUnit::Millis),
                ),
        );

    let router = Router::new()
        .route("/", get(root))
        .route("/distribution", get(get_distribution))
        .route("/user/:recipient", get(get_user_proof));

    router.layer(middleware).with_state(state)
}

/// Retrieve the committed proof for a given recipient.
#[instrument(ret)]
async fn get_user_proof(
    State(state): State<Arc<RouterState>>,
    Path(recipient): Path<String>,
) -> Result<impl IntoResponse> {
    let recipient = Pubkey::from_str(recipient.as_str())?;
    let entry = state
        .proofs
        .get(&recipient)
        .ok_or(ApiError::RecipientNotFound(recipient.to_string()))?;

    let proof = ProofResponse {
        distribution_id: hex::encode(state.artifact.distribution_id),
        index: entry.index,
        recipient: recipient.to_string(),
        amount: entry.amount.to_string(),
        proof: entry.proof_nodes.iter().map(hex::encode).collect(),
    };

    Ok(Json(proof))
}

async fn get_distribution(State(state): State<Arc<RouterState>>) -> Result<impl IntoResponse> {
    let artifact = &state.artifact;
    Ok(Json(DistributionSummary {
        distribution_id: hex::encode(artifact.distribution_id),
        merkle_root: hex::encode(artifact.merkle_root),
        recipient_count: artifact.recipient_count,
        total_amount: artifact.total_amount.to_string(),
        format_version: artifact.format_version.clone(),
        created_at: artifact.created_at,
    }))
}

async fn root() -> impl IntoResponse {
    "L33 Distribution API"
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DistributionSummary {
    pub distribution_id: String,
    pub merkle_root: String,
    pub recipient_count: u64,
    pub total_amount: String,
    pub format_version: String,
    pub created_at: u64,
}

#[derive(Serialize, Deserialize, Debug)]
struct ProofResponse {
    pub distribution_id: String,
    pub index: u64,
    pub recipient: String,
    /// Base-10 string, as in the artifact wire format.
    pub amount: String,
    pub proof: Vec<String>,
}
