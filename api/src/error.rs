use std::convert::Infallible;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    BoxError, Json,
};
use l33_merkle_tree::error::MerkleTreeError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use solana_program::pubkey::ParsePubkeyError;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("artifact error: {0}")]
    ArtifactError(#[from] MerkleTreeError),

    #[error("recipient {0} not found")]
    RecipientNotFound(String),

    #[error("parse pubkey error")]
    ParsePubkeyError(#[from] ParsePubkeyError),

    #[error("internal error")]
    InternalError,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::ArtifactError(_) => {
                error!("artifact error: {:?}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
            ApiError::RecipientNotFound(recipient) => {
                error!("recipient {recipient} not found");
                (StatusCode::NOT_FOUND, "Recipient not found")
            }
            ApiError::ParsePubkeyError(e) => {
                error!("parse pubkey error: {e}");
                (StatusCode::BAD_REQUEST, "Invalid recipient address")
            }
            ApiError::InternalError => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"),
        };
        (
            status,
            Json(ErrorBody {
                error: error_message.to_string(),
            }),
        )
            .into_response()
    }
}

pub async fn handle_error(error: BoxError) -> Result<impl IntoResponse, Infallible> {
    if error.is::<tower::timeout::error::Elapsed>() {
        return Ok((
            StatusCode::REQUEST_TIMEOUT,
            Json(json!({
                "code" : 408,
                "error" : "Request Timeout",
            })),
        ));
    };
    if error.is::<tower::load_shed::error::Overloaded>() {
        return Ok((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "code" : 503,
                "error" : "Service Unavailable",
            })),
        ));
    }

    Ok((
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "code" : 500,
            "error" : "Internal Server Error",
        })),
    ))
}
