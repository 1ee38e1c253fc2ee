//! [`LedgerClient`] over the Solana JSON-RPC.

use async_trait::async_trait;
use solana_program::pubkey::Pubkey;
use solana_rpc_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig, hash::Hash, signature::Signature,
    transaction::Transaction,
};
use tracing::debug;

use crate::ledger::{classify_rpc_error, LedgerClient, LedgerError};

pub struct RpcLedgerClient {
    client: RpcClient,
}

impl RpcLedgerClient {
    pub fn new(rpc_endpoint: &str) -> Self {
        Self {
            client: RpcClient::new_with_commitment(
                rpc_endpoint.to_string(),
                CommitmentConfig::confirmed(),
            ),
        }
    }

    pub fn url(&self) -> String {
        self.client.url()
    }
}

#[async_trait]
impl LedgerClient for RpcLedgerClient {
    async fn account_exists(&self, address: &Pubkey) -> Result<bool, LedgerError> {
        match self.client.get_account(address).await {
            Ok(_) => Ok(true),
            // The RPC reports a missing account as an error, not an
            // Option; anything else is a transport problem.
            Err(e) if e.to_string().contains("AccountNotFound") => Ok(false),
            Err(e) => Err(LedgerError::Transport(e.to_string())),
        }
    }

    async fn token_account_balance(
        &self,
        address: &Pubkey,
    ) -> Result<Option<u64>, LedgerError> {
        match self.client.get_token_account_balance(address).await {
            Ok(balance) => {
                let amount = balance
                    .amount
                    .parse::<u64>()
                    .map_err(|e| LedgerError::Transport(format!("bad balance string: {e}")))?;
                Ok(Some(amount))
            }
            Err(e) if e.to_string().contains("could not find account") => Ok(None),
            Err(e) if e.to_string().contains("AccountNotFound") => Ok(None),
            Err(e) => Err(LedgerError::Transport(e.to_string())),
        }
    }

    async fn latest_blockhash(&self) -> Result<Hash, LedgerError> {
        self.client
            .get_latest_blockhash()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))
    }

    async fn send_and_confirm(
        &self,
        transaction: &Transaction,
    ) -> Result<Signature, LedgerError> {
        match self.client.send_and_confirm_transaction(transaction).await {
            Ok(signature) => {
                debug!(%signature, "transaction confirmed");
                Ok(signature)
            }
            Err(e) => Err(classify_rpc_error(&e.to_string())),
        }
    }
}
