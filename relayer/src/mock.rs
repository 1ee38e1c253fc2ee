//! In-memory ledger for development and tests.
//!
//! The mock executes submitted transactions against a small model of
//! chain truth: claim markers are accounts whose existence blocks
//! replays, token accounts carry balances, and transport failures can be
//! scripted ahead of time. A transaction is atomic: no state is
//! committed when any instruction fails.

use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::{Arc, RwLock},
};

use async_trait::async_trait;
use solana_program::pubkey::Pubkey;
use solana_sdk::{hash::Hash, signature::Signature, transaction::Transaction};

use crate::{
    instructions::{discriminator, CLAIM_MARKER_ACCOUNT_INDEX},
    ledger::{LedgerClient, LedgerError},
};

#[derive(Default)]
struct MockLedgerState {
    accounts: HashSet<Pubkey>,
    token_balances: HashMap<Pubkey, u64>,
    /// Errors returned by the next submissions, in order.
    scripted_errors: VecDeque<LedgerError>,
    /// Every transaction handed to `send_and_confirm`, including ones
    /// that failed.
    submissions: Vec<Transaction>,
    tx_counter: u64,
}

pub struct MockLedger {
    program_id: Pubkey,
    state: Arc<RwLock<MockLedgerState>>,
}

impl MockLedger {
    pub fn new(program_id: Pubkey) -> Self {
        Self {
            program_id,
            state: Arc::new(RwLock::new(MockLedgerState::default())),
        }
    }

    pub fn add_account(&self, address: Pubkey) {
        self.state
            .write()
            .expect("mock ledger lock poisoned")
            .accounts
            .insert(address);
    }

    /// Create a token account with a balance (the vault, or a recipient
    /// account that already exists).
    pub fn set_token_balance(&self, address: Pubkey, amount: u64) {
        let mut state = self.state.write().expect("mock ledger lock poisoned");
        state.accounts.insert(address);
        state.token_balances.insert(address, amount);
    }

    pub fn token_balance(&self, address: &Pubkey) -> Option<u64> {
        self.state
            .read()
            .expect("mock ledger lock poisoned")
            .token_balances
            .get(address)
            .copied()
    }

    /// Queue an error for an upcoming submission.
    pub fn script_error(&self, error: LedgerError) {
        self.state
            .write()
            .expect("mock ledger lock poisoned")
            .scripted_errors
            .push_back(error);
    }

    pub fn submissions(&self) -> Vec<Transaction> {
        self.state
            .read()
            .expect("mock ledger lock poisoned")
            .submissions
            .clone()
    }

    fn next_signature(state: &mut MockLedgerState) -> Signature {
        state.tx_counter += 1;
        let mut bytes = [0u8; 64];
        bytes[..8].copy_from_slice(&state.tx_counter.to_le_bytes());
        bytes[8..16].copy_from_slice(b"mocktxn!");
        Signature::from(bytes)
    }

    fn execute(
        &self,
        state: &mut MockLedgerState,
        transaction: &Transaction,
    ) -> Result<(), LedgerError> {
        // Stage mutations; commit only if the whole transaction succeeds.
        let mut accounts = state.accounts.clone();
        let mut balances = state.token_balances.clone();

        let message = &transaction.message;
        for ci in &message.instructions {
            let program = message.account_keys[ci.program_id_index as usize];
            let keys: Vec<Pubkey> = ci
                .accounts
                .iter()
                .map(|i| message.account_keys[*i as usize])
                .collect();

            if program == spl_associated_token_account::id() {
                // create_associated_token_account: the new account is at
                // position 1.
                let ata = keys[1];
                accounts.insert(ata);
                balances.entry(ata).or_insert(0);
            } else if program == self.program_id && ci.data.starts_with(&discriminator::CLAIM) {
                let marker = keys[CLAIM_MARKER_ACCOUNT_INDEX];
                if accounts.contains(&marker) {
                    return Err(LedgerError::AlreadyClaimed);
                }

                let amount = u64::from_le_bytes(
                    ci.data[16..24].try_into().expect("claim data carries amount"),
                );
                let vault = keys[2];
                let recipient_token_account = keys[4];

                if !accounts.contains(&recipient_token_account) {
                    return Err(LedgerError::Transport(
                        "recipient token account not found".to_string(),
                    ));
                }

                let vault_balance = balances.get(&vault).copied().unwrap_or(0);
                if vault_balance < amount {
                    return Err(LedgerError::InsufficientFunds);
                }

                accounts.insert(marker);
                balances.insert(vault, vault_balance - amount);
                *balances.entry(recipient_token_account).or_insert(0) += amount;
            }
        }

        state.accounts = accounts;
        state.token_balances = balances;
        Ok(())
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn account_exists(&self, address: &Pubkey) -> Result<bool, LedgerError> {
        Ok(self
            .state
            .read()
            .expect("mock ledger lock poisoned")
            .accounts
            .contains(address))
    }

    async fn token_account_balance(
        &self,
        address: &Pubkey,
    ) -> Result<Option<u64>, LedgerError> {
        Ok(self
            .state
            .read()
            .expect("mock ledger lock poisoned")
            .token_balances
            .get(address)
            .copied())
    }

    async fn latest_blockhash(&self) -> Result<Hash, LedgerError> {
        Ok(Hash::new_unique())
    }

    async fn send_and_confirm(
        &self,
        transaction: &Transaction,
    ) -> Result<Signature, LedgerError> {
        let mut state = self.state.write().expect("mock ledger lock poisoned");
        state.submissions.push(transaction.clone());

        if let Some(error) = state.scripted_errors.pop_front() {
            return Err(error);
        }

        self.execute(&mut state, transaction)?;
        Ok(Self::next_signature(&mut state))
    }
}
