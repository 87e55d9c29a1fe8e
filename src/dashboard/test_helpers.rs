use alloy::primitives::{Address, TxHash, B256, U256};
use eyre::{eyre, Result};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::config::PoolConfig;
use crate::staking::StakingApi;
use crate::wallet::WalletSource;

/// Transaction recorded by [`MockStaking`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockTx {
    /// `manualEpochInit(tokens, epoch)`
    EpochInit(Vec<Address>, u128),
    /// `withdraw(token, amount)`
    Withdraw(Address, U256),
}

/// In-memory staking contract
#[derive(Debug, Default)]
pub struct MockStaking {
    current_epoch: u128,
    initialized: Mutex<HashMap<Address, BTreeSet<u128>>>,
    balances: Mutex<HashMap<(Address, Address), U256>>,
    decimals: HashMap<Address, u8>,
    failing_tokens: HashSet<Address>,
    fail_epoch_checks: bool,
    initialized_checks: AtomicUsize,
    decimals_calls: AtomicUsize,
    transactions: Mutex<Vec<MockTx>>,
}

#[allow(dead_code)]
impl MockStaking {
    pub fn with_current_epoch(mut self, epoch: u128) -> Self {
        self.current_epoch = epoch;
        self
    }

    pub fn with_initialized(self, token: Address, epochs: &[u128]) -> Self {
        self.initialized
            .lock()
            .unwrap()
            .entry(token)
            .or_default()
            .extend(epochs.iter().copied());
        self
    }

    pub fn with_balance(self, user: Address, token: Address, amount: u64) -> Self {
        self.balances
            .lock()
            .unwrap()
            .insert((user, token), U256::from(amount));
        self
    }

    pub fn with_decimals(mut self, token: Address, decimals: u8) -> Self {
        self.decimals.insert(token, decimals);
        self
    }

    /// Every call touching `token` fails
    pub fn failing_token(mut self, token: Address) -> Self {
        self.failing_tokens.insert(token);
        self
    }

    /// Every `epochIsInitialized` call fails
    pub fn failing_epoch_checks(mut self) -> Self {
        self.fail_epoch_checks = true;
        self
    }

    pub fn initialized_checks(&self) -> usize {
        self.initialized_checks.load(Ordering::SeqCst)
    }

    pub fn decimals_calls(&self) -> usize {
        self.decimals_calls.load(Ordering::SeqCst)
    }

    pub fn transactions(&self) -> Vec<MockTx> {
        self.transactions.lock().unwrap().clone()
    }

    fn check_token(&self, token: Address) -> Result<()> {
        if self.failing_tokens.contains(&token) {
            Err(eyre!("rpc error for {token}"))
        } else {
            Ok(())
        }
    }

    fn tx_hash(&self) -> TxHash {
        let count = self.transactions.lock().unwrap().len();
        B256::with_last_byte(u8::try_from(count).unwrap_or(u8::MAX))
    }
}

impl StakingApi for MockStaking {
    async fn current_epoch(&self) -> Result<u128> {
        Ok(self.current_epoch)
    }

    async fn epoch_is_initialized(&self, token: Address, epoch: u128) -> Result<bool> {
        self.initialized_checks.fetch_add(1, Ordering::SeqCst);
        self.check_token(token)?;
        if self.fail_epoch_checks {
            return Err(eyre!("epochIsInitialized failed"));
        }
        Ok(self
            .initialized
            .lock()
            .unwrap()
            .get(&token)
            .is_some_and(|epochs| epochs.contains(&epoch)))
    }

    async fn balance_of(&self, user: Address, token: Address) -> Result<U256> {
        self.check_token(token)?;
        Ok(self
            .balances
            .lock()
            .unwrap()
            .get(&(user, token))
            .copied()
            .unwrap_or_default())
    }

    async fn decimals(&self, token: Address) -> Result<u8> {
        self.decimals_calls.fetch_add(1, Ordering::SeqCst);
        self.check_token(token)?;
        Ok(self.decimals.get(&token).copied().unwrap_or(18))
    }

    async fn manual_epoch_init(&self, tokens: Vec<Address>, epoch: u128) -> Result<TxHash> {
        let mut initialized = self.initialized.lock().unwrap();
        for token in &tokens {
            initialized.entry(*token).or_default().insert(epoch);
        }
        drop(initialized);
        self.transactions
            .lock()
            .unwrap()
            .push(MockTx::EpochInit(tokens, epoch));
        Ok(self.tx_hash())
    }

    async fn withdraw(&self, token: Address, amount: U256) -> Result<TxHash> {
        let mut balances = self.balances.lock().unwrap();
        for ((_, t), balance) in balances.iter_mut() {
            if *t == token {
                *balance = balance.saturating_sub(amount);
            }
        }
        drop(balances);
        self.transactions
            .lock()
            .unwrap()
            .push(MockTx::Withdraw(token, amount));
        Ok(self.tx_hash())
    }
}

/// In-memory wallet whose accounts and network can be switched by the test
#[derive(Debug, Default)]
pub struct MockWallet {
    accounts: Mutex<Vec<Address>>,
    chain_id: Mutex<u64>,
}

#[allow(dead_code)]
impl MockWallet {
    pub fn new(accounts: &[Address], chain_id: u64) -> Self {
        Self {
            accounts: Mutex::new(accounts.to_vec()),
            chain_id: Mutex::new(chain_id),
        }
    }

    pub fn set_accounts(&self, accounts: &[Address]) {
        *self.accounts.lock().unwrap() = accounts.to_vec();
    }

    pub fn set_chain_id(&self, chain_id: u64) {
        *self.chain_id.lock().unwrap() = chain_id;
    }
}

impl WalletSource for MockWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>> {
        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn chain_id(&self) -> Result<u64> {
        Ok(*self.chain_id.lock().unwrap())
    }
}

pub fn staking() -> MockStaking {
    MockStaking::default()
}

pub fn token(id: u8) -> Address {
    Address::with_last_byte(id)
}

pub fn account(id: u8) -> Address {
    Address::repeat_byte(id)
}

pub fn pool(name: &str, id: u8) -> PoolConfig {
    PoolConfig {
        name: name.to_string(),
        token: token(id),
    }
}
