//! # Pool dashboard
//!
//! Holds the per-session view of every configured pool: the contract's current
//! epoch, each pool's latest initialized epoch, and the holder's balances. All
//! of it is rebuilt from the chain by [`Dashboard::refresh`]; nothing outlives
//! the session.

/// Sync / withdraw derivation
pub mod action;
/// Backward epoch scan
pub mod epoch;
/// Text and JSON output
pub mod render;
#[cfg(test)]
pub(crate) mod test_helpers;

use alloy::primitives::{Address, TxHash, U256};
use eyre::{eyre, Result};
use futures_util::future::join_all;
use log::{error, info, warn};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::config::PoolConfig;
use crate::staking::StakingApi;
use crate::utils::format::format_balance;

pub use action::{derive_action, epoch_status, next_epoch, EpochStatus, PoolAction};
pub use epoch::find_latest_initialized_epoch;

/// One rendered line of the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolRow {
    /// Pool name
    pub name: String,
    /// Staked token address
    pub token: Address,
    /// Latest initialized epoch, `None` if no epoch was ever initialized
    pub epoch: Option<u128>,
    /// Distance to the current epoch
    pub status: EpochStatus,
    /// Raw balance, `None` when unknown
    pub balance: Option<U256>,
    /// Balance formatted with the token decimals
    pub balance_pretty: String,
    /// Derived action
    pub action: PoolAction,
}

/// Result of the independent lookups for one pool
struct PoolLookup {
    /// Pool name
    name: String,
    /// Epoch scan outcome
    epoch: Result<Option<u128>>,
    /// Balance and token decimals, skipped without a holder
    balance: Option<Result<(U256, u8)>>,
}

/// Per-session pool state over a [`StakingApi`]
pub struct Dashboard<A> {
    /// Contract access
    api: A,
    /// Configured pools
    pools: Vec<PoolConfig>,
    /// Address whose balances are shown
    holder: Option<Address>,
    /// Connected account that signs transactions
    account: Option<Address>,
    /// Contract's current epoch, once fetched
    current_epoch: Option<u128>,
    /// Latest initialized epoch per scanned pool
    epochs: BTreeMap<String, Option<u128>>,
    /// Raw balances per pool
    balances: HashMap<String, U256>,
    /// Token decimals, fetched once per session
    token_decimals: HashMap<Address, u8>,
}

impl<A: StakingApi> Dashboard<A> {
    /// Creates an empty dashboard; call [`Dashboard::refresh`] to populate it
    pub fn new(api: A, pools: Vec<PoolConfig>, holder: Option<Address>) -> Self {
        Self {
            api,
            pools,
            holder,
            account: holder,
            current_epoch: None,
            epochs: BTreeMap::new(),
            balances: HashMap::new(),
            token_decimals: HashMap::new(),
        }
    }

    #[cfg(test)]
    pub(crate) const fn api(&self) -> &A {
        &self.api
    }

    /// Current epoch as of the last refresh
    pub const fn current_epoch(&self) -> Option<u128> {
        self.current_epoch
    }

    /// Address whose balances are shown
    pub const fn holder(&self) -> Option<Address> {
        self.holder
    }

    /// Switches the holder and forgets balances read for the previous one
    pub fn set_holder(&mut self, holder: Option<Address>) {
        if self.holder != holder {
            self.holder = holder;
            self.balances.clear();
        }
    }

    /// Switches the connected account used to sign withdrawals
    pub fn set_account(&mut self, account: Option<Address>) {
        self.account = account;
    }

    /// Re-reads the current epoch, then every pool's epoch and balance.
    ///
    /// Pool lookups run concurrently and independently; a failing pool is
    /// logged and left out without affecting the others.
    ///
    /// # Errors
    /// * If the current epoch cannot be read
    pub async fn refresh(&mut self) -> Result<()> {
        let current = self.api.current_epoch().await?;
        info!("dashboard::refresh: current epoch {current}");
        self.current_epoch = Some(current);

        let lookups = join_all(
            self.pools
                .iter()
                .map(|pool| self.lookup_pool(pool, current)),
        )
        .await;

        for lookup in lookups {
            self.apply(lookup);
        }
        Ok(())
    }

    /// Runs the epoch scan and the balance read of one pool side by side
    async fn lookup_pool(&self, pool: &PoolConfig, current: u128) -> PoolLookup {
        let epoch = find_latest_initialized_epoch(&self.api, pool.token, current);
        let balance = async {
            match self.holder {
                Some(holder) => Some(self.read_balance(holder, pool.token).await),
                None => None,
            }
        };
        let (epoch, balance) = futures::join!(epoch, balance);

        PoolLookup {
            name: pool.name.clone(),
            epoch,
            balance,
        }
    }

    async fn read_balance(&self, holder: Address, token: Address) -> Result<(U256, u8)> {
        let decimals = match self.token_decimals.get(&token) {
            Some(decimals) => *decimals,
            None => self.api.decimals(token).await?,
        };
        let balance = self.api.balance_of(holder, token).await?;
        Ok((balance, decimals))
    }

    fn apply(&mut self, lookup: PoolLookup) {
        match lookup.epoch {
            Ok(epoch) => {
                self.epochs.insert(lookup.name.clone(), epoch);
            }
            Err(e) => error!("dashboard::refresh: epoch lookup for {} failed: {e}", lookup.name),
        }

        match lookup.balance {
            Some(Ok((balance, decimals))) => {
                if let Some(pool) = self.pools.iter().find(|p| p.name == lookup.name) {
                    self.token_decimals.insert(pool.token, decimals);
                }
                self.balances.insert(lookup.name, balance);
            }
            Some(Err(e)) => error!("dashboard::refresh: balance lookup for {} failed: {e}", lookup.name),
            None => {}
        }
    }

    fn pool(&self, name: &str) -> Result<PoolConfig> {
        self.pools
            .iter()
            .find(|p| p.name == name)
            .cloned()
            .ok_or_else(|| eyre!("Unknown pool {name}"))
    }

    /// Rows for every scanned pool, sorted by name
    pub fn rows(&self) -> Vec<PoolRow> {
        let Some(current) = self.current_epoch else {
            return Vec::new();
        };

        self.epochs
            .iter()
            .filter_map(|(name, epoch)| {
                let pool = self.pools.iter().find(|p| &p.name == name)?;
                let balance = self.balances.get(name).copied();
                let balance_pretty = match (balance, self.token_decimals.get(&pool.token)) {
                    (Some(raw), Some(decimals)) => format_balance(raw, *decimals)
                        .unwrap_or_else(|e| {
                            warn!("dashboard::rows: cannot format {name} balance: {e}");
                            raw.to_string()
                        }),
                    _ => "0".to_string(),
                };

                Some(PoolRow {
                    name: name.clone(),
                    token: pool.token,
                    epoch: *epoch,
                    status: epoch_status(current, *epoch),
                    balance,
                    balance_pretty,
                    action: derive_action(current, *epoch, balance),
                })
            })
            .collect()
    }

    /// Row of a single pool
    pub fn row(&self, name: &str) -> Option<PoolRow> {
        self.rows().into_iter().find(|row| row.name == name)
    }

    /// Initializes the next epoch of a lagging pool, then re-scans that pool.
    ///
    /// # Errors
    /// * If the pool is unknown or has not been scanned yet
    /// * If the pool is already at the current epoch
    /// * If the transaction fails
    pub async fn sync_pool(&mut self, name: &str) -> Result<TxHash> {
        let pool = self.pool(name)?;
        let current = self
            .current_epoch
            .ok_or_else(|| eyre!("Current epoch unknown, refresh first"))?;
        let latest = *self
            .epochs
            .get(name)
            .ok_or_else(|| eyre!("Pool {name} has not been scanned"))?;

        let PoolAction::Sync { next_epoch } = derive_action(current, latest, None) else {
            return Err(eyre!("Pool {name} is already at epoch {current}"));
        };

        info!("dashboard::sync_pool: initializing epoch {next_epoch} of {name}");
        let tx = self
            .api
            .manual_epoch_init(vec![pool.token], next_epoch)
            .await?;

        let epoch = find_latest_initialized_epoch(&self.api, pool.token, current).await?;
        self.epochs.insert(name.to_string(), epoch);
        Ok(tx)
    }

    /// Withdraws the whole balance of a caught-up pool, then re-reads it.
    ///
    /// The balance is the holder's, so the holder must be the connected account.
    ///
    /// # Errors
    /// * If the pool is unknown or has not been scanned yet
    /// * If the holder is not the connected account
    /// * If the pool lags the current epoch or its balance is zero or unknown
    /// * If the transaction fails
    pub async fn withdraw(&mut self, name: &str) -> Result<TxHash> {
        let pool = self.pool(name)?;
        let current = self
            .current_epoch
            .ok_or_else(|| eyre!("Current epoch unknown, refresh first"))?;
        let latest = *self
            .epochs
            .get(name)
            .ok_or_else(|| eyre!("Pool {name} has not been scanned"))?;

        if self.holder != self.account {
            return Err(eyre!(
                "Balances shown are not the connected account's, unset IMPERSONATE to withdraw"
            ));
        }

        let balance = self.balances.get(name).copied();
        let amount = match derive_action(current, latest, balance) {
            PoolAction::Withdraw { amount } => amount,
            PoolAction::Sync { .. } => {
                return Err(eyre!("Pool {name} must be synced before withdrawing"))
            }
            PoolAction::None => return Err(eyre!("Nothing to withdraw from {name}")),
        };

        info!("dashboard::withdraw: withdrawing {amount} from {name}");
        let tx = self.api.withdraw(pool.token, amount).await?;

        if let Some(holder) = self.holder {
            match self.read_balance(holder, pool.token).await {
                Ok((balance, _)) => {
                    self.balances.insert(name.to_string(), balance);
                }
                Err(e) => {
                    self.balances.remove(name);
                    error!("dashboard::withdraw: balance lookup for {name} failed: {e}");
                }
            }
        }
        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::test_helpers::{account, pool, staking, token, MockStaking, MockTx};
    use super::*;

    fn dashboard(api: MockStaking, holder: Option<Address>) -> Dashboard<MockStaking> {
        Dashboard::new(api, vec![pool("usdc", 1), pool("dai", 2)], holder)
    }

    #[tokio::test]
    async fn test_refresh_builds_rows() {
        let alice = account(0xa1);
        let api = staking()
            .with_current_epoch(10)
            .with_initialized(token(1), &[0, 9, 10])
            .with_initialized(token(2), &[0, 8])
            .with_decimals(token(1), 6)
            .with_balance(alice, token(1), 2_500_000)
            .with_balance(alice, token(2), 7);
        let mut dash = dashboard(api, Some(alice));

        dash.refresh().await.unwrap();

        assert_eq!(dash.current_epoch(), Some(10));
        let rows = dash.rows();
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["dai", "usdc"]);

        let usdc = dash.row("usdc").unwrap();
        assert_eq!(usdc.epoch, Some(10));
        assert_eq!(usdc.status, EpochStatus::InSync);
        assert_eq!(usdc.balance_pretty, "2.5");
        assert_eq!(
            usdc.action,
            PoolAction::Withdraw {
                amount: U256::from(2_500_000)
            }
        );

        let dai = dash.row("dai").unwrap();
        assert_eq!(dai.epoch, Some(8));
        assert_eq!(dai.status, EpochStatus::OutOfSync);
        assert_eq!(dai.balance_pretty, "0.000000000000000007");
        assert_eq!(dai.action, PoolAction::Sync { next_epoch: 9 });
    }

    #[tokio::test]
    async fn test_rows_empty_before_refresh() {
        let dash = dashboard(staking(), None);
        assert!(dash.rows().is_empty());
    }

    #[tokio::test]
    async fn test_no_holder_skips_balances() {
        let api = staking()
            .with_current_epoch(3)
            .with_initialized(token(1), &[3])
            .with_initialized(token(2), &[3]);
        let mut dash = dashboard(api, None);

        dash.refresh().await.unwrap();

        assert_eq!(dash.api().decimals_calls(), 0);
        for row in dash.rows() {
            assert_eq!(row.balance, None);
            assert_eq!(row.balance_pretty, "0");
            assert_eq!(row.action, PoolAction::None);
        }
    }

    #[tokio::test]
    async fn test_decimals_fetched_once_per_session() {
        let alice = account(0xa1);
        let api = staking()
            .with_current_epoch(1)
            .with_initialized(token(1), &[1])
            .with_initialized(token(2), &[1])
            .with_balance(alice, token(1), 1);
        let mut dash = dashboard(api, Some(alice));

        dash.refresh().await.unwrap();
        dash.refresh().await.unwrap();
        dash.refresh().await.unwrap();

        assert_eq!(dash.api().decimals_calls(), 2);
    }

    #[tokio::test]
    async fn test_failing_pool_does_not_block_others() {
        let alice = account(0xa1);
        let api = staking()
            .with_current_epoch(4)
            .with_initialized(token(1), &[4])
            .with_initialized(token(2), &[4])
            .with_balance(alice, token(2), 5)
            .failing_token(token(1));
        let mut dash = dashboard(api, Some(alice));

        dash.refresh().await.unwrap();

        let rows = dash.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "dai");
        assert_eq!(rows[0].balance, Some(U256::from(5)));
    }

    #[tokio::test]
    async fn test_never_initialized_pool_syncs_from_zero() {
        let api = staking().with_current_epoch(2);
        let mut dash = Dashboard::new(api, vec![pool("usdc", 1)], None);

        dash.refresh().await.unwrap();

        let row = dash.row("usdc").unwrap();
        assert_eq!(row.epoch, None);
        assert_eq!(row.action, PoolAction::Sync { next_epoch: 0 });
    }

    #[tokio::test]
    async fn test_sync_pool_initializes_next_epoch_and_rescans() {
        let api = staking()
            .with_current_epoch(6)
            .with_initialized(token(1), &[0, 4])
            .with_initialized(token(2), &[6]);
        let mut dash = dashboard(api, None);
        dash.refresh().await.unwrap();

        dash.sync_pool("usdc").await.unwrap();

        assert_eq!(
            dash.api().transactions(),
            vec![MockTx::EpochInit(vec![token(1)], 5)]
        );
        let row = dash.row("usdc").unwrap();
        assert_eq!(row.epoch, Some(5));
        assert_eq!(row.status, EpochStatus::PendingSync);
        assert_eq!(row.action, PoolAction::Sync { next_epoch: 6 });

        dash.sync_pool("usdc").await.unwrap();
        assert_eq!(dash.row("usdc").unwrap().status, EpochStatus::InSync);
    }

    #[tokio::test]
    async fn test_sync_pool_rejects_caught_up_and_unknown_pools() {
        let api = staking()
            .with_current_epoch(6)
            .with_initialized(token(1), &[6])
            .with_initialized(token(2), &[6]);
        let mut dash = dashboard(api, None);

        assert!(dash.sync_pool("usdc").await.is_err(), "not refreshed yet");
        dash.refresh().await.unwrap();

        assert!(dash.sync_pool("usdc").await.is_err());
        assert!(dash.sync_pool("wbtc").await.is_err());
        assert!(dash.api().transactions().is_empty());
    }

    #[tokio::test]
    async fn test_withdraw_full_balance() {
        let alice = account(0xa1);
        let api = staking()
            .with_current_epoch(2)
            .with_initialized(token(1), &[2])
            .with_initialized(token(2), &[2])
            .with_balance(alice, token(1), 900);
        let mut dash = dashboard(api, Some(alice));
        dash.refresh().await.unwrap();

        dash.withdraw("usdc").await.unwrap();

        assert_eq!(
            dash.api().transactions(),
            vec![MockTx::Withdraw(token(1), U256::from(900))]
        );
        let row = dash.row("usdc").unwrap();
        assert_eq!(row.balance, Some(U256::ZERO));
        assert_eq!(row.action, PoolAction::None);

        assert!(dash.withdraw("usdc").await.is_err(), "balance is now zero");
        assert!(dash.withdraw("dai").await.is_err());
    }

    #[tokio::test]
    async fn test_withdraw_rejects_lagging_pool() {
        let alice = account(0xa1);
        let api = staking()
            .with_current_epoch(6)
            .with_initialized(token(1), &[0, 4])
            .with_initialized(token(2), &[6])
            .with_balance(alice, token(1), 900);
        let mut dash = dashboard(api, Some(alice));

        assert!(dash.withdraw("usdc").await.is_err(), "not refreshed yet");
        dash.refresh().await.unwrap();
        assert_eq!(
            dash.row("usdc").unwrap().action,
            PoolAction::Sync { next_epoch: 5 }
        );

        let err = dash.withdraw("usdc").await.unwrap_err();
        assert!(err.to_string().contains("must be synced"));
        assert!(dash.api().transactions().is_empty());
        assert_eq!(dash.row("usdc").unwrap().balance, Some(U256::from(900)));
    }

    #[tokio::test]
    async fn test_withdraw_requires_holder_to_be_connected_account() {
        let (alice, whale) = (account(0xa1), account(0x77));
        let api = staking()
            .with_current_epoch(2)
            .with_initialized(token(1), &[2])
            .with_initialized(token(2), &[2])
            .with_balance(whale, token(1), 5_000)
            .with_balance(alice, token(1), 10);
        let mut dash = dashboard(api, Some(whale));
        dash.set_account(Some(alice));
        dash.refresh().await.unwrap();

        assert!(dash.withdraw("usdc").await.is_err());
        assert!(dash.api().transactions().is_empty());

        dash.set_holder(Some(alice));
        dash.refresh().await.unwrap();
        dash.withdraw("usdc").await.unwrap();
        assert_eq!(
            dash.api().transactions(),
            vec![MockTx::Withdraw(token(1), U256::from(10))]
        );
    }

    #[tokio::test]
    async fn test_set_holder_drops_balances() {
        let (alice, bob) = (account(0xa1), account(0xb0));
        let api = staking()
            .with_current_epoch(1)
            .with_initialized(token(1), &[1])
            .with_initialized(token(2), &[1])
            .with_balance(alice, token(1), 10)
            .with_balance(bob, token(1), 20);
        let mut dash = dashboard(api, Some(alice));
        dash.refresh().await.unwrap();
        assert_eq!(dash.row("usdc").unwrap().balance, Some(U256::from(10)));

        dash.set_holder(Some(bob));
        assert_eq!(dash.row("usdc").unwrap().balance, None);

        dash.refresh().await.unwrap();
        assert_eq!(dash.holder(), Some(bob));
        assert_eq!(dash.row("usdc").unwrap().balance, Some(U256::from(20)));
    }
}
