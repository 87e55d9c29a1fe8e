//! Wires a wallet to a dashboard for the lifetime of one connection.
//!
//! A reload throws away the connector and the dashboard and rebuilds both
//! from the chain; no state is carried across networks or disconnects.

use alloy::primitives::Address;
use eyre::Result;
use log::{error, info};
use std::time::Duration;

use crate::config::PoolConfig;
use crate::dashboard::Dashboard;
use crate::staking::StakingApi;
use crate::wallet::{Connection, ConnectorAction, WalletConnector, WalletSource};

/// A wallet connection and the dashboard built for it
pub struct Session<A, W> {
    /// Contract access, cloned into every new dashboard
    api: A,
    /// Wallet, cloned into every new connector
    wallet: W,
    /// Configured pools
    pools: Vec<PoolConfig>,
    /// Balance holder override
    impersonate: Option<Address>,
    /// Current connector
    connector: WalletConnector<W>,
    /// Current dashboard
    dashboard: Dashboard<A>,
    /// Set after a reload failed; the next tick reconnects
    needs_reload: bool,
}

impl<A, W> Session<A, W>
where
    A: StakingApi + Clone,
    W: WalletSource + Clone,
{
    /// Creates a disconnected session
    pub fn new(api: A, wallet: W, pools: Vec<PoolConfig>, impersonate: Option<Address>) -> Self {
        Self {
            connector: WalletConnector::new(wallet.clone()),
            dashboard: Dashboard::new(api.clone(), pools.clone(), impersonate),
            api,
            wallet,
            pools,
            impersonate,
            needs_reload: true,
        }
    }

    /// Current dashboard
    pub const fn dashboard(&self) -> &Dashboard<A> {
        &self.dashboard
    }

    /// Current dashboard, for actions
    pub fn dashboard_mut(&mut self) -> &mut Dashboard<A> {
        &mut self.dashboard
    }

    /// Active wallet account
    pub const fn account(&self) -> Option<Address> {
        self.connector.account()
    }

    /// Connects from scratch and loads every pool.
    ///
    /// # Errors
    /// * If the wallet exposes no account or cannot be reached
    /// * If the current epoch cannot be read
    pub async fn connect(&mut self) -> Result<Connection> {
        self.needs_reload = true;
        self.connector = WalletConnector::new(self.wallet.clone());
        self.dashboard = Dashboard::new(self.api.clone(), self.pools.clone(), self.impersonate);

        let connection = self.connector.connect().await?;
        self.dashboard.set_account(Some(connection.account));
        self.dashboard
            .set_holder(Some(self.impersonate.unwrap_or(connection.account)));
        self.dashboard.refresh().await?;

        self.needs_reload = false;
        Ok(connection)
    }

    /// Reacts to wallet changes, then refreshes the dashboard.
    ///
    /// # Errors
    /// * If the wallet or the staking contract cannot be reached
    pub async fn tick(&mut self) -> Result<ConnectorAction> {
        if self.needs_reload {
            self.connect().await?;
            return Ok(ConnectorAction::Reload);
        }

        let action = self.connector.poll_action().await?;
        match action {
            ConnectorAction::Reload => {
                info!("session::tick: reloading");
                self.connect().await?;
            }
            ConnectorAction::AccountChanged(account) => {
                self.dashboard.set_account(Some(account));
                self.dashboard
                    .set_holder(Some(self.impersonate.unwrap_or(account)));
                self.dashboard.refresh().await?;
            }
            ConnectorAction::NetworkDetected(_) | ConnectorAction::Nothing => {
                self.dashboard.refresh().await?;
            }
        }
        Ok(action)
    }

    /// Ticks every `interval` until Ctrl-C, calling `on_update` after each
    /// successful tick. Failed ticks are logged and retried.
    ///
    /// # Errors
    /// * If the Ctrl-C handler cannot be installed
    /// * If `on_update` fails
    pub async fn watch<F>(&mut self, interval: Duration, mut on_update: F) -> Result<()>
    where
        F: FnMut(&Dashboard<A>) -> Result<()>,
    {
        let mut ticker = tokio::time::interval(interval);
        // the first tick completes immediately and the caller has just rendered
        ticker.tick().await;

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = ticker.tick() => match self.tick().await {
                    Ok(_) => on_update(&self.dashboard)?,
                    Err(e) => error!("session::watch: {e}"),
                },
                result = &mut shutdown => {
                    result?;
                    info!("session::watch: received shutdown signal");
                    return Ok(());
                }
            }
        }
    }
}
