use alloy::primitives::Address;
use eyre::{eyre, Result};
use log::{info, warn};

use super::WalletSource;
use crate::utils::format::elide_address;

/// Account and network obtained on connect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    /// Active account
    pub account: Address,
    /// Network chain id
    pub chain_id: u64,
}

/// Change reported by the wallet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    /// Account list changed; empty means the wallet disconnected
    AccountsChanged(Vec<Address>),
    /// Network changed; `previous` is `None` on first detection
    NetworkChanged {
        /// New chain id
        chain_id: u64,
        /// Chain id before the change
        previous: Option<u64>,
    },
}

/// What the session has to do after a wallet event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorAction {
    /// Show balances of a different account
    AccountChanged(Address),
    /// First network detection, nothing to rebuild
    NetworkDetected(u64),
    /// Drop all session state and reconnect
    Reload,
    /// Nothing changed
    Nothing,
}

/// Tracks the active account and network of a wallet
pub struct WalletConnector<W> {
    /// Wallet being watched
    source: W,
    /// Active account, once connected
    account: Option<Address>,
    /// Network chain id, once detected
    chain_id: Option<u64>,
}

impl<W: WalletSource> WalletConnector<W> {
    /// Creates a disconnected connector
    pub const fn new(source: W) -> Self {
        Self {
            source,
            account: None,
            chain_id: None,
        }
    }

    /// Active account
    pub const fn account(&self) -> Option<Address> {
        self.account
    }

    /// Detected chain id
    pub const fn chain_id(&self) -> Option<u64> {
        self.chain_id
    }

    /// Requests account access and detects the network.
    ///
    /// # Errors
    /// * If the wallet exposes no account
    /// * If the wallet cannot be reached
    pub async fn connect(&mut self) -> Result<Connection> {
        let accounts = self.source.request_accounts().await?;
        let Some(account) = accounts.first().copied() else {
            return Err(eyre!(
                "Wallet exposes no account, set PRIVATE_KEY or ACCOUNT"
            ));
        };
        self.account = Some(account);

        let chain_id = self.source.chain_id().await?;
        self.handle(WalletEvent::NetworkChanged {
            chain_id,
            previous: None,
        });

        info!(
            "wallet::connect: {} connected on chain {chain_id}",
            elide_address(&account)
        );
        Ok(Connection { account, chain_id })
    }

    /// Re-reads the wallet and reports what changed since the last look
    ///
    /// # Errors
    /// * If the wallet cannot be reached
    pub async fn poll(&self) -> Result<Vec<WalletEvent>> {
        let mut events = Vec::new();

        let accounts = self.source.request_accounts().await?;
        if accounts.first().copied() != self.account {
            events.push(WalletEvent::AccountsChanged(accounts));
        }

        let chain_id = self.source.chain_id().await?;
        if Some(chain_id) != self.chain_id {
            events.push(WalletEvent::NetworkChanged {
                chain_id,
                previous: self.chain_id,
            });
        }
        Ok(events)
    }

    /// Applies a wallet event.
    ///
    /// A disconnect or a switch to another network reloads the session rather
    /// than reconciling state across networks.
    pub fn handle(&mut self, event: WalletEvent) -> ConnectorAction {
        match event {
            WalletEvent::AccountsChanged(accounts) => match accounts.first().copied() {
                None => {
                    warn!("wallet::handle: wallet disconnected, reloading");
                    self.account = None;
                    ConnectorAction::Reload
                }
                Some(account) if Some(account) == self.account => ConnectorAction::Nothing,
                Some(account) => {
                    info!(
                        "wallet::handle: account switched to {}",
                        elide_address(&account)
                    );
                    self.account = Some(account);
                    ConnectorAction::AccountChanged(account)
                }
            },
            WalletEvent::NetworkChanged {
                chain_id,
                previous: None,
            } => {
                self.chain_id = Some(chain_id);
                ConnectorAction::NetworkDetected(chain_id)
            }
            WalletEvent::NetworkChanged {
                chain_id,
                previous: Some(previous),
            } => {
                warn!("wallet::handle: network changed from {previous} to {chain_id}, reloading");
                self.chain_id = Some(chain_id);
                ConnectorAction::Reload
            }
        }
    }

    /// Polls the wallet and folds every event into a single action.
    ///
    /// `Reload` wins over everything; otherwise the last account switch is
    /// reported.
    ///
    /// # Errors
    /// * If the wallet cannot be reached
    pub async fn poll_action(&mut self) -> Result<ConnectorAction> {
        let mut action = ConnectorAction::Nothing;
        for event in self.poll().await? {
            match self.handle(event) {
                ConnectorAction::Reload => return Ok(ConnectorAction::Reload),
                change @ ConnectorAction::AccountChanged(_) => action = change,
                ConnectorAction::NetworkDetected(_) | ConnectorAction::Nothing => {}
            }
        }
        Ok(action)
    }
}
