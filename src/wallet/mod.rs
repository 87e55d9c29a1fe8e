//! # Wallet connection
//!
//! A wallet is anything that can name the active accounts and the network it
//! is on. [`WalletConnector`] turns changes in either into session actions.

/// Connection state machine
pub mod connector;
/// Node / local-key backed wallet
pub mod node;

use alloy::primitives::Address;
use eyre::Result;
use std::sync::Arc;

pub use connector::{Connection, ConnectorAction, WalletConnector, WalletEvent};
pub use node::NodeWallet;

/// Source of accounts and network identity
#[allow(async_fn_in_trait)]
pub trait WalletSource {
    /// Accounts the wallet exposes, active account first
    ///
    /// # Errors
    /// * If the wallet cannot be reached
    async fn request_accounts(&self) -> Result<Vec<Address>>;

    /// Chain id of the network the wallet is on
    ///
    /// # Errors
    /// * If the wallet cannot be reached
    async fn chain_id(&self) -> Result<u64>;
}

impl<T: WalletSource> WalletSource for Arc<T> {
    async fn request_accounts(&self) -> Result<Vec<Address>> {
        (**self).request_accounts().await
    }

    async fn chain_id(&self) -> Result<u64> {
        (**self).chain_id().await
    }
}
