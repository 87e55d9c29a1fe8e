use alloy::{network::Ethereum, primitives::Address, providers::Provider};
use eyre::Result;

use super::WalletSource;

/// Wallet backed by a JSON-RPC node.
///
/// A fixed account (the local signer, or a configured read-only address) wins
/// over the node's own `eth_accounts`.
#[derive(Clone)]
pub struct NodeWallet<P> {
    /// Node connection
    provider: P,
    /// Account pinned by configuration
    account: Option<Address>,
}

impl<P> NodeWallet<P>
where
    P: Provider<Ethereum>,
{
    /// Wraps `provider`, optionally pinning the active account
    pub const fn new(provider: P, account: Option<Address>) -> Self {
        Self { provider, account }
    }
}

impl<P> WalletSource for NodeWallet<P>
where
    P: Provider<Ethereum>,
{
    async fn request_accounts(&self) -> Result<Vec<Address>> {
        match self.account {
            Some(account) => Ok(vec![account]),
            None => Ok(self.provider.get_accounts().await?),
        }
    }

    async fn chain_id(&self) -> Result<u64> {
        Ok(self.provider.get_chain_id().await?)
    }
}
