use alloy::primitives::{Address, TxHash, U256};
use eyre::Result;
use std::sync::Arc;

/// Calls the dashboard needs from the staking contract and the pool tokens.
///
/// Epochs are `uint128` on chain and are carried as `u128` here.
#[allow(async_fn_in_trait)]
pub trait StakingApi {
    /// Current global epoch of the staking contract
    ///
    /// # Errors
    /// * If the RPC call fails
    async fn current_epoch(&self) -> Result<u128>;

    /// Whether `epoch` has been initialized for the pool of `token`
    ///
    /// # Errors
    /// * If the RPC call fails
    async fn epoch_is_initialized(&self, token: Address, epoch: u128) -> Result<bool>;

    /// Staked balance of `user` in the pool of `token`
    ///
    /// # Errors
    /// * If the RPC call fails
    async fn balance_of(&self, user: Address, token: Address) -> Result<U256>;

    /// ERC20 decimals of `token`
    ///
    /// # Errors
    /// * If the RPC call fails
    async fn decimals(&self, token: Address) -> Result<u8>;

    /// Initializes `epoch` for every pool in `tokens` and waits for one confirmation
    ///
    /// # Errors
    /// * If no signer is available
    /// * If the transaction cannot be sent or reverts
    async fn manual_epoch_init(&self, tokens: Vec<Address>, epoch: u128) -> Result<TxHash>;

    /// Withdraws `amount` of `token` and waits for one confirmation
    ///
    /// # Errors
    /// * If no signer is available
    /// * If the transaction cannot be sent or reverts
    async fn withdraw(&self, token: Address, amount: U256) -> Result<TxHash>;
}

impl<T: StakingApi> StakingApi for Arc<T> {
    async fn current_epoch(&self) -> Result<u128> {
        (**self).current_epoch().await
    }

    async fn epoch_is_initialized(&self, token: Address, epoch: u128) -> Result<bool> {
        (**self).epoch_is_initialized(token, epoch).await
    }

    async fn balance_of(&self, user: Address, token: Address) -> Result<U256> {
        (**self).balance_of(user, token).await
    }

    async fn decimals(&self, token: Address) -> Result<u8> {
        (**self).decimals(token).await
    }

    async fn manual_epoch_init(&self, tokens: Vec<Address>, epoch: u128) -> Result<TxHash> {
        (**self).manual_epoch_init(tokens, epoch).await
    }

    async fn withdraw(&self, token: Address, amount: U256) -> Result<TxHash> {
        (**self).withdraw(token, amount).await
    }
}
