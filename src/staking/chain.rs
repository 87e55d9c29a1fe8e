use alloy::{
    network::{Ethereum, ReceiptResponse},
    primitives::{Address, TxHash, U256},
    providers::Provider,
    sol,
};
use eyre::{eyre, Result};
use log::{debug, info};

use super::StakingApi;

// Staking contract shared by every pool. Pools are keyed by their token address.
sol! {
    #[sol(rpc)]
    interface IStaking {
        function getCurrentEpoch() external view returns (uint128);
        function epochIsInitialized(address token, uint128 epochId) external view returns (bool);
        function manualEpochInit(address[] memory tokens, uint128 epochId) external;
        function balanceOf(address user, address token) external view returns (uint256);
        function withdraw(address tokenAddress, uint256 amount) external;
    }
}

// Only `decimals` is needed from the pool tokens.
sol! {
    #[sol(rpc)]
    interface IERC20 {
        function decimals() external view returns (uint8);
    }
}

/// Staking contract reached through an alloy provider
#[derive(Clone)]
pub struct ChainStaking<P> {
    /// Provider used for reads and, when it carries a wallet, for transactions
    provider: P,
    /// Staking contract address
    address: Address,
    /// Whether the provider has a wallet filler attached
    can_sign: bool,
}

impl<P> ChainStaking<P>
where
    P: Provider<Ethereum> + Clone,
{
    /// Wraps `provider` for the staking contract at `address`
    pub const fn new(provider: P, address: Address, can_sign: bool) -> Self {
        Self {
            provider,
            address,
            can_sign,
        }
    }

    fn ensure_signer(&self, action: &str) -> Result<()> {
        if self.can_sign {
            Ok(())
        } else {
            Err(eyre!("{action} needs a signer, set PRIVATE_KEY"))
        }
    }
}

impl<P> StakingApi for ChainStaking<P>
where
    P: Provider<Ethereum> + Clone,
{
    async fn current_epoch(&self) -> Result<u128> {
        let staking = IStaking::new(self.address, self.provider.clone());
        Ok(staking.getCurrentEpoch().call().await?._0)
    }

    async fn epoch_is_initialized(&self, token: Address, epoch: u128) -> Result<bool> {
        let staking = IStaking::new(self.address, self.provider.clone());
        Ok(staking.epochIsInitialized(token, epoch).call().await?._0)
    }

    async fn balance_of(&self, user: Address, token: Address) -> Result<U256> {
        let staking = IStaking::new(self.address, self.provider.clone());
        Ok(staking.balanceOf(user, token).call().await?._0)
    }

    async fn decimals(&self, token: Address) -> Result<u8> {
        let erc20 = IERC20::new(token, self.provider.clone());
        Ok(erc20.decimals().call().await?._0)
    }

    async fn manual_epoch_init(&self, tokens: Vec<Address>, epoch: u128) -> Result<TxHash> {
        self.ensure_signer("manualEpochInit")?;
        let staking = IStaking::new(self.address, self.provider.clone());

        info!("staking::manual_epoch_init: epoch {epoch} for {tokens:?}");
        let receipt = staking
            .manualEpochInit(tokens, epoch)
            .send()
            .await?
            .with_required_confirmations(1)
            .get_receipt()
            .await?;

        if !receipt.status() {
            return Err(eyre!(
                "manualEpochInit reverted in tx {}",
                receipt.transaction_hash
            ));
        }
        debug!(
            "staking::manual_epoch_init: confirmed in tx {}",
            receipt.transaction_hash
        );
        Ok(receipt.transaction_hash)
    }

    async fn withdraw(&self, token: Address, amount: U256) -> Result<TxHash> {
        self.ensure_signer("withdraw")?;
        let staking = IStaking::new(self.address, self.provider.clone());

        info!("staking::withdraw: {amount} of {token}");
        let receipt = staking
            .withdraw(token, amount)
            .send()
            .await?
            .with_required_confirmations(1)
            .get_receipt()
            .await?;

        if !receipt.status() {
            return Err(eyre!("withdraw reverted in tx {}", receipt.transaction_hash));
        }
        debug!(
            "staking::withdraw: confirmed in tx {}",
            receipt.transaction_hash
        );
        Ok(receipt.transaction_hash)
    }
}
