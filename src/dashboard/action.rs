use alloy::primitives::U256;
use derive_more::Display;
use serde::Serialize;

/// What the holder can do with a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PoolAction {
    /// Initialize the next epoch of a pool that lags behind the contract
    #[display("Initialize Epoch {next_epoch}")]
    Sync {
        /// Epoch to pass to `manualEpochInit`
        next_epoch: u128,
    },
    /// Withdraw the whole staked balance
    #[display("Withdraw")]
    Withdraw {
        /// Raw amount to withdraw
        amount: U256,
    },
    /// Nothing to do
    #[display("")]
    None,
}

/// How far a pool's latest initialized epoch trails the current one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EpochStatus {
    /// Latest initialized epoch is the current epoch
    #[display("in-sync")]
    InSync,
    /// One epoch behind
    #[display("pending-sync")]
    PendingSync,
    /// Two or more epochs behind, or never initialized
    #[display("out-of-sync")]
    OutOfSync,
}

/// Epoch to initialize next for a pool whose latest initialized epoch is `latest`
pub fn next_epoch(latest: Option<u128>) -> u128 {
    latest.map_or(0, |epoch| epoch.saturating_add(1))
}

/// Derives the pool action.
///
/// A pool behind the current epoch must be synced before anything else; a
/// caught-up pool with a positive balance can be withdrawn from.
pub fn derive_action(current: u128, latest: Option<u128>, balance: Option<U256>) -> PoolAction {
    match latest {
        Some(epoch) if epoch >= current => match balance {
            Some(amount) if !amount.is_zero() => PoolAction::Withdraw { amount },
            _ => PoolAction::None,
        },
        _ => PoolAction::Sync {
            next_epoch: next_epoch(latest),
        },
    }
}

/// Classifies how far `latest` trails `current`
pub fn epoch_status(current: u128, latest: Option<u128>) -> EpochStatus {
    match latest {
        Some(epoch) if epoch >= current => EpochStatus::InSync,
        Some(epoch) if epoch.saturating_add(1) == current => EpochStatus::PendingSync,
        _ => EpochStatus::OutOfSync,
    }
}
