use alloy::primitives::Address;
use eyre::Result;
use log::debug;

use crate::staking::StakingApi;

/// Finds the most recent initialized epoch of a pool.
///
/// Walks backward from `current` one epoch at a time and stops at epoch 0.
/// Returns `None` when no epoch in `0..=current` is initialized.
///
/// # Errors
/// * If an `epochIsInitialized` call fails
pub async fn find_latest_initialized_epoch<A: StakingApi>(
    api: &A,
    token: Address,
    current: u128,
) -> Result<Option<u128>> {
    let mut epoch = current;
    loop {
        if api.epoch_is_initialized(token, epoch).await? {
            debug!("dashboard::epoch: {token} latest initialized epoch is {epoch} (current {current})");
            return Ok(Some(epoch));
        }
        if epoch == 0 {
            debug!("dashboard::epoch: {token} has no initialized epoch up to {current}");
            return Ok(None);
        }
        epoch -= 1;
    }
}
