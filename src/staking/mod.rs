//! # Staking contract boundary
//!
//! Everything the dashboard knows about the chain goes through [`StakingApi`].
//! [`ChainStaking`] talks to a deployed staking contract over JSON-RPC.

/// The contract interface as a trait
pub mod api;
/// alloy-backed implementation
pub mod chain;

pub use api::StakingApi;
pub use chain::ChainStaking;
