/*!
 * # Universe - Staking Pool Dashboard
 *
 * Universe shows a wallet holder's positions across the pools of a single
 * on-chain staking contract and lets them keep each pool's epochs initialized.
 *
 * ## Core Features
 *
 * - **Epoch reconciliation**: finds the latest initialized epoch of every pool
 *   by walking back from the contract's current epoch
 * - **Actions**: offers `sync` for lagging pools and `withdraw` for caught-up
 *   pools holding a balance
 * - **Wallet tracking**: follows account switches and reloads on network
 *   changes
 *
 * ## Module Structure
 *
 * - `config`: Environment configuration
 * - `dashboard`: Per-pool state, action derivation and rendering
 * - `session`: Wallet and dashboard lifecycle
 * - `staking`: Staking contract boundary
 * - `utils`: Logging, providers and formatting helpers
 * - `wallet`: Account and network tracking
 */

/// Environment configuration
pub mod config;
/// Per-pool state, action derivation and rendering
pub mod dashboard;
/// Wallet and dashboard lifecycle
pub mod session;
/// Staking contract boundary
pub mod staking;
/// Logging, providers and formatting helpers
pub mod utils;
/// Account and network tracking
pub mod wallet;
