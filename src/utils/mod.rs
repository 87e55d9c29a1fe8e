/// Amount and address formatting
pub mod format;
/// Logger
pub mod logger;
/// RPC providers
pub mod providers;
