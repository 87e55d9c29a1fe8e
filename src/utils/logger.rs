use chrono::Local;
use eyre::Result;
use fern::Dispatch;
use log::LevelFilter;

/// Parses a `RUST_LOG` style level, falling back to `Info`
fn level_from(value: Option<&str>) -> LevelFilter {
    value
        .and_then(|level| level.trim().parse().ok())
        .unwrap_or(LevelFilter::Info)
}

/// Sets up the application logger with console output.
///
/// The level comes from `RUST_LOG`; transport crates are capped at `Warn` so
/// RPC chatter does not drown the dashboard output.
///
/// # Errors
/// * If a global logger is already installed
pub fn setup_logger() -> Result<()> {
    let level = level_from(std::env::var("RUST_LOG").ok().as_deref());

    Dispatch::new()
        .level(level)
        .level_for("hyper", LevelFilter::Warn)
        .level_for("hyper_util", LevelFilter::Warn)
        .level_for("reqwest", LevelFilter::Warn)
        .level_for("alloy_transport_http", LevelFilter::Warn)
        .level_for("alloy_rpc_client", LevelFilter::Warn)
        .chain(std::io::stdout())
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                message
            ));
        })
        .apply()?;
    Ok(())
}
