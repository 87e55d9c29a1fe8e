use std::time::Duration;

use alloy::{network::Ethereum, primitives::Address, providers::Provider};
use clap::{Parser, Subcommand};
use eyre::{eyre, Error, Result};
use indicatif::ProgressBar;
use log::info;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use universe::{
    config::Config,
    dashboard::{
        render::{render_json, render_text},
        Dashboard,
    },
    session::Session,
    staking::{ChainStaking, StakingApi},
    utils::{
        format::elide_address,
        logger::setup_logger,
        providers::{create_http_provider, create_wallet_provider, parse_signer},
    },
    wallet::NodeWallet,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON-RPC endpoint, overrides RPC_URL
    #[arg(long, global = true)]
    rpc_url: Option<String>,
    /// Print the dashboard as JSON
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone)]
enum Commands {
    /// Show every pool once
    Show,
    /// Keep the dashboard up to date until Ctrl-C
    Watch,
    /// Initialize the next epoch of a lagging pool
    Sync {
        /// Pool name
        pool: String,
    },
    /// Withdraw the whole balance of a pool
    Withdraw {
        /// Pool name
        pool: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

fn print_dashboard<A: StakingApi>(
    dashboard: &Dashboard<A>,
    config: &Config,
    json: bool,
) -> Result<(), Error> {
    let rows = dashboard.rows();
    let contract_url = config.contract_url();
    if json {
        println!(
            "{}",
            render_json(dashboard.current_epoch(), &rows, &contract_url)?
        );
    } else {
        print!(
            "{}",
            render_text(dashboard.current_epoch(), &rows, &contract_url)
        );
    }
    Ok(())
}

async fn confirm(question: &str) -> Result<bool> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(format!("{question} [y/N] ").as_bytes()).await?;
    stdout.flush().await?;

    let mut answer = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut answer)
        .await?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

async fn run<P>(
    cli: &Cli,
    config: &Config,
    provider: P,
    account: Option<Address>,
    can_sign: bool,
) -> Result<(), Error>
where
    P: Provider<Ethereum> + Clone,
{
    let api = ChainStaking::new(provider.clone(), config.staking_contract, can_sign);
    let wallet = NodeWallet::new(provider, account);
    let mut session = Session::new(api, wallet, config.pools.clone(), config.impersonate);

    let spinner = ProgressBar::new_spinner();
    spinner.set_message(format!("Loading {} pools...", config.pools.len()));
    spinner.enable_steady_tick(Duration::from_millis(100));
    let connected = session.connect().await;
    spinner.finish_and_clear();
    let connection = connected?;
    info!(
        "{} Connected (chain {})",
        elide_address(&connection.account),
        connection.chain_id
    );

    match cli.command.clone().unwrap_or(Commands::Show) {
        Commands::Show => print_dashboard(session.dashboard(), config, cli.json)?,
        Commands::Watch => {
            print_dashboard(session.dashboard(), config, cli.json)?;
            session
                .watch(config.poll_interval, |dashboard| {
                    print_dashboard(dashboard, config, cli.json)
                })
                .await?;
        }
        Commands::Sync { pool } => {
            let tx = session.dashboard_mut().sync_pool(&pool).await?;
            info!("Synced {pool} in tx {tx}");
            print_dashboard(session.dashboard(), config, cli.json)?;
        }
        Commands::Withdraw { pool, yes } => {
            let row = session
                .dashboard()
                .row(&pool)
                .ok_or_else(|| eyre!("Unknown pool {pool}"))?;
            if !yes && !confirm(&format!("Withdraw {} {pool}?", row.balance_pretty)).await? {
                info!("Withdrawal from {pool} cancelled");
                return Ok(());
            }
            let tx = session.dashboard_mut().withdraw(&pool).await?;
            info!("Withdrew from {pool} in tx {tx}");
            print_dashboard(session.dashboard(), config, cli.json)?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    setup_logger()?;

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(rpc_url) = &cli.rpc_url {
        config.rpc_url.clone_from(rpc_url);
    }
    info!(
        "Using {} with staking contract {}",
        config.rpc_url, config.staking_contract
    );

    if let Some(private_key) = config.private_key.as_deref() {
        let signer = parse_signer(private_key)?;
        let account = signer.address();
        let provider = create_wallet_provider(&config.rpc_url, signer)?;
        run(&cli, &config, provider, Some(account), true).await
    } else {
        let provider = create_http_provider(&config.rpc_url)?;
        run(&cli, &config, provider, config.account, false).await
    }
}
