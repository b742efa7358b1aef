//! Loan Contract Client
//!
//! Command line entry point driving the asset loan contract.

use alloy::primitives::{Address, U256};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use loan_contract_client::{
    types::{parse_amount, DeploymentEvent},
    AppError, Config, LoanClient,
};

#[derive(Debug, Parser)]
#[command(name = "loan-contract-client")]
#[command(about = "Deploy and drive the asset loan contract", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Deploy a contract and wait until it is mined
    Deploy {
        /// Contract name in the settings file
        contract: String,
        /// Name the deployed address is recorded under
        id: String,
        /// Deploying account (defaults to the fueling account)
        #[arg(value_parser = parse_address)]
        from: Option<Address>,
        /// Password of the deploying account
        password: Option<String>,
    },
    /// Borrower adds funds (e.g. 100000, "1.5 ether")
    AddFunds {
        #[arg(value_parser = parse_amount)]
        amount: U256,
    },
    /// Investor proposes an investment
    Propose {
        #[arg(value_parser = parse_address)]
        investor: Address,
        #[arg(value_parser = parse_amount)]
        amount: U256,
    },
    /// Fueling account approves a proposal
    Approve {
        #[arg(value_parser = parse_address)]
        investor: Address,
    },
    /// Borrower executes the next payment
    Pay,
    /// Log loan events until interrupted
    Listen,
}

fn parse_address(raw: &str) -> Result<Address, AppError> {
    raw.trim().parse().map_err(|_| AppError::InvalidAddress(raw.to_string()))
}

async fn run(client: LoanClient, command: Command) -> Result<(), AppError> {
    match command {
        Command::Deploy { contract, id, from, password } => {
            let mut pending =
                client.deployer().deploy(&contract, &id, from, password.as_deref()).await?;
            while let Some(event) = pending.next_event().await {
                match event {
                    DeploymentEvent::Pending { tx_hash } => println!("pending {tx_hash}"),
                    DeploymentEvent::Mined { address, .. } => println!("mined {address}"),
                    DeploymentEvent::Failed { reason, .. } => eprintln!("failed: {reason}"),
                }
            }
            pending.wait().await?;
        }
        Command::AddFunds { amount } => {
            println!("{}", client.loan().add_funds(amount).await?);
        }
        Command::Propose { investor, amount } => {
            println!("{}", client.loan().propose_investment(investor, amount).await?);
        }
        Command::Approve { investor } => {
            println!("{}", client.loan().approve_investment(investor).await?);
        }
        Command::Pay => {
            println!("{}", client.loan().execute_payment().await?);
        }
        Command::Listen => {
            let subscriptions = client.listen().await?;
            tracing::info!(listeners = subscriptions.len(), "Listening, press Ctrl-C to stop");
            tokio::signal::ctrl_c().await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    tracing::info!("Starting loan contract client");

    let settings = config.load_settings()?;
    let client = LoanClient::new(&config, settings)?;

    run(client, cli.command).await?;

    Ok(())
}
