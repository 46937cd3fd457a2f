//! Sui validator toolkit CLI

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use sui_toolkit::prompt::{complete_key_source, Prompter, Terminal};
use sui_toolkit::sui::{parse_sui_amount, SuiAddress, SuiRpcClient};
use sui_toolkit::{
    resolve_key, Config, Error, KeyEncoding, KeySource, OperationRequest, OperationRunner,
    ProviderKind, Result, SecretStore, SuiSigner,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "sui-toolkit")]
#[command(version, about = "Easily interact with the Sui blockchain")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    key_source: KeyArgs,

    /// Skip the confirmation prompt
    #[arg(short = 'y', long, global = true)]
    yes: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Args)]
struct KeyArgs {
    /// The keypair is double base64 encoded: base64(base64Keypair)
    #[arg(short = 'b', long = "base64", global = true)]
    double_encoded: bool,

    /// Key source file (JSON: provider, path, key, value, encoding)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Key provider
    #[arg(long, value_enum, global = true)]
    provider: Option<ProviderKind>,

    /// Vault path to the keypair record
    #[arg(long, global = true)]
    path: Option<String>,

    /// Field of the Vault record holding the keypair [default: account_key]
    #[arg(long, global = true)]
    key: Option<String>,
}

impl KeyArgs {
    fn resolve(&self) -> Result<KeySource> {
        let flags = KeySource {
            provider: self.provider,
            path: self.path.clone(),
            key: self.key.clone(),
            value: None,
            encoding: self.double_encoded.then_some(KeyEncoding::DoubleEncoded),
        };

        match &self.config {
            Some(file) => Ok(flags.or(KeySource::load(file)?)),
            None => Ok(flags),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Withdraw all staked SUI objects
    Withdraw,

    /// Send SUI to a given address
    Send {
        /// Amount in SUI, e.g. 2.5
        #[arg(value_parser = parse_sui_amount)]
        amount: u64,

        /// Recipient address
        recipient: SuiAddress,
    },

    /// Update the reference gas price (if the account is a validator)
    UpdateGasPrice {
        /// New reference gas price in MIST
        price: u64,

        /// Update the price of this validator (the account must hold its operation capability)
        #[arg(long)]
        validator: Option<SuiAddress>,
    },

    /// Update the commission rate (if the account is a validator)
    UpdateCommissionRate {
        /// New commission rate in basis points (100 = 1%)
        rate: u64,

        /// Update the rate of this validator (the account must hold its operation capability)
        #[arg(long)]
        validator: Option<SuiAddress>,
    },
}

impl Commands {
    fn into_request(self) -> OperationRequest {
        match self {
            Commands::Withdraw => OperationRequest::Withdraw,
            Commands::Send { amount, recipient } => OperationRequest::Send {
                amount_mist: amount,
                recipient,
            },
            Commands::UpdateGasPrice { price, validator } => {
                OperationRequest::SetGasPrice { price, validator }
            }
            Commands::UpdateCommissionRate { rate, validator } => {
                OperationRequest::SetCommissionRate { rate, validator }
            }
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (ignore if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose, cli.json_logs);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "Command failed");
            eprintln!("Error: {}", error_chain(&e));
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool, json: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    // Logs go to stderr; stdout carries the receipts
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn error_chain(error: &Error) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::from_env()?;
    let request = cli.command.into_request();
    let mut prompter = Terminal::default();

    let source = cli.key_source.resolve()?;
    let source = if source.needs_input() {
        complete_key_source(&mut prompter, source)?
    } else {
        source
    };
    let reference = source.into_reference(KeyEncoding::Plain)?;

    if let Some(question) = request.confirmation_prompt() {
        if !cli.yes && !prompter.confirm(&question)? {
            tracing::info!(operation = request.name(), "Aborted by operator");
            return Ok(());
        }
    }

    let vault = if reference.is_remote() {
        Some(config.vault.client()?)
    } else {
        None
    };
    let key = resolve_key(&reference, vault.as_ref().map(|v| v as &dyn SecretStore)).await?;
    let signer = SuiSigner::new(&key, config.sui.rpc_url.as_str())?;
    drop(key);

    tracing::info!(
        address = %signer.address(),
        rpc = %signer.endpoint(),
        "Signer ready"
    );

    let client = SuiRpcClient::new(signer.endpoint().clone());
    let runner = OperationRunner::new(&client, &signer, &config.sui);
    let result = runner.run(request).await?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
