//! CLI command implementations.

use chainvault_client::{spawn_poller, value_portfolio, BackendClient, Holding, TokenBalance};
use chainvault_tx::fees::{
    check_tron_native, check_trc20, ERC20_TRANSFER_GAS, NATIVE_TRANSFER_GAS, SOL_TRANSFER_COMPUTE_UNITS,
    SPL_TRANSFER_COMPUTE_UNITS, TRON_TRANSFER_FEE_SUN,
};
use chainvault_tx::solana::{parse_blockhash, TOKEN_PROGRAM_ID};
use chainvault_tx::tron::trc20_transfer_parameter;
use chainvault_tx::{
    associated_token_address, buffered_gas_limit, erc20_transfer_data, select_eip1559_fees, ComputeBudget,
    FeeSpeed, SolanaFeeParams, TronTransferIntent,
};
use chainvault_types::{Address, Amount, Chain, EvmAddress, SolanaAddress, TronAddress};
use chainvault_wallet::validation::{
    validate_amount, validate_pin, validate_pin_confirmation, validate_recipient, validate_word_count,
};
use chainvault_wallet::{
    Erc20Transfer, EvmTransfer, FileStore, KeySource, SolTransfer, SplTokenTransfer, UnlockedVault, Vault,
    WalletError, WalletSettings,
};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use dialoguer::{Confirm, Password};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{self, CliConfig};
use crate::output::*;
use crate::telemetry;

/// Main CLI.
#[derive(Parser)]
#[command(name = "chainvault")]
#[command(about = "Chainvault - non-custodial wallet for EVM, Solana and Tron")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Config file (default ~/.chainvault/config.toml)
    #[arg(long, global = true, env = "CHAINVAULT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Backend URL
    #[arg(long, global = true, env = "CHAINVAULT_BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Backend project key
    #[arg(long, global = true, env = "CHAINVAULT_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Wallet management
    #[command(subcommand)]
    Wallet(WalletCommands),

    /// Show balances and their fiat value
    Balance {
        /// HD account index (defaults to the configured account)
        #[arg(short, long)]
        account: Option<u32>,
        /// Include token balances
        #[arg(short, long)]
        tokens: bool,
        /// Keep refreshing until interrupted
        #[arg(short, long)]
        watch: bool,
    },

    /// Show recent transactions
    History {
        chain: Chain,
        #[arg(short, long)]
        account: Option<u32>,
        #[arg(short, long, default_value = "20")]
        limit: u32,
    },

    /// Send a transfer
    #[command(subcommand)]
    Send(SendCommands),

    /// Sign a message with the EVM key (personal_sign)
    SignMessage {
        message: String,
        #[command(flatten)]
        key: KeyArgs,
    },

    /// Configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Wallet commands.
#[derive(Subcommand)]
pub enum WalletCommands {
    /// Create a new wallet with a fresh seed phrase
    Create,
    /// Restore a wallet from a seed phrase
    Import,
    /// List derived and imported addresses
    Addresses,
    /// Derive the next HD account
    AddAccount,
    /// Show the seed phrase (WARNING: exposes all funds)
    Reveal,
    /// Change the wallet PIN
    ChangePin,
    /// Import a single private key
    ImportKey {
        chain: Chain,
    },
    /// Delete the wallet from this device
    Reset,
}

/// Which key signs a transaction.
#[derive(Args, Debug, Clone, Default)]
pub struct KeyArgs {
    /// HD account index (defaults to the configured account)
    #[arg(short, long, conflicts_with = "from")]
    pub account: Option<u32>,
    /// Sign with an imported key by address
    #[arg(long)]
    pub from: Option<String>,
}

impl KeyArgs {
    pub fn source(&self, settings: &WalletSettings) -> KeySource {
        match &self.from {
            Some(address) => KeySource::Imported(address.clone()),
            None => KeySource::Account(self.account.unwrap_or(settings.default_account)),
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct SendArgs {
    #[command(flatten)]
    pub key: KeyArgs,
    /// Fee speed: slow, standard or fast
    #[arg(long)]
    pub speed: Option<FeeSpeed>,
    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,
}

/// Transfer commands.
#[derive(Subcommand)]
pub enum SendCommands {
    /// Send ETH (or the configured EVM chain's native coin)
    Evm {
        to: String,
        amount: String,
        #[arg(long)]
        gas_limit: Option<u64>,
        #[command(flatten)]
        opts: SendArgs,
    },
    /// Send an ERC-20 token
    Erc20 {
        /// Token contract
        token: String,
        to: String,
        amount: String,
        #[arg(long)]
        gas_limit: Option<u64>,
        #[command(flatten)]
        opts: SendArgs,
    },
    /// Send SOL
    Solana {
        to: String,
        amount: String,
        #[command(flatten)]
        opts: SendArgs,
    },
    /// Send an SPL token
    Spl {
        mint: String,
        to: String,
        amount: String,
        #[command(flatten)]
        opts: SendArgs,
    },
    /// Send TRX
    Tron {
        to: String,
        amount: String,
        #[command(flatten)]
        opts: SendArgs,
    },
    /// Send a TRC-20 token
    Trc20 {
        /// Token contract
        contract: String,
        to: String,
        amount: String,
        /// Energy fee cap in sun
        #[arg(long, default_value_t = chainvault_tx::fees::DEFAULT_TRON_FEE_LIMIT_SUN)]
        fee_limit: u64,
        #[command(flatten)]
        opts: SendArgs,
    },
}

/// Config commands.
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show CLI config and wallet settings
    Show,
    /// Set a CLI config key or wallet setting
    Set {
        /// Key
        key: String,
        /// Value
        value: String,
    },
}

/// Resolved configuration plus the wallet it points at.
pub struct Context {
    pub config: CliConfig,
    pub vault: Vault<FileStore>,
}

impl Context {
    pub fn open(config: CliConfig) -> anyhow::Result<Self> {
        let store = FileStore::open(config.store_path())?;
        Ok(Self {
            config,
            vault: Vault::new(store),
        })
    }

    pub fn client(&self) -> anyhow::Result<BackendClient> {
        Ok(BackendClient::with_timeout(
            self.config.backend_url.clone(),
            self.config.api_key.clone(),
            Duration::from_secs(self.config.request_timeout_secs),
        )?)
    }

    fn unlock(&self) -> anyhow::Result<UnlockedVault> {
        let pin = prompt_pin("Enter PIN")?;
        Ok(self.vault.unlock(&pin)?)
    }
}

/// Apply flag and environment overrides to a loaded config.
pub fn apply_overrides(mut config: CliConfig, cli: &Cli) -> anyhow::Result<CliConfig> {
    if let Some(url) = &cli.backend_url {
        config.set("backend_url", url)?;
    }
    if let Some(key) = &cli.api_key {
        config.set("api_key", key)?;
    }
    Ok(config)
}

/// Execute a parsed command line.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => CliConfig::config_path()?,
    };
    let config = apply_overrides(CliConfig::load_from(&config_path)?, &cli)?;

    let directive = telemetry::filter_directive(&config.log_level, cli.verbose);
    match &config.log_file {
        Some(file) => telemetry::init_telemetry_with_file(&directive, config.log_json, file)?,
        None => telemetry::init_telemetry(&directive, config.log_json)?,
    }

    let ctx = Context::open(config)?;
    match cli.command {
        Commands::Wallet(cmd) => execute_wallet(cmd, &ctx).await,
        Commands::Balance { account, tokens, watch } => execute_balance(&ctx, account, tokens, watch).await,
        Commands::History { chain, account, limit } => execute_history(&ctx, chain, account, limit).await,
        Commands::Send(cmd) => execute_send(cmd, &ctx).await,
        Commands::SignMessage { message, key } => execute_sign_message(&ctx, &message, &key),
        Commands::Config(cmd) => execute_config(cmd, &ctx, &config_path),
    }
}

// ============ Prompts ============

fn prompt_pin(prompt: &str) -> anyhow::Result<String> {
    Ok(Password::new().with_prompt(prompt).interact()?)
}

/// Ask for a new PIN twice and check its format.
fn prompt_new_pin(length: usize) -> anyhow::Result<String> {
    let pin = Password::new()
        .with_prompt(format!("Choose a {}-digit PIN", length))
        .interact()?;
    validate_pin(&pin, length)?;
    let confirmation = Password::new().with_prompt("Confirm PIN").interact()?;
    validate_pin_confirmation(&pin, &confirmation)?;
    Ok(pin)
}

fn confirm(prompt: &str, skip: bool) -> anyhow::Result<bool> {
    if skip {
        return Ok(true);
    }
    Ok(Confirm::new().with_prompt(prompt).default(false).interact()?)
}

// ============ Wallet ============

async fn execute_wallet(cmd: WalletCommands, ctx: &Context) -> anyhow::Result<()> {
    let settings = ctx.vault.settings()?;

    match cmd {
        WalletCommands::Create => {
            if ctx.vault.is_initialized()? {
                return Err(WalletError::AlreadyInitialized.into());
            }
            let pin = prompt_new_pin(settings.pin_length)?;
            let created = ctx.vault.create(&pin)?;

            print_success("Created wallet");
            print_warning("Write these words down in order and keep them offline.");
            print_warning("Anyone with this phrase controls your funds.");
            println!();
            print_mnemonic(&created.mnemonic.words().collect::<Vec<_>>());
            println!();
            print_account(&created.addresses, true);
        }

        WalletCommands::Import => {
            if ctx.vault.is_initialized()? {
                return Err(WalletError::AlreadyInitialized.into());
            }
            let phrase = Password::new().with_prompt("Seed phrase").interact()?;
            let words = validate_word_count(&phrase)?;
            let pin = prompt_new_pin(settings.pin_length)?;
            let addresses = ctx.vault.import(&phrase, &pin)?;

            print_success(&format!("Restored wallet from {}-word phrase", words));
            print_account(&addresses, true);
        }

        WalletCommands::Addresses => {
            if !ctx.vault.is_initialized()? {
                println!("{}", "No wallet found".yellow());
                println!("Create one with: chainvault wallet create");
                return Ok(());
            }
            for addresses in ctx.vault.all_addresses()? {
                print_account(&addresses, addresses.index == settings.default_account);
            }
            print_imported(&ctx.vault.imported_accounts()?);
        }

        WalletCommands::AddAccount => {
            let pin = prompt_pin("Enter PIN")?;
            let addresses = ctx.vault.add_account(&pin)?;
            print_success(&format!("Added account {}", addresses.index));
            print_account(&addresses, false);
        }

        WalletCommands::Reveal => {
            if !confirm("WARNING: This will display your seed phrase. Continue?", false)? {
                println!("Cancelled");
                return Ok(());
            }
            let pin = prompt_pin("Enter PIN")?;
            let mnemonic = ctx.vault.reveal_mnemonic(&pin)?;
            print_mnemonic(&mnemonic.words().collect::<Vec<_>>());
            print_warning("Clear your terminal after copying.");
        }

        WalletCommands::ChangePin => {
            let old_pin = prompt_pin("Current PIN")?;
            let new_pin = prompt_new_pin(settings.pin_length)?;
            ctx.vault.change_pin(&old_pin, &new_pin)?;
            print_success("PIN changed");
        }

        WalletCommands::ImportKey { chain } => {
            let prompt = match chain {
                Chain::Solana => "Private key (base58)",
                Chain::Evm | Chain::Tron => "Private key (hex)",
            };
            let secret = Password::new().with_prompt(prompt).interact()?;
            let pin = prompt_pin("Enter PIN")?;
            let address = ctx.vault.import_private_key(chain, &secret, &pin)?;
            print_success(&format!("Imported {} key", chain));
            println!("Address: {}", address.to_string().bright_cyan());
        }

        WalletCommands::Reset => {
            if !confirm(
                "Delete the wallet from this device? Funds are only recoverable with the seed phrase.",
                false,
            )? {
                println!("Reset cancelled");
                return Ok(());
            }
            ctx.vault.reset()?;
            print_success("Wallet removed");
        }
    }

    Ok(())
}

// ============ Balances ============

/// Native and (optionally) token holdings of one account.
async fn fetch_holdings(
    client: &BackendClient,
    addresses: &[(Chain, String)],
    tokens: bool,
) -> Result<Vec<Holding>, chainvault_client::ClientError> {
    let mut holdings = Vec::new();
    for (chain, address) in addresses {
        let balance = client.balance(*chain, address).await?;
        holdings.push(Holding::native(*chain, balance));
        if tokens {
            for token in client.token_balances(*chain, address).await? {
                holdings.push(Holding::token(*chain, &token));
            }
        }
    }
    Ok(holdings)
}

async fn execute_balance(ctx: &Context, account: Option<u32>, tokens: bool, watch: bool) -> anyhow::Result<()> {
    let settings = ctx.vault.settings()?;
    let index = account.unwrap_or(settings.default_account);
    let account_addresses = ctx.vault.addresses(index)?;
    let addresses: Vec<(Chain, String)> = Chain::ALL
        .iter()
        .map(|c| (*c, account_addresses.get(*c).to_string()))
        .collect();
    let client = ctx.client()?;
    let currency = settings.currency.clone();

    if !watch {
        let spinner = create_spinner("Fetching balances");
        let holdings = fetch_holdings(&client, &addresses, tokens).await;
        spinner.finish_and_clear();
        let holdings = holdings?;
        let symbols: Vec<&str> = holdings.iter().map(|h| h.symbol.as_str()).collect();
        let prices = client.prices(&symbols, &currency).await?;
        print_portfolio(&value_portfolio(&holdings, &prices));
        return Ok(());
    }

    let period = Duration::from_secs(ctx.config.poll_interval_secs);
    let mut handle = spawn_poller(period, move || {
        let client = client.clone();
        let addresses = addresses.clone();
        let currency = currency.clone();
        async move {
            let holdings = fetch_holdings(&client, &addresses, tokens).await?;
            let symbols: Vec<&str> = holdings.iter().map(|h| h.symbol.as_str()).collect();
            let prices = client.prices(&symbols, &currency).await?;
            Ok::<_, chainvault_client::ClientError>(value_portfolio(&holdings, &prices))
        }
    });

    print_info(&format!(
        "Refreshing every {}s, press Ctrl-C to stop",
        ctx.config.poll_interval_secs
    ));
    loop {
        tokio::select! {
            snapshot = handle.changed() => {
                let Some(snapshot) = snapshot else { break };
                match (&snapshot.value, &snapshot.last_error) {
                    (_, Some(err)) => print_warning(&format!("Refresh failed: {}", err)),
                    (Some(portfolio), None) => print_portfolio(portfolio),
                    (None, None) => {}
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    handle.stop().await;
    Ok(())
}

async fn execute_history(ctx: &Context, chain: Chain, account: Option<u32>, limit: u32) -> anyhow::Result<()> {
    let settings = ctx.vault.settings()?;
    let index = account.unwrap_or(settings.default_account);
    let address = ctx.vault.addresses(index)?.get(chain).to_string();
    let entries = ctx.client()?.history(chain, &address, Some(limit)).await?;
    print_history(&entries);
    Ok(())
}

// ============ Transfers ============

pub(crate) fn evm_recipient(input: &str, own: &Address) -> anyhow::Result<EvmAddress> {
    match validate_recipient(Chain::Evm, input, Some(own))? {
        Address::Evm(a) => Ok(a),
        other => anyhow::bail!("not an EVM address: {}", other),
    }
}

fn solana_recipient(input: &str, own: &Address) -> anyhow::Result<SolanaAddress> {
    match validate_recipient(Chain::Solana, input, Some(own))? {
        Address::Solana(a) => Ok(a),
        other => anyhow::bail!("not a Solana address: {}", other),
    }
}

fn tron_recipient(input: &str, own: &Address) -> anyhow::Result<TronAddress> {
    match validate_recipient(Chain::Tron, input, Some(own))? {
        Address::Tron(a) => Ok(a),
        other => anyhow::bail!("not a Tron address: {}", other),
    }
}

pub(crate) fn base_units_u64(amount: &Amount) -> anyhow::Result<u64> {
    u64::try_from(amount.base_units()).map_err(|_| anyhow::anyhow!("amount {} is too large", amount))
}

/// Token entry for `contract` among the account's balances.
pub(crate) fn find_token<'a>(balances: &'a [TokenBalance], contract: &str) -> anyhow::Result<&'a TokenBalance> {
    balances
        .iter()
        .find(|t| t.contract.eq_ignore_ascii_case(contract))
        .ok_or_else(|| anyhow::anyhow!("No balance found for token {}", contract))
}

pub(crate) fn priority_budget(units: u32, price: u64) -> Option<ComputeBudget> {
    (price > 0).then_some(ComputeBudget {
        unit_limit: units,
        unit_price_micro_lamports: price,
    })
}

async fn broadcast(client: &BackendClient, chain: Chain, signed_tx: String) -> anyhow::Result<()> {
    let spinner = create_spinner("Broadcasting");
    let result = client.broadcast(chain, signed_tx).await;
    spinner.finish_and_clear();
    let hash = result.map_err(|e| WalletError::BroadcastFailed(e.to_string()))?;
    print_success("Transaction sent");
    println!("Hash: {}", hash.bright_cyan());
    Ok(())
}

async fn execute_send(cmd: SendCommands, ctx: &Context) -> anyhow::Result<()> {
    let settings = ctx.vault.settings()?;
    let client = ctx.client()?;
    let chain_id = settings.network.evm_chain_id;

    match cmd {
        SendCommands::Evm { to, amount, gas_limit, opts } => {
            let unlocked = ctx.unlock()?;
            let source = opts.key.source(&settings);
            let from = unlocked.address(Chain::Evm, &source)?;
            let to = evm_recipient(&to, &from)?;
            let amount = validate_amount(&amount, Chain::Evm.native_decimals())?;

            let spinner = create_spinner("Fetching nonce and fees");
            let from_str = from.to_string();
            let fetched = tokio::try_join!(
                client.nonce(chain_id, &from_str),
                client.evm_fees(chain_id),
                client.balance(Chain::Evm, &from_str),
            );
            spinner.finish_and_clear();
            let (nonce, estimate, balance) = fetched?;

            let fees = select_eip1559_fees(&estimate, opts.speed.unwrap_or(settings.fee_speed))?;
            let gas_limit = gas_limit.unwrap_or(NATIVE_TRANSFER_GAS);
            let signed = unlocked.sign_evm_transfer(
                &source,
                &EvmTransfer {
                    chain_id,
                    nonce,
                    to,
                    value: amount.base_units(),
                    gas_limit,
                    fees,
                    balance: balance.base_units(),
                },
            )?;

            let max_fee = Amount::from_base_units(fees.max_total(gas_limit)?, 18);
            print_transfer_summary(
                Chain::Evm,
                &from.to_string(),
                &to.to_string(),
                &format_amount(&amount, Chain::Evm.native_symbol()),
                &format_amount(&max_fee, Chain::Evm.native_symbol()),
            );
            if !confirm("Send this transaction?", opts.yes)? {
                println!("Cancelled");
                return Ok(());
            }
            broadcast(&client, Chain::Evm, signed.raw_hex()).await
        }

        SendCommands::Erc20 { token, to, amount, gas_limit, opts } => {
            let token: EvmAddress = token.parse()?;
            let unlocked = ctx.unlock()?;
            let source = opts.key.source(&settings);
            let from = unlocked.address(Chain::Evm, &source)?;
            let to = evm_recipient(&to, &from)?;

            let spinner = create_spinner("Fetching balances, nonce and fees");
            let from_str = from.to_string();
            let fetched = tokio::try_join!(
                client.token_balances(Chain::Evm, &from_str),
                client.nonce(chain_id, &from_str),
                client.evm_fees(chain_id),
                client.balance(Chain::Evm, &from_str),
            );
            spinner.finish_and_clear();
            let (tokens, nonce, estimate, native) = fetched?;
            let info = find_token(&tokens, &token.to_string())?;
            let amount = validate_amount(&amount, info.decimals)?;

            let gas_limit = match gas_limit {
                Some(limit) => limit,
                None => {
                    let data = erc20_transfer_data(&to, amount.base_units());
                    match client
                        .estimate_gas(chain_id, &from.to_string(), &token.to_string(), &data, 0)
                        .await
                    {
                        Ok(gas) => buffered_gas_limit(gas),
                        Err(e) => {
                            tracing::warn!(error = %e, "Gas estimate failed, using default limit");
                            ERC20_TRANSFER_GAS
                        }
                    }
                }
            };
            let fees = select_eip1559_fees(&estimate, opts.speed.unwrap_or(settings.fee_speed))?;
            let signed = unlocked.sign_erc20_transfer(
                &source,
                &Erc20Transfer {
                    chain_id,
                    nonce,
                    token,
                    symbol: info.symbol.clone(),
                    recipient: to,
                    amount: amount.base_units(),
                    gas_limit,
                    fees,
                    token_balance: info.balance,
                    native_balance: native.base_units(),
                },
            )?;

            let max_fee = Amount::from_base_units(fees.max_total(gas_limit)?, 18);
            print_transfer_summary(
                Chain::Evm,
                &from.to_string(),
                &to.to_string(),
                &format_amount(&amount, &info.symbol),
                &format_amount(&max_fee, Chain::Evm.native_symbol()),
            );
            if !confirm("Send this transaction?", opts.yes)? {
                println!("Cancelled");
                return Ok(());
            }
            broadcast(&client, Chain::Evm, signed.raw_hex()).await
        }

        SendCommands::Solana { to, amount, opts } => {
            let unlocked = ctx.unlock()?;
            let source = opts.key.source(&settings);
            let from = unlocked.address(Chain::Solana, &source)?;
            let to = solana_recipient(&to, &from)?;
            let amount = validate_amount(&amount, Chain::Solana.native_decimals())?;
            let lamports = base_units_u64(&amount)?;

            let spinner = create_spinner("Fetching blockhash and fees");
            let from_str = from.to_string();
            let to_str = to.to_string();
            let fetched = tokio::try_join!(
                client.recent_blockhash(),
                client.balance(Chain::Solana, &from_str),
                client.account_exists(&to_str),
                client.solana_priority_fee(),
            );
            spinner.finish_and_clear();
            let (blockhash, balance, recipient_exists, price) = fetched?;

            let compute = priority_budget(SOL_TRANSFER_COMPUTE_UNITS, price);
            let signed = unlocked.sign_solana_transfer(
                &source,
                &SolTransfer {
                    to,
                    lamports,
                    recent_blockhash: parse_blockhash(&blockhash)?,
                    compute,
                    balance: base_units_u64(&balance)?,
                    recipient_exists,
                },
            )?;

            let fee = SolanaFeeParams {
                signatures: 1,
                creates_token_account: false,
                compute_unit_limit: compute.map(|c| c.unit_limit).unwrap_or(0),
                compute_unit_price_micro_lamports: price,
            };
            print_transfer_summary(
                Chain::Solana,
                &from.to_string(),
                &to.to_string(),
                &format_amount(&amount, Chain::Solana.native_symbol()),
                &format_amount(&Amount::from_base_units(fee.total() as u128, 9), "SOL"),
            );
            if !confirm("Send this transaction?", opts.yes)? {
                println!("Cancelled");
                return Ok(());
            }
            broadcast(&client, Chain::Solana, signed.to_base64()).await
        }

        SendCommands::Spl { mint, to, amount, opts } => {
            let mint: SolanaAddress = mint.parse()?;
            let unlocked = ctx.unlock()?;
            let source = opts.key.source(&settings);
            let from = unlocked.address(Chain::Solana, &source)?;
            let to = solana_recipient(&to, &from)?;

            let spinner = create_spinner("Fetching token accounts and fees");
            let from_str = from.to_string();
            let fetched = tokio::try_join!(
                client.token_balances(Chain::Solana, &from_str),
                client.balance(Chain::Solana, &from_str),
                client.recent_blockhash(),
                client.solana_priority_fee(),
            );
            let (tokens, sol_balance, blockhash, price) = match fetched {
                Ok(v) => v,
                Err(e) => {
                    spinner.finish_and_clear();
                    return Err(e.into());
                }
            };
            let info = find_token(&tokens, &mint.to_string())?;
            let token_program: SolanaAddress = match &info.token_program {
                Some(program) => program.parse()?,
                None => TOKEN_PROGRAM_ID,
            };
            let recipient_ata = associated_token_address(&to, &mint, &token_program)?;
            let recipient_account_exists = client.account_exists(&recipient_ata.to_string()).await;
            spinner.finish_and_clear();
            let recipient_account_exists = recipient_account_exists?;

            let amount = validate_amount(&amount, info.decimals)?;
            let request = SplTokenTransfer {
                recipient: to,
                mint,
                token_program,
                symbol: info.symbol.clone(),
                amount: base_units_u64(&amount)?,
                decimals: info.decimals,
                recipient_account_exists,
                recent_blockhash: parse_blockhash(&blockhash)?,
                compute: priority_budget(SPL_TRANSFER_COMPUTE_UNITS, price),
                token_balance: u64::try_from(info.balance)?,
                sol_balance: base_units_u64(&sol_balance)?,
            };
            let signed = unlocked.sign_spl_transfer(&source, &request)?;

            let fee = SolanaFeeParams {
                signatures: 1,
                creates_token_account: !recipient_account_exists,
                compute_unit_limit: request.compute.map(|c| c.unit_limit).unwrap_or(0),
                compute_unit_price_micro_lamports: price,
            };
            if !recipient_account_exists {
                print_info("The recipient has no account for this token; one will be created and funded with rent.");
            }
            print_transfer_summary(
                Chain::Solana,
                &from.to_string(),
                &to.to_string(),
                &format_amount(&amount, &info.symbol),
                &format_amount(&Amount::from_base_units(fee.total() as u128, 9), "SOL"),
            );
            if !confirm("Send this transaction?", opts.yes)? {
                println!("Cancelled");
                return Ok(());
            }
            broadcast(&client, Chain::Solana, signed.to_base64()).await
        }

        SendCommands::Tron { to, amount, opts } => {
            let unlocked = ctx.unlock()?;
            let source = opts.key.source(&settings);
            let from = unlocked.address(Chain::Tron, &source)?;
            let to = tron_recipient(&to, &from)?;
            let amount = validate_amount(&amount, Chain::Tron.native_decimals())?;
            let sun = base_units_u64(&amount)?;

            let spinner = create_spinner("Building transaction");
            let balance = client.balance(Chain::Tron, &from.to_string()).await;
            let balance = match balance {
                Ok(b) => base_units_u64(&b)?,
                Err(e) => {
                    spinner.finish_and_clear();
                    return Err(e.into());
                }
            };
            if let Err(e) = check_tron_native(balance, sun, TRON_TRANSFER_FEE_SUN) {
                spinner.finish_and_clear();
                return Err(WalletError::from(e).into());
            }
            let unsigned = client.build_tron_transfer(&from.to_string(), &to.to_string(), sun).await;
            spinner.finish_and_clear();
            let intent = TronTransferIntent::Trx { to, amount_sun: sun };
            let signed = unlocked.sign_tron_transaction(&source, &unsigned?, &intent)?;

            print_transfer_summary(
                Chain::Tron,
                &from.to_string(),
                &to.to_string(),
                &format_amount(&amount, Chain::Tron.native_symbol()),
                &format_amount(&Amount::from_base_units(TRON_TRANSFER_FEE_SUN as u128, 6), "TRX"),
            );
            if !confirm("Send this transaction?", opts.yes)? {
                println!("Cancelled");
                return Ok(());
            }
            broadcast(&client, Chain::Tron, serde_json::to_string(&signed)?).await
        }

        SendCommands::Trc20 { contract, to, amount, fee_limit, opts } => {
            let contract: TronAddress = contract.parse()?;
            let unlocked = ctx.unlock()?;
            let source = opts.key.source(&settings);
            let from = unlocked.address(Chain::Tron, &source)?;
            let to = tron_recipient(&to, &from)?;

            let spinner = create_spinner("Building transaction");
            let from_str = from.to_string();
            let fetched = tokio::try_join!(
                client.token_balances(Chain::Tron, &from_str),
                client.balance(Chain::Tron, &from_str),
            );
            let (tokens, trx) = match fetched {
                Ok(v) => v,
                Err(e) => {
                    spinner.finish_and_clear();
                    return Err(e.into());
                }
            };
            let info = find_token(&tokens, &contract.to_string())?;
            let amount = validate_amount(&amount, info.decimals)?;
            if let Err(e) = check_trc20(
                &info.symbol,
                info.balance,
                amount.base_units(),
                base_units_u64(&trx)?,
                fee_limit,
            ) {
                spinner.finish_and_clear();
                return Err(WalletError::from(e).into());
            }
            let parameter = trc20_transfer_parameter(&to, amount.base_units());
            let unsigned = client
                .build_trc20_transfer(&from.to_string(), &contract.to_string(), &parameter, fee_limit)
                .await;
            spinner.finish_and_clear();
            let intent = TronTransferIntent::Trc20 {
                contract,
                to,
                amount: amount.base_units(),
            };
            let signed = unlocked.sign_tron_transaction(&source, &unsigned?, &intent)?;

            print_transfer_summary(
                Chain::Tron,
                &from.to_string(),
                &to.to_string(),
                &format_amount(&amount, &info.symbol),
                &format_amount(&Amount::from_base_units(fee_limit as u128, 6), "TRX"),
            );
            if !confirm("Send this transaction?", opts.yes)? {
                println!("Cancelled");
                return Ok(());
            }
            broadcast(&client, Chain::Tron, serde_json::to_string(&signed)?).await
        }
    }
}

fn execute_sign_message(ctx: &Context, message: &str, key: &KeyArgs) -> anyhow::Result<()> {
    let settings = ctx.vault.settings()?;
    let unlocked = ctx.unlock()?;
    let source = key.source(&settings);
    let address = unlocked.address(Chain::Evm, &source)?;
    let signature = unlocked.sign_evm_message(&source, message.as_bytes())?;
    println!("Address:   {}", address.to_string().bright_cyan());
    println!("Signature: {}", signature);
    Ok(())
}

// ============ Config ============

fn execute_config(cmd: ConfigCommands, ctx: &Context, config_path: &std::path::Path) -> anyhow::Result<()> {
    match cmd {
        ConfigCommands::Show => {
            println!("{}", "CLI Configuration".bold());
            println!("{}", "=".repeat(50));
            for key in config::FIELDS {
                println!("{:<22} {}", key, ctx.config.get(key)?.bright_cyan());
            }
            println!();

            let settings = ctx.vault.settings()?;
            println!("{}", "Wallet Settings".bold());
            println!("{}", "=".repeat(50));
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }

        ConfigCommands::Set { key, value } => {
            if CliConfig::has_field(&key) {
                // reload so flag overrides are not persisted
                let mut config = CliConfig::load_from(config_path)?;
                config.set(&key, &value)?;
                config.save_to(config_path)?;
            } else {
                let mut settings = ctx.vault.settings()?;
                settings.set_field(&key, &value)?;
                ctx.vault.save_settings(&settings)?;
            }
            print_success(&format!("Set {} = {}", key, value));
        }
    }

    Ok(())
}
