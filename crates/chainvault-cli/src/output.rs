//! Output formatting utilities.
//!
//! Pretty printing for CLI commands.

use chainvault_client::{HistoryEntry, PortfolioValue, TxStatus};
use chainvault_types::{Amount, Chain};
use chainvault_wallet::{AccountAddresses, ImportedAccount};
use colored::Colorize;
use tabled::{Table, Tabled};

/// Shorten a long address or hash for tables.
pub fn format_address_short(addr: &str) -> String {
    let chars: Vec<char> = addr.chars().collect();
    if chars.len() > 20 {
        let head: String = chars[..10].iter().collect();
        let tail: String = chars[chars.len() - 8..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        addr.to_string()
    }
}

/// Amount with its ticker.
pub fn format_amount(amount: &Amount, symbol: &str) -> String {
    format!("{} {}", amount, symbol)
}

pub fn format_fiat(value: f64, currency: &str) -> String {
    format!("{:.2} {}", value, currency.to_ascii_uppercase())
}

/// Print success message.
pub fn print_success(msg: &str) {
    println!("{}", format!("✓ {}", msg).green());
}

/// Print error message.
pub fn print_error(msg: &str) {
    eprintln!("{}", format!("✗ {}", msg).red());
}

/// Print warning message.
pub fn print_warning(msg: &str) {
    println!("{}", format!("⚠ {}", msg).yellow());
}

/// Print info message.
pub fn print_info(msg: &str) {
    println!("{}", format!("ℹ {}", msg).blue());
}

/// Print a seed phrase as a numbered grid.
pub fn print_mnemonic(words: &[&str]) {
    println!("{}", "Seed phrase".bold());
    println!("{}", "=".repeat(50));
    for (row, chunk) in words.chunks(4).enumerate() {
        let line: Vec<String> = chunk
            .iter()
            .enumerate()
            .map(|(col, word)| format!("{:>2}. {:<10}", row * 4 + col + 1, word))
            .collect();
        println!("{}", line.join(" ").bright_yellow());
    }
}

/// Print addresses of one HD account.
pub fn print_account(addresses: &AccountAddresses, is_default: bool) {
    let marker = if is_default { " (default)" } else { "" };
    println!("{}{}", format!("Account {}", addresses.index).bold(), marker.yellow());
    for chain in Chain::ALL {
        println!("  {:<7} {}", chain.to_string(), addresses.get(chain).to_string().bright_cyan());
    }
}

pub fn print_imported(accounts: &[ImportedAccount]) {
    if accounts.is_empty() {
        return;
    }
    println!("{}", "Imported keys".bold());
    for account in accounts {
        println!("  {:<7} {}", account.chain.to_string(), account.address.to_string().bright_cyan());
    }
}

/// Print a valued balance table.
pub fn print_portfolio(portfolio: &PortfolioValue) {
    #[derive(Tabled)]
    struct BalanceRow {
        chain: String,
        asset: String,
        balance: String,
        value: String,
    }

    let rows: Vec<BalanceRow> = portfolio
        .holdings
        .iter()
        .map(|h| BalanceRow {
            chain: h.chain.to_string(),
            asset: h.symbol.clone(),
            balance: h.amount.clone(),
            value: h
                .value
                .map(|v| format_fiat(v, &portfolio.currency))
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect();

    println!("{}", Table::new(rows));
    println!(
        "Total: {}",
        format_fiat(portfolio.total, &portfolio.currency).bright_green().bold()
    );
}

/// Print transaction history rows.
pub fn print_history(entries: &[HistoryEntry]) {
    #[derive(Tabled)]
    struct HistoryRow {
        hash: String,
        from: String,
        to: String,
        amount: String,
        status: String,
    }

    if entries.is_empty() {
        println!("{}", "No transactions found".yellow());
        return;
    }

    let rows: Vec<HistoryRow> = entries
        .iter()
        .map(|e| HistoryRow {
            hash: format_address_short(&e.hash),
            from: format_address_short(&e.from),
            to: format_address_short(&e.to),
            amount: format_amount(&Amount::from_base_units(e.amount, e.decimals), &e.symbol),
            status: match e.status {
                TxStatus::Pending => "pending".to_string(),
                TxStatus::Confirmed => "confirmed".to_string(),
                TxStatus::Failed => "failed".to_string(),
            },
        })
        .collect();

    println!("{}", Table::new(rows));
}

/// Print the summary shown before a transfer is broadcast.
pub fn print_transfer_summary(chain: Chain, from: &str, to: &str, amount: &str, max_fee: &str) {
    println!("{}", "Transfer".bold());
    println!("{}", "=".repeat(50));
    println!("Network:  {}", chain.to_string().bright_green());
    println!("From:     {}", from.bright_cyan());
    println!("To:       {}", to.bright_cyan());
    println!("Amount:   {}", amount.bright_yellow());
    println!("Max fee:  {}", max_fee);
}

/// Spinner shown while waiting on the backend.
pub fn create_spinner(msg: &str) -> indicatif::ProgressBar {
    let pb = indicatif::ProgressBar::new_spinner();
    if let Ok(style) = indicatif::ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
