use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::application::{AppError, WalletService, DEFAULT_RECENT_LIMIT};
use crate::domain::{
    format_amount, parse_amount, round_display, Amount, BankDetails, Currency, Transaction,
    TransactionFilter, TransactionStatus, TransactionType,
};
use crate::io::{ExportError, ExportFormat, Exporter};
use crate::storage::SqliteStore;

/// Billfold - Multi-currency demo wallet
#[derive(Parser)]
#[command(name = "billfold")]
#[command(about = "A local-first multi-currency demo wallet with fixed exchange rates")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "billfold.db", env = "BILLFOLD_DB")]
    pub database: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in with a mobile number and one-time code
    Login {
        /// 10-digit mobile number
        mobile: String,

        /// One-time code (the demo code is 1234)
        #[arg(long)]
        otp: String,
    },

    /// Sign out of the current session
    Logout,

    /// Show the balance for one currency or all of them
    Balance {
        /// Currency code (omit for all currencies)
        currency: Option<String>,
    },

    /// Add funds to the wallet
    Add {
        /// Amount to add (e.g., "500" or "12.50")
        #[arg(allow_hyphen_values = true)]
        amount: String,

        /// Currency code: INR, USD, EUR, GBP
        #[arg(short, long, default_value = "INR")]
        currency: String,
    },

    /// Withdraw funds to a bank account
    Withdraw {
        /// Amount to withdraw
        #[arg(allow_hyphen_values = true)]
        amount: String,

        /// Currency code: INR, USD, EUR, GBP
        #[arg(short, long, default_value = "INR")]
        currency: String,

        /// Bank name
        #[arg(long)]
        bank: String,

        /// Account number
        #[arg(long)]
        account: String,

        /// Bank routing code (IFSC)
        #[arg(long, alias = "ifsc")]
        routing: String,

        /// Show the withdrawal summary without withdrawing
        #[arg(long)]
        dry_run: bool,
    },

    /// Exchange funds between currencies at the fixed rates
    Exchange {
        /// Amount of the source currency
        #[arg(allow_hyphen_values = true)]
        amount: String,

        /// Source currency code
        #[arg(long)]
        from: String,

        /// Target currency code
        #[arg(long)]
        to: String,
    },

    /// Preview an exchange without committing it
    Quote {
        /// Amount of the source currency
        #[arg(allow_hyphen_values = true)]
        amount: String,

        /// Source currency code
        #[arg(long)]
        from: String,

        /// Target currency code
        #[arg(long)]
        to: String,
    },

    /// Show the most recent transactions
    Recent {
        /// Number of transactions to show
        #[arg(short, long, default_value_t = DEFAULT_RECENT_LIMIT)]
        limit: usize,
    },

    /// List transactions, newest first
    Transactions {
        #[command(flatten)]
        filter: FilterArgs,

        /// Maximum number of transactions to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Export transactions to a file
    Export {
        /// Format: csv, excel, pdf, json
        #[arg(short, long, default_value = "csv")]
        format: String,

        /// Output file (defaults to transactions.<ext>)
        #[arg(short, long)]
        output: Option<String>,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Restore the starting balance and erase all history
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

#[derive(clap::Args, Debug, Default)]
pub struct FilterArgs {
    /// Only transactions on or after this date (YYYY-MM-DD)
    #[arg(long)]
    pub from_date: Option<String>,

    /// Only transactions on or before this date (YYYY-MM-DD)
    #[arg(long)]
    pub to_date: Option<String>,

    /// Transaction type: add, withdraw, exchange
    #[arg(short = 't', long = "type")]
    pub transaction_type: Option<String>,

    /// Status: completed, pending, failed
    #[arg(long)]
    pub status: Option<String>,

    /// Case-insensitive text search
    #[arg(short, long)]
    pub search: Option<String>,
}

impl FilterArgs {
    pub fn to_filter(&self) -> Result<TransactionFilter> {
        let transaction_type = self
            .transaction_type
            .as_deref()
            .map(|s| {
                TransactionType::from_str(s).with_context(|| {
                    format!("Invalid transaction type '{}'. Valid: add, withdraw, exchange", s)
                })
            })
            .transpose()?;
        let status = self
            .status
            .as_deref()
            .map(|s| {
                TransactionStatus::from_str(s).with_context(|| {
                    format!("Invalid status '{}'. Valid: completed, pending, failed", s)
                })
            })
            .transpose()?;

        Ok(TransactionFilter {
            from_date: self
                .from_date
                .as_deref()
                .map(parse_date)
                .transpose()
                .context("Invalid from-date")?,
            to_date: self
                .to_date
                .as_deref()
                .map(parse_date)
                .transpose()
                .context("Invalid to-date")?,
            transaction_type,
            status,
            search: self.search.clone(),
        })
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let mut service = WalletService::open_path(&self.database)
            .await
            .with_context(|| format!("Failed to open wallet database: {}", self.database))?;

        match self.command {
            Commands::Login { mobile, otp } => {
                let user = service.login(&mobile, &otp).await?;
                println!("Signed in as {}", user.mobile);
            }

            Commands::Logout => {
                service.logout().await?;
                println!("Signed out.");
            }

            Commands::Balance { currency } => {
                run_balance_command(&service, currency.as_deref())?;
            }

            Commands::Add { amount, currency } => {
                let amount = parse_amount_arg(&amount)?;
                let currency = parse_currency(&currency)?;
                let committed = report_commit(service.add_funds(amount, currency).await)?;
                println!(
                    "Added {} (balance {})",
                    format_amount(amount, currency),
                    format_amount(committed.balance.get(currency), currency)
                );
            }

            Commands::Withdraw {
                amount,
                currency,
                bank,
                account,
                routing,
                dry_run,
            } => {
                let amount = parse_amount_arg(&amount)?;
                let currency = parse_currency(&currency)?;
                let details = BankDetails::new(bank, account, routing);

                let preview = service.preview_withdrawal(amount, currency, &details)?;
                println!("Withdrawal summary:");
                println!("  Amount:    {}", format_amount(preview.amount, currency));
                println!("  Available: {}", format_amount(preview.available, currency));
                println!("  Remaining: {}", format_amount(preview.remaining, currency));
                println!("  Bank:      {}", preview.bank_name);
                println!("  Account:   {}", preview.masked_account_number);
                println!("  IFSC:      {}", preview.routing_code);

                if !dry_run {
                    let committed =
                        report_commit(service.withdraw(amount, currency, details).await)?;
                    println!("{}", committed.transaction.description);
                }
            }

            Commands::Exchange { amount, from, to } => {
                let amount = parse_amount_arg(&amount)?;
                let from = parse_currency(&from)?;
                let to = parse_currency(&to)?;
                let committed = report_commit(service.exchange(amount, from, to).await)?;
                println!("{}", committed.transaction.description);
            }

            Commands::Quote { amount, from, to } => {
                let amount = parse_amount_arg(&amount)?;
                let from = parse_currency(&from)?;
                let to = parse_currency(&to)?;
                let quote = service.quote_exchange(amount, from, to)?;

                println!(
                    "{} = {}",
                    format_amount(quote.amount, from),
                    format_amount(quote.converted_amount, to)
                );
                println!("Rate: 1 {} = {:.6} {}", from, quote.rate, to);
                if !quote.sufficient_funds {
                    println!(
                        "Insufficient balance: available {}",
                        format_amount(service.balance().get(from), from)
                    );
                }
            }

            Commands::Recent { limit } => {
                print_transactions(&service.recent_transactions(limit));
            }

            Commands::Transactions { filter, limit } => {
                let filter = filter.to_filter()?;
                let mut transactions = service.list_transactions(&filter);
                if let Some(limit) = limit {
                    transactions.truncate(limit);
                }
                print_transactions(&transactions);
            }

            Commands::Export {
                format,
                output,
                filter,
            } => {
                run_export_command(&service, &format, output.as_deref(), &filter)?;
            }

            Commands::Reset { yes } => {
                if !yes {
                    anyhow::bail!("Reset erases all transactions. Re-run with --yes to confirm");
                }
                service.reset().await?;
                println!("Wallet reset to the starting balance.");
            }
        }

        Ok(())
    }
}

fn run_balance_command(
    service: &WalletService<SqliteStore>,
    currency: Option<&str>,
) -> Result<()> {
    match currency {
        Some(code) => {
            let currency = parse_currency(code)?;
            println!("{}: {}", currency, service.formatted_balance(currency));
        }
        None => {
            println!("{:<10} {:>14}", "CURRENCY", "BALANCE");
            println!("{}", "-".repeat(25));
            for (currency, amount) in service.balance().iter() {
                println!(
                    "{:<10} {:>14}",
                    currency.as_str(),
                    format_amount(amount, currency)
                );
            }
        }
    }
    Ok(())
}

fn run_export_command(
    service: &WalletService<SqliteStore>,
    format: &str,
    output: Option<&str>,
    filter: &FilterArgs,
) -> Result<()> {
    use std::fs::File;
    use std::io::BufWriter;

    let format = ExportFormat::from_str(format).with_context(|| {
        format!("Invalid export format '{}'. Valid: csv, excel, pdf, json", format)
    })?;
    let filter = filter.to_filter()?;
    let exporter = Exporter::new(service.list_transactions(&filter));

    if exporter.is_empty() {
        return Err(ExportError::NothingToExport.into());
    }

    let path = output
        .map(str::to_string)
        .unwrap_or_else(|| format.default_file_name());
    let file =
        File::create(&path).with_context(|| format!("Failed to create output file: {}", path))?;

    let count = exporter.export(format, BufWriter::new(file))?;
    eprintln!("Exported {} transactions to {}", count, path);
    Ok(())
}

/// Turn a service result into CLI output. A persistence failure still means
/// the operation happened, so say so before returning the error.
fn report_commit<T>(result: Result<T, AppError>) -> Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(err @ AppError::Persistence(_)) => {
            eprintln!("Warning: the operation completed but could not be saved.");
            Err(err.into())
        }
        Err(err) => Err(err.into()),
    }
}

fn print_transactions(transactions: &[&Transaction]) {
    if transactions.is_empty() {
        println!("No transactions found.");
        return;
    }

    println!(
        "{:<12} {:<9} {:>12} {:<10} {:<10} DESCRIPTION",
        "DATE", "TYPE", "AMOUNT", "CURRENCY", "STATUS"
    );
    println!("{}", "-".repeat(80));

    for transaction in transactions {
        let currency = match transaction.to_currency() {
            Some(to) => format!("{}>{}", transaction.currency(), to),
            None => transaction.currency().to_string(),
        };
        println!(
            "{:<12} {:<9} {:>12.2} {:<10} {:<10} {}",
            transaction.timestamp.format("%Y-%m-%d"),
            transaction.transaction_type().as_str(),
            round_display(transaction.amount()),
            currency,
            transaction.status.as_str(),
            truncate(&transaction.description, 40)
        );
    }
}

fn parse_amount_arg(input: &str) -> Result<Amount> {
    parse_amount(input).with_context(|| {
        format!("Invalid amount '{}'. Use a number like '50' or '12.50'", input)
    })
}

fn parse_currency(code: &str) -> Result<Currency> {
    Currency::from_str(code)
        .with_context(|| format!("Unknown currency '{}'. Valid: INR, USD, EUR, GBP", code))
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").context("Date must be in YYYY-MM-DD format")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_withdraw() {
        let cli = Cli::try_parse_from([
            "billfold",
            "withdraw",
            "200",
            "--bank",
            "HDFC Bank",
            "--account",
            "50100012345678",
            "--ifsc",
            "HDFC0000123",
        ])
        .unwrap();

        match cli.command {
            Commands::Withdraw {
                amount,
                currency,
                routing,
                dry_run,
                ..
            } => {
                assert_eq!(amount, "200");
                assert_eq!(currency, "INR");
                assert_eq!(routing, "HDFC0000123");
                assert!(!dry_run);
            }
            _ => panic!("expected withdraw"),
        }
    }

    #[test]
    fn test_filter_args() {
        let args = FilterArgs {
            from_date: Some("2024-01-01".to_string()),
            transaction_type: Some("Exchange".to_string()),
            search: Some("usd".to_string()),
            ..Default::default()
        };
        let filter = args.to_filter().unwrap();
        assert_eq!(filter.from_date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(filter.transaction_type, Some(TransactionType::Exchange));
        assert!(filter.to_date.is_none());

        let bad = FilterArgs {
            status: Some("lost".to_string()),
            ..Default::default()
        };
        assert!(bad.to_filter().is_err());
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_amount_arg("12.50").unwrap(), 12.5);
        assert!(parse_amount_arg("12abc").is_err());
        assert_eq!(parse_currency("gbp").unwrap(), Currency::Gbp);
        assert!(parse_currency("JPY").is_err());
        assert!(parse_date("2024/01/01").is_err());
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("₹₹₹₹₹₹₹₹₹₹₹₹", 6), "₹₹₹...");
    }
}
