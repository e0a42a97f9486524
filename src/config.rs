use crate::domain::money::Rate;
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Marketplace coupons, commission and payouts", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub config: Config,

    #[command(subcommand)]
    pub command: Command,
}

/// Settings shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct Config {
    /// Path to persistent database (optional). Requires the `storage-rocksdb` feature.
    #[arg(long, env = "MARKET_DB_PATH", global = true)]
    pub db_path: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set.
    #[arg(long, env = "MARKET_LOG", default_value = "info", global = true)]
    pub log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long, env = "MARKET_LOG_JSON", global = true)]
    pub log_json: bool,

    /// Commission rate for stores without their own, as a fraction (0.10 = 10%).
    #[arg(long, env = "MARKET_DEFAULT_RATE", default_value = "0.10", value_parser = parse_rate, global = true)]
    pub default_rate: Rate,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API.
    Serve(ServeArgs),
    /// Settle an orders CSV into per-store payouts for one period.
    Settle(SettleArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[arg(long, env = "MARKET_ADDR", default_value = "127.0.0.1:8080")]
    pub addr: SocketAddr,

    /// JSON file mapping bearer tokens to `{"id", "type"}` identities.
    #[arg(long, env = "MARKET_TOKENS_FILE")]
    pub tokens_file: Option<PathBuf>,

    #[arg(long, env = "MARKET_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,
}

#[derive(Args, Debug)]
pub struct SettleArgs {
    /// Orders CSV with columns order_id, store_id, amount, status, date.
    pub input: PathBuf,

    /// Settlement period, YYYY-MM.
    #[arg(long)]
    pub period: String,

    /// Optional CSV of per-store rates with columns store_id, rate.
    #[arg(long)]
    pub rates: Option<PathBuf>,
}

fn parse_rate(s: &str) -> Result<Rate, String> {
    let value: Decimal = s.trim().parse().map_err(|e| format!("{}", e))?;
    Rate::new(value).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_settle_command() {
        let cli = Cli::try_parse_from([
            "market-settle",
            "settle",
            "orders.csv",
            "--period",
            "2024-01",
            "--default-rate",
            "0.15",
        ])
        .unwrap();
        assert_eq!(cli.config.default_rate.value(), dec!(0.15));
        match cli.command {
            Command::Settle(args) => {
                assert_eq!(args.input, PathBuf::from("orders.csv"));
                assert_eq!(args.period, "2024-01");
                assert!(args.rates.is_none());
            }
            Command::Serve(_) => panic!("expected settle"),
        }
    }

    #[test]
    fn test_rate_out_of_range_is_rejected() {
        assert!(parse_rate("1.5").is_err());
        assert!(parse_rate("abc").is_err());
        assert!(parse_rate("0").is_ok());
    }
}
