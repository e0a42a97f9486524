use clap::Parser;
use market_settle::application::AppContext;
use market_settle::config::{Cli, Command, Config, ServeArgs, SettleArgs};
use market_settle::domain::payout::Period;
use market_settle::infrastructure::open_repositories;
use market_settle::infrastructure::static_tokens::StaticTokenProvider;
use market_settle::interfaces::csv::order_reader::read_rates;
use market_settle::interfaces::csv::payout_writer::PayoutWriter;
use market_settle::interfaces::csv::settle::Settlement;
use market_settle::interfaces::http::build_app;
use market_settle::logging;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.config.log_level, cli.config.log_json);

    match cli.command {
        Command::Serve(args) => serve(&cli.config, args).await,
        Command::Settle(args) => settle(&cli.config, args).await,
    }
}

async fn serve(config: &Config, args: ServeArgs) -> Result<()> {
    let repos = open_repositories(config.db_path.as_deref()).into_diagnostic()?;
    let tokens = match &args.tokens_file {
        Some(path) => StaticTokenProvider::from_file(path).into_diagnostic()?,
        None => {
            tracing::warn!("No --tokens-file given; every authenticated request will be rejected");
            StaticTokenProvider::default()
        }
    };
    tracing::info!(tokens = tokens.len(), "Identity table loaded");

    let ctx = AppContext::new(&repos, Arc::new(tokens), config.default_rate);
    let app = build_app(ctx, Duration::from_secs(args.request_timeout_secs));

    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .into_diagnostic()?;
    tracing::info!(addr = %args.addr, "market-settle listening");
    axum::serve(listener, app).await.into_diagnostic()?;
    Ok(())
}

async fn settle(config: &Config, args: SettleArgs) -> Result<()> {
    let period: Period = args.period.parse().into_diagnostic()?;
    let repos = open_repositories(config.db_path.as_deref()).into_diagnostic()?;
    let ctx = AppContext::new(
        &repos,
        Arc::new(StaticTokenProvider::default()),
        config.default_rate,
    );
    let settlement = Settlement::new(&ctx, period);

    if let Some(path) = &args.rates {
        let file = File::open(path).into_diagnostic()?;
        let loaded = settlement.load_rates(read_rates(file)).await.into_diagnostic()?;
        tracing::info!(loaded, "Store rates loaded");
    }

    let file = File::open(&args.input).into_diagnostic()?;
    let (payouts, _summary) = settlement.run(file).await.into_diagnostic()?;

    let stdout = io::stdout();
    let mut writer = PayoutWriter::new(stdout.lock());
    writer.write_payouts(&payouts).into_diagnostic()?;
    Ok(())
}
