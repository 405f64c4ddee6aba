//! Leveraged Trading Position Calculator
//!
//! Sizes a leveraged position from quantity or margin, marks it against a
//! live price, and reports P&L at live/target/stop prices with ROE and
//! risk:reward.

mod api;
mod calculator;
mod config;
mod models;
mod report;

use anyhow::Result;
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::api::{
    lookup, symbol_candidates, CommentaryClient, CommentaryProvider, Quote, YahooClient,
};
use crate::calculator::{CalcError, PositionCalculator};
use crate::config::AppConfig;
use crate::models::{PositionResult, SizingMode, TradeRequest, TradeSide};
use crate::report::{currency_symbol, format_money, format_offset, Dashboard};

/// Leveraged position calculator CLI.
#[derive(Parser)]
#[command(name = "levcalc")]
#[command(about = "Position size, P&L, ROE and risk:reward for leveraged trades", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate a position and show the dashboard
    Calc(CalcArgs),

    /// Look up the live price for a symbol
    Quote {
        /// Ticker or bare name (e.g. BTC-USD, RELIANCE, TCS.NS)
        symbol: String,
    },

    /// Ask the commentary model for a short trend outlook
    Trend {
        /// Ticker or bare name
        symbol: String,
    },

    /// Show current configuration
    Config,
}

#[derive(Args)]
struct CalcArgs {
    /// Ticker or bare name (defaults to the configured symbol)
    #[arg(short, long)]
    symbol: Option<String>,

    /// Trade side (buy/long or sell/short)
    #[arg(long, default_value = "buy")]
    side: TradeSide,

    /// Entry price (defaults to the live price)
    #[arg(short, long)]
    entry: Option<Decimal>,

    /// Position size in base units
    #[arg(short, long, conflicts_with = "margin")]
    quantity: Option<Decimal>,

    /// Margin committed, in quote currency (defaults to the configured margin)
    #[arg(short, long)]
    margin: Option<Decimal>,

    /// Leverage multiplier (defaults to the configured leverage)
    #[arg(short = 'x', long)]
    leverage: Option<Decimal>,

    /// Take-profit price (defaults to live price + configured offset)
    #[arg(long)]
    tp: Option<Decimal>,

    /// Stop-loss price (defaults to live price - configured offset)
    #[arg(long)]
    sl: Option<Decimal>,

    /// Use this live price instead of looking one up
    #[arg(short, long)]
    price: Option<Decimal>,

    /// Skip the live price lookup entirely
    #[arg(long)]
    offline: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Append trend commentary
    #[arg(long)]
    trend: bool,
}

/// JSON shape of a calculation.
#[derive(Serialize)]
struct CalcOutput<'a> {
    request: &'a TradeRequest,
    quote: Option<&'a Quote>,
    result: &'a PositionResult,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    let config = AppConfig::from_env()?;

    match cli.command {
        Commands::Calc(args) => run_calc(args, &config).await?,

        Commands::Quote { symbol } => {
            let candidates = symbol_candidates(&symbol);
            let feed = YahooClient::new(&config)?;

            match lookup(&feed, &candidates).await {
                Some(quote) => {
                    let cur = currency_symbol(quote.currency.as_deref(), &quote.symbol);
                    println!("\nSymbol:   {}", quote.symbol);
                    println!("Price:    {}", format_money(quote.price, &cur));
                    println!("Currency: {}", quote.currency.as_deref().unwrap_or("unknown"));
                    println!("As of:    {}", quote.fetched_at.format("%Y-%m-%d %H:%M:%S UTC"));
                }
                None => {
                    println!("No live price found for {} (tried: {}).", symbol, candidates.join(", "));
                }
            }
        }

        Commands::Trend { symbol } => {
            let feed = YahooClient::new(&config)?;
            let quote = lookup(&feed, &symbol_candidates(&symbol)).await;
            print_trend(&config, &symbol, quote.as_ref()).await?;
        }

        Commands::Config => {
            println!("\n=== Calculator Defaults ===\n");
            println!("  Symbol:              {}", config.default_symbol);
            println!("  Margin:              {}", config.default_margin);
            println!("  Leverage:            {}x", config.default_leverage);
            println!("  Take Profit Offset:  {}", format_offset(config.take_profit_offset));
            println!("  Stop Loss Offset:    {}", format_offset(config.stop_loss_offset));

            println!("\n=== Price Feed ===\n");
            println!("  API Base:            {}", config.price_api_base);
            println!("  Timeout:             {}s", config.http_timeout_secs);
            println!("  Retry Budget:        {}s", config.retry_budget_secs);

            println!("\n=== Trend Commentary ===\n");
            println!("  API Base:            {}", config.commentary_api_base);
            println!("  Model:               {}", config.commentary_model);
            println!(
                "  Enabled:             {}",
                if config.commentary_api_key.is_some() { "Yes" } else { "No (set COMMENTARY_API_KEY)" }
            );
        }
    }

    Ok(())
}

/// Resolve inputs, evaluate the position and print it.
async fn run_calc(args: CalcArgs, config: &AppConfig) -> Result<()> {
    let symbol = requested_symbol(&args, config);

    let quote = if let Some(price) = args.price {
        Some(Quote {
            symbol: symbol.clone(),
            price,
            currency: None,
            fetched_at: Utc::now(),
        })
    } else if args.offline {
        None
    } else {
        let feed = YahooClient::new(config)?;
        lookup(&feed, &symbol_candidates(&symbol)).await
    };

    let request = build_request(&args, quote.as_ref(), config)?;
    let result = calculate(&request);
    let live = request.live_price();

    if args.json {
        let output = CalcOutput {
            request: &request,
            quote: quote.as_ref(),
            result: &result,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        let currency = currency_symbol(
            quote.as_ref().and_then(|q| q.currency.as_deref()),
            &request.symbol,
        );
        println!(
            "{}",
            Dashboard {
                symbol: &request.symbol,
                side: request.side,
                currency,
                live_price: live,
                result: &result,
            }
        );
    }

    if args.trend {
        print_trend(config, &request.symbol, quote.as_ref()).await?;
    }

    Ok(())
}

/// Symbol from the command line or the configured default, normalised.
fn requested_symbol(args: &CalcArgs, config: &AppConfig) -> String {
    args.symbol
        .as_deref()
        .unwrap_or(&config.default_symbol)
        .trim()
        .to_uppercase()
}

/// Fill in defaults for everything the command line left out.
///
/// A missing or failed lookup reads as a live price of zero. Entry defaults
/// to the live price, sizing to the configured margin, and targets to the
/// configured offsets around the live price when there is one.
fn build_request(args: &CalcArgs, quote: Option<&Quote>, config: &AppConfig) -> Result<TradeRequest> {
    let symbol = requested_symbol(args, config);

    let live = quote.map(|q| q.price).unwrap_or(Decimal::ZERO);
    if live <= Decimal::ZERO {
        warn!(symbol = %symbol, "No live price; live P&L and ROE will read zero");
    }

    let sizing = match SizingMode::from_inputs(args.quantity, args.margin) {
        Ok(sizing) => sizing,
        Err(CalcError::MissingSizing) => SizingMode::ByMargin(config.default_margin),
        Err(e) => return Err(e.into()),
    };

    let mut request = TradeRequest::new(
        quote.map(|q| q.symbol.clone()).unwrap_or(symbol),
        args.side,
        args.entry.unwrap_or(live),
        sizing,
        args.leverage.unwrap_or(config.default_leverage),
    )
    .with_current_price(live);

    // Targets default to a fixed distance around the live price
    let has_live = live > Decimal::ZERO;
    let take_profit = args.tp.or_else(|| {
        has_live
            .then(|| default_target("take-profit", config.default_take_profit(live), live))
            .flatten()
    });
    let stop_loss = args.sl.or_else(|| {
        has_live
            .then(|| default_target("stop-loss", config.default_stop_loss(live), live))
            .flatten()
    });

    if let Some(tp) = take_profit {
        request = request.with_take_profit(tp);
    }
    if let Some(sl) = stop_loss {
        request = request.with_stop_loss(sl);
    }

    Ok(request)
}

fn default_target(kind: &str, target: Option<Decimal>, live: Decimal) -> Option<Decimal> {
    if target.is_none() {
        warn!(%live, "Default {} overflowed, leaving it unset", kind);
    }
    target
}

/// Evaluate the request if it passes the gating predicate.
fn calculate(request: &TradeRequest) -> PositionResult {
    if PositionCalculator::has_sufficient_input(request, false) {
        PositionCalculator::evaluate(request)
    } else {
        info!(symbol = %request.symbol, "Not enough input, skipping evaluation");
        PositionResult::insufficient()
    }
}

/// Print trend commentary. Provider failures are logged, never fatal.
async fn print_trend(config: &AppConfig, symbol: &str, quote: Option<&Quote>) -> Result<()> {
    let Some(client) = CommentaryClient::from_config(config)? else {
        println!("Trend commentary disabled: set COMMENTARY_API_KEY to enable it.");
        return Ok(());
    };

    let (name, price, currency) = match quote {
        Some(q) => (
            q.symbol.as_str(),
            q.price,
            currency_symbol(q.currency.as_deref(), &q.symbol),
        ),
        None => (symbol, Decimal::ZERO, currency_symbol(None, symbol)),
    };

    match client.commentary(name, price, &currency).await {
        Ok(text) => {
            println!("\n--- Trend ({}) ---", name);
            println!("{}", text);
        }
        Err(e) => {
            warn!(error = %e, symbol = %name, "Trend commentary unavailable");
        }
    }

    Ok(())
}

/// Install the global subscriber. `RUST_LOG`, when set, wins over `--log-level`.
fn init_logging(level: &str) -> Result<()> {
    let log_level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let builder = FmtSubscriber::builder()
        .with_target(false)
        .with_writer(std::io::stderr);

    if std::env::var_os("RUST_LOG").is_some() {
        let subscriber = builder.with_env_filter(EnvFilter::from_default_env()).finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = builder.with_max_level(log_level).finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}
