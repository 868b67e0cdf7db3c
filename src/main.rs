//! # P2P Escrow CLI
//!
//! Command-line client for escrow-mediated P2P trades.
//!
//! ```text
//! p2p-escrow offers --symbol AAPL
//! p2p-escrow initiate <offer-id> --quantity 10 --payment-method "Cash Balance" --watch
//! p2p-escrow watch <trade-id>
//! p2p-escrow cancel <trade-id>
//! ```
//!
//! `--offline` runs every command against an in-process escrow server
//! seeded with demo offers.

use anyhow::{Context, anyhow, bail};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use p2p_escrow::application::dto::{OfferFilter, OfferSort};
use p2p_escrow::application::ports::{
    AutoConfirm, Confirmer, EscrowApi, NotificationSink, OfferCatalog, ProfileApi, SystemClock,
};
use p2p_escrow::application::services::{Notice, NoticeLevel};
use p2p_escrow::application::use_cases::{INITIATE_FAILED, ReviewState, TradeDisplay, TradeView};
use p2p_escrow::application::{AppContext, ApplicationError};
use p2p_escrow::config::{AppConfig, LogConfig, LogFormat};
use p2p_escrow::domain::entities::{Offer, SwapTerms, Trader, UserProfile};
use p2p_escrow::domain::value_objects::{
    OfferId, OfferType, PaymentMethod, StockSymbol, TradeId, UserId,
};
use p2p_escrow::infrastructure::{
    EmailJsSink, HttpClient, InMemoryEscrow, LoggingSink, RestEscrowApi,
};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "p2p-escrow")]
#[command(version, about = "P2P escrow trading client")]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, env = "P2P_ESCROW_CONFIG_FILE")]
    config: Option<String>,

    /// Run against an in-process escrow server with demo offers.
    #[arg(long)]
    offline: bool,

    /// Answer yes to confirmation prompts.
    #[arg(short, long)]
    yes: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List offers.
    Offers {
        #[arg(short, long, default_value = "1")]
        page: u32,
        #[arg(short, long, default_value = "20")]
        limit: u32,
        #[arg(short, long)]
        symbol: Option<String>,
        /// BUY, SELL or SWAP.
        #[arg(short = 't', long = "type")]
        offer_type: Option<String>,
        /// rating, totalTrades, price or createdAt.
        #[arg(long, default_value = "rating")]
        sort: String,
        #[arg(long)]
        swap_stock: Option<String>,
    },
    /// Show one offer.
    Offer { id: String },
    /// Start a trade from an offer.
    Initiate {
        offer_id: String,
        #[arg(short, long)]
        quantity: String,
        #[arg(short = 'm', long)]
        payment_method: Option<String>,
        /// Crypto network to pay on.
        #[arg(long)]
        network: Option<String>,
        /// Confirm the crypto transfer was sent.
        #[arg(long)]
        acknowledge: bool,
        /// Keep watching the new trade.
        #[arg(short, long)]
        watch: bool,
    },
    /// Follow a trade until it settles, cancels or expires.
    Watch { trade_id: String },
    /// Fund escrow for a trade.
    ConfirmPayment { trade_id: String },
    /// Report an off-platform payment as sent.
    MarkSent { trade_id: String },
    /// Cancel a trade.
    Cancel { trade_id: String },
    /// Complete a trade without the review prompt.
    Complete { trade_id: String },
    /// Review and complete a trade.
    Review { trade_id: String },
    /// Show the profile balance.
    Balance,
}

// ============================================================================
// Prompt
// ============================================================================

/// Asks on the terminal.
#[derive(Debug, Clone, Copy)]
struct TerminalConfirm;

#[async_trait]
impl Confirmer for TerminalConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        let prompt = prompt.to_string();
        tokio::task::spawn_blocking(move || {
            print!("{prompt} [y/N] ");
            let _ = std::io::stdout().flush();
            let mut answer = String::new();
            std::io::stdin().read_line(&mut answer).is_ok()
                && matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
        })
        .await
        .unwrap_or(false)
    }
}

// ============================================================================
// Wiring
// ============================================================================

fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&log.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match log.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_with(path, |key| std::env::var(key).ok()),
        None => AppConfig::load(),
    }
    .context("loading configuration")?;
    if cli.offline {
        // Offline mode never talks to the network.
        config.notifications.enabled = false;
    }
    config.validate()?;
    Ok(config)
}

async fn seed_offline(server: &InMemoryEscrow) -> anyhow::Result<()> {
    let offers = [
        Offer::builder(
            OfferId::new("demo-sell-aapl"),
            OfferType::Sell,
            StockSymbol::new("AAPL")?,
            "1".parse()?,
            "50".parse()?,
            "185.40".parse()?,
        )
        .stock_name("Apple Inc.")
        .payment_methods([PaymentMethod::CashBalance, PaymentMethod::Crypto])
        .trader(Trader::named("harbor_trades"))
        .build()?,
        Offer::builder(
            OfferId::new("demo-buy-tsla"),
            OfferType::Buy,
            StockSymbol::new("TSLA")?,
            "5".parse()?,
            "100".parse()?,
            "242.10".parse()?,
        )
        .stock_name("Tesla, Inc.")
        .trader(Trader::named("northwind"))
        .build()?,
        Offer::builder(
            OfferId::new("demo-swap-msft"),
            OfferType::Swap,
            StockSymbol::new("MSFT")?,
            "1".parse()?,
            "20".parse()?,
            "415.00".parse()?,
        )
        .swap(SwapTerms {
            stock_symbol: StockSymbol::new("NVDA")?,
            stock_name: Some("NVIDIA Corporation".to_string()),
            ratio: None,
        })
        .trader(Trader::named("pairwise"))
        .build()?,
    ];
    for offer in offers {
        server.add_offer(offer).await;
    }
    server
        .set_profile(UserProfile {
            id: Some(UserId::new("demo-user")),
            first_name: "Demo".to_string(),
            last_name: "Trader".to_string(),
            email: "demo@localhost".to_string(),
            balance: "25000".parse()?,
        })
        .await;
    server.set_counterparty("counterparty@localhost", "Casey").await;
    Ok(())
}

async fn build_context(cli: &Cli, config: &AppConfig) -> anyhow::Result<AppContext> {
    let (escrow, catalog, profiles): (
        Arc<dyn EscrowApi>,
        Arc<dyn OfferCatalog>,
        Arc<dyn ProfileApi>,
    ) = if cli.offline {
        let server = InMemoryEscrow::new(Arc::new(SystemClock));
        seed_offline(&server).await?;
        let server = Arc::new(server);
        (server.clone(), server.clone(), server)
    } else {
        let api = Arc::new(RestEscrowApi::new(HttpClient::new(
            config.api.http_client_config(),
        )?));
        (api.clone(), api.clone(), api)
    };

    let notifications: Arc<dyn NotificationSink> = if !config.notifications.enabled {
        Arc::new(LoggingSink)
    } else if !config.notifications.is_configured() {
        warn!("EmailJS credentials missing, notifications are only logged");
        Arc::new(LoggingSink)
    } else {
        Arc::new(EmailJsSink::new(
            config.notifications.emailjs(config.api.request_timeout_ms),
        )?)
    };
    let confirmer: Arc<dyn Confirmer> = if cli.yes {
        Arc::new(AutoConfirm)
    } else {
        Arc::new(TerminalConfirm)
    };

    Ok(AppContext::builder()
        .escrow(escrow)
        .catalog(catalog)
        .profiles(profiles)
        .notifications(notifications)
        .confirmer(confirmer)
        .clock(Arc::new(SystemClock))
        .timings(config.trade.timings())
        .admin_recipient(config.notifications.admin())
        .build()?)
}

// ============================================================================
// Output
// ============================================================================

fn print_notice(notice: &Notice) {
    let tag = match notice.level {
        NoticeLevel::Info => "info",
        NoticeLevel::Success => "ok",
        NoticeLevel::Error => "error",
    };
    println!("[{tag}] {notice}");
}

fn print_offer(offer: &Offer) {
    println!(
        "{:<24} {:<5} {:<6} {}..{} shares @ ${}  by {}",
        offer.id(),
        offer.offer_type(),
        offer.stock_symbol(),
        offer.min_quantity(),
        offer.max_quantity(),
        offer.price_per_share(),
        offer.trader().username
    );
    if let Some(swap) = offer.swap() {
        println!("{:<24} swaps for {}", "", swap.stock_symbol);
    }
    if !offer.payment_methods().is_empty() {
        let methods: Vec<&str> = offer.payment_methods().iter().map(PaymentMethod::label).collect();
        println!("{:<24} pays with {}", "", methods.join(", "));
    }
}

fn print_review(state: &ReviewState) {
    match state {
        ReviewState::Completed(trade) => println!("completed {}", trade.id()),
        ReviewState::Reviewing(trade) => println!("left open {}", trade.id()),
        ReviewState::Error(message) => println!("[error] {message}"),
    }
}

async fn print_display(view: &TradeView) {
    match view.display().await {
        Some(TradeDisplay::Active { status, countdown }) => {
            println!("{} {status}  time left {countdown}", view.trade_id());
        }
        Some(TradeDisplay::Expired) => println!("{} EXPIRED", view.trade_id()),
        Some(TradeDisplay::Terminal(status)) => println!("{} {status}", view.trade_id()),
        None => {}
    }
}

// ============================================================================
// Commands
// ============================================================================

fn offer_filter(
    page: u32,
    limit: u32,
    symbol: Option<String>,
    offer_type: Option<String>,
    sort: &str,
    swap_stock: Option<String>,
) -> anyhow::Result<OfferFilter> {
    Ok(OfferFilter {
        page,
        limit,
        sort_by: sort.parse::<OfferSort>().map_err(|e| anyhow!("{e}"))?,
        stock_symbol: symbol.map(|s| s.parse::<StockSymbol>()).transpose()?,
        offer_type: offer_type
            .map(|t| t.parse::<OfferType>().map_err(|e| anyhow!("{e}")))
            .transpose()?,
        swap_stock: swap_stock.map(|s| s.parse::<StockSymbol>()).transpose()?,
        ..OfferFilter::default()
    })
}

async fn watch(ctx: &AppContext, trade_id: TradeId) -> anyhow::Result<()> {
    let mut view = ctx.open_trade_view(trade_id).await?;
    print_display(&view).await;
    if !view.is_live() {
        if let Some(redirect) = view.next_redirect().await {
            println!("-> {}", redirect.route);
        }
        return Ok(());
    }

    let mut ticker = tokio::time::interval(ctx.timings().countdown_tick.max(Duration::from_secs(1)));
    loop {
        tokio::select! {
            redirect = view.next_redirect() => {
                print_display(&view).await;
                if let Some(redirect) = redirect {
                    println!("-> {} ({:?})", redirect.route, redirect.reason);
                }
                break;
            }
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        }
        while let Some(notice) = view.try_next_notice() {
            print_notice(&notice);
        }
        print_display(&view).await;
    }
    view.close();
    Ok(())
}

async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    let ctx = build_context(&cli, &config).await?;

    match cli.command {
        Commands::Offers {
            page,
            limit,
            symbol,
            offer_type,
            sort,
            swap_stock,
        } => {
            let filter = offer_filter(page, limit, symbol, offer_type, &sort, swap_stock)?;
            let listing = ctx.list_offers(&filter).await?;
            for offer in &listing.offers {
                print_offer(offer);
            }
            println!("page {} of {}", listing.page, listing.total_pages);
        }
        Commands::Offer { id } => {
            print_offer(&ctx.offer(&OfferId::new(id)).await?);
        }
        Commands::Initiate {
            offer_id,
            quantity,
            payment_method,
            network,
            acknowledge,
            watch: follow,
        } => {
            let mut form = ctx.negotiate(&OfferId::new(offer_id)).await?;
            form.set_quantity_input(&quantity);
            if let Some(method) = payment_method {
                if let Some(disclosure) = form.select_payment_method(PaymentMethod::from(method))? {
                    for wallet in disclosure.wallets {
                        println!("{:<10} {}", wallet.network, wallet.address);
                    }
                }
            }
            if let Some(network) = network {
                form.select_crypto_network(&network)?;
            }
            if acknowledge {
                form.acknowledge_crypto_payment();
            }
            let outcome = match ctx.initiate(&form).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    ctx.side_effects().settled().await;
                    bail!(err.user_message(INITIATE_FAILED));
                }
            };
            print_notice(&outcome.notice);
            println!("trade {}", outcome.trade_id);
            if follow {
                tokio::time::sleep(outcome.redirect_after).await;
                watch(&ctx, outcome.trade_id).await?;
            }
        }
        Commands::Watch { trade_id } => watch(&ctx, TradeId::new(trade_id)).await?,
        Commands::ConfirmPayment { trade_id } => {
            let view = ctx.open_trade_view(TradeId::new(trade_id)).await?;
            print_notice(&view.confirm_payment().await);
            print_display(&view).await;
        }
        Commands::MarkSent { trade_id } => {
            let view = ctx.open_trade_view(TradeId::new(trade_id)).await?;
            print_notice(&view.mark_payment_sent().await);
            print_display(&view).await;
        }
        Commands::Cancel { trade_id } => {
            let view = ctx.open_trade_view(TradeId::new(trade_id)).await?;
            match view.cancel().await {
                Some(notice) => print_notice(&notice),
                None => println!("cancel aborted"),
            }
            print_display(&view).await;
        }
        Commands::Complete { trade_id } => {
            let mut review = ctx.open_review(TradeId::new(trade_id)).await?;
            print_review(review.confirm_completion().await);
        }
        Commands::Review { trade_id } => {
            let mut review = ctx.open_review(TradeId::new(trade_id)).await?;
            if let ReviewState::Reviewing(trade) = review.state() {
                println!("{trade}");
                let confirmed = cli.yes || TerminalConfirm.confirm("Complete this trade?").await;
                if confirmed {
                    review.confirm_completion().await;
                }
            }
            print_review(review.state());
        }
        Commands::Balance => {
            let user = ctx.refresh_balance().await?;
            println!("{} balance ${}", user.display_name(), user.balance.to_fixed2());
        }
    }

    // Emails are fire-and-forget but should not be cut off by exit.
    ctx.side_effects().settled().await;
    ctx.logout().await;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_tracing(&config.log);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        offline = cli.offline,
        "p2p-escrow starting"
    );

    if let Err(err) = run(cli, config).await {
        match err.downcast_ref::<ApplicationError>() {
            Some(app) => warn!(error = %app, "command failed"),
            None => warn!(error = %err, "command failed"),
        }
        return Err(err);
    }
    Ok(())
}
