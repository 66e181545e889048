//! FunPay Steam wallet top-up bot entry point.

use std::net::SocketAddr;
use std::time::Duration;

use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use funpay_steam_bot::api::{create_router, AppState};
use funpay_steam_bot::config::Config;
use funpay_steam_bot::funpay::{Event, FunpayClient};
use funpay_steam_bot::metrics;
use funpay_steam_bot::orders::{handle_new_message, handle_new_order, SessionStore, TopupExecutor};
use funpay_steam_bot::steam::TopupClient;
use funpay_steam_bot::utils::shutdown_signal;

/// FunPay Steam wallet top-up bot.
#[derive(Parser, Debug)]
#[command(name = "funpay-steam-bot")]
#[command(about = "Automated Steam wallet top-up seller for the FunPay marketplace")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// Run in dry-run mode (no real top-ups).
    #[arg(long)]
    dry_run: Option<bool>,

    /// HTTP server port for health/status.
    #[arg(short, long, default_value = "8080")]
    port: u16,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the main bot loop (default).
    Run {
        /// Run in dry-run mode (no real top-ups).
        #[arg(long)]
        dry_run: Option<bool>,

        /// HTTP server port for health/status.
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Check configuration validity.
    CheckConfig,

    /// Check top-up service balance and connection.
    CheckBalance,

    /// Check whether a Steam login can be topped up.
    CheckLogin {
        /// The Steam login to check.
        login: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("funpay_steam_bot=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    // Initialize metrics
    metrics::init_metrics();

    // Handle subcommands
    match args.command {
        Some(Command::CheckConfig) => cmd_check_config().await,
        Some(Command::CheckBalance) => cmd_check_balance().await,
        Some(Command::CheckLogin { login }) => cmd_check_login(&login).await,
        Some(Command::Run { dry_run, port }) => cmd_run(dry_run, port).await,
        None => cmd_run(args.dry_run, args.port).await,
    }
}

/// Check configuration validity.
async fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("FUNPAY STEAM BOT - CONFIGURATION CHECK");
    println!("======================================================================");

    // Load configuration
    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    // Validate configuration
    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    // Show configuration summary
    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Marketplace API: {}", config.funpay_api_url);
    println!("  Top-Up API: {}", config.steam_api_url);
    println!("  Category: {}", config.category_id);
    println!("  Min Balance: ${}", config.min_balance);
    println!("  Auto Refund: {}", config.auto_refund);
    println!("  Auto Deactivate: {}", config.auto_deactivate);
    println!("  Poll Interval: {}s", config.poll_interval_secs);
    println!("  Dry Run: {}", config.dry_run);
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Check top-up service balance and connection.
async fn cmd_check_balance() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("FUNPAY STEAM BOT - BALANCE CHECK");
    println!("======================================================================");

    let config = Config::load()?;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    println!("Host: {}", config.steam_api_url);
    println!("Credentials: present");
    println!("======================================================================");

    print!("\n1. Creating client... ");
    let steam = TopupClient::new(&config);
    println!("OK");

    print!("\n2. Authenticating... ");
    match steam.authenticate().await {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("   Error: {}", e);
            return Err(anyhow::anyhow!("Authentication failed"));
        }
    }

    print!("\n3. Getting service balance... ");
    match steam.check_balance().await {
        Ok(balance) => {
            println!("OK");
            println!("   Balance: ${}", balance);
            if balance < config.min_balance {
                println!(
                    "   WARNING: balance below MIN_BALANCE (${}) - listings would deactivate",
                    config.min_balance
                );
            }
        }
        Err(e) => {
            println!("FAILED");
            println!("   Error: {}", e);
        }
    }

    println!("\n======================================================================");
    println!("BALANCE CHECK COMPLETED");
    println!("======================================================================");

    Ok(())
}

/// Check whether a Steam login can be topped up.
async fn cmd_check_login(login: &str) -> anyhow::Result<()> {
    println!("======================================================================");
    println!("FUNPAY STEAM BOT - LOGIN CHECK");
    println!("======================================================================");

    let config = Config::load()?;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    let steam = TopupClient::new(&config);
    steam.authenticate().await?;

    print!("Checking login '{}'... ", login);
    match steam.check_login(login).await {
        Ok(true) => println!("ELIGIBLE"),
        Ok(false) => println!("NOT FOUND"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
        }
    }

    println!("======================================================================");
    Ok(())
}

/// Run the main bot loop.
async fn cmd_run(dry_run_override: Option<bool>, port: u16) -> anyhow::Result<()> {
    // Load configuration
    info!("Loading configuration...");
    let mut config = Config::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    // Override with CLI args if provided
    if let Some(dry_run) = dry_run_override {
        config.dry_run = dry_run;
    }

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }

    info!("Configuration loaded successfully");
    info!("Mode: {}", if config.dry_run { "SIMULATION" } else { "LIVE" });
    info!("Category: {}", config.category_id);
    info!("Min balance: ${}", config.min_balance);
    info!(
        "Auto refund: {} / Auto deactivate: {}",
        config.auto_refund, config.auto_deactivate
    );

    // Start the Prometheus exporter
    if config.metrics_enabled {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.metrics_port));
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()?;
        info!("Prometheus exporter listening on {}", addr);
    }

    // Create app state
    let app_state = AppState::new();

    // Start HTTP server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    let router = create_router(app_state.clone());

    // Spawn HTTP server
    let _server_handle = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    });

    // Create clients
    let funpay = FunpayClient::new(&config);
    let steam = TopupClient::new(&config);

    info!("Authenticating with top-up service...");
    steam.authenticate().await?;

    match steam.check_balance().await {
        Ok(balance) => {
            info!("Service balance: ${}", balance);
            *app_state.service_balance.write().await = Some(balance);
            if balance < config.min_balance {
                warn!(
                    "Balance already below MIN_BALANCE (${}) - new orders will fail fast",
                    config.min_balance
                );
            }
        }
        Err(e) => {
            warn!("Initial balance check failed: {}", e);
        }
    }

    let sessions = SessionStore::new();
    let mut executor = TopupExecutor::new(&config);
    let mut cursor: Option<String> = None;

    info!("========================================");
    info!("FUNPAY STEAM BOT STARTED");
    info!("========================================");
    info!("Polling every {}s", config.poll_interval_secs);
    info!("Mode: {}", if config.dry_run { "SIMULATION" } else { "LIVE" });
    info!("========================================");

    // Main bot loop
    loop {
        metrics::inc_polls();

        let events = match funpay.poll_events(cursor.as_deref()).await {
            Ok((events, next_cursor)) => {
                app_state.set_ready(true);
                if next_cursor.is_some() {
                    cursor = next_cursor;
                }
                events
            }
            Err(e) => {
                warn!("Marketplace poll failed: {}", e);
                app_state.set_ready(false);
                tokio::time::sleep(Duration::from_secs(config.poll_interval_secs)).await;
                continue;
            }
        };

        for event in events {
            let result = match event {
                Event::NewOrder { order_id } => match funpay.get_order(&order_id).await {
                    Ok(order) => {
                        handle_new_order(&funpay, &steam, &sessions, &order, &config).await
                    }
                    Err(e) => {
                        warn!(order_id = %order_id, "Failed to fetch order: {}", e);
                        Ok(())
                    }
                },
                Event::NewMessage { message } => {
                    handle_new_message(&funpay, &steam, &sessions, &mut executor, &message, &config)
                        .await
                }
            };

            // Per-event errors are logged, never fatal to the loop
            if let Err(e) = result {
                error!("Event handling failed: {}", e);
            }
        }

        // Publish stats for the status endpoint
        *app_state.stats.write().await = executor.stats();

        tokio::time::sleep(Duration::from_secs(config.poll_interval_secs)).await;
    }
}
