//! notifywatch - desktop notification delivery client
//!
//! CLI entry point for watching, probing and configuring.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{CommandFactory, FromArgMatches};
use colored::Colorize;
use eyre::{Context, Result, eyre};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use notifywatch::api::{HttpApiClient, NotificationApi};
use notifywatch::cli::{Cli, Command, ConfigCommand, default_config_path, generate_after_help};
use notifywatch::config::Config;
use notifywatch::delivery::{DeliveryConfig, DeliveryCoordinator, NotificationDisplay};
use notifywatch::domain::Notification;
use notifywatch::events::{MonitorEvent, create_event_bus};
use notifywatch::popup::{PopupPresenter, TerminalHost};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("notifywatch")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config log-level (or debug: true) > INFO
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("notifywatch.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(domain = %config.api.domain, push = config.push.enabled, "notifywatch loaded config");

    let command = cli.command.unwrap_or(Command::Watch {
        interval: None,
        push: false,
        no_push: false,
    });
    command.apply_overrides(&mut config);

    debug!(?command, "main: dispatching command");
    match command {
        Command::Watch { .. } => cmd_watch(config).await,
        Command::TestApi => cmd_test_api(&config).await,
        Command::TestNotification => cmd_test_notification(&config).await,
        Command::Config { command } => match command {
            ConfigCommand::Show => cmd_config_show(&config),
            ConfigCommand::Init { path, force } => cmd_config_init(path, force),
        },
    }
}

/// Watch until Ctrl-C
async fn cmd_watch(config: Config) -> Result<()> {
    debug!("cmd_watch: called");
    config.validate().context("Invalid configuration")?;

    let api = notifywatch::create_client(&config.api).context("Failed to create API client")?;
    let bus = create_event_bus();
    let presenter: Arc<dyn NotificationDisplay> =
        Arc::new(PopupPresenter::from_config(TerminalHost::stdout(), &config.popups, &bus));

    let printer = tokio::spawn(print_events(bus.subscribe()));

    let coordinator = DeliveryCoordinator::new(DeliveryConfig::from_config(&config), api, presenter, &bus);
    let handle = coordinator.handle();
    let task = tokio::spawn(coordinator.run());

    println!(
        "{} {} (poll every {}s, push {})",
        "Watching".green().bold(),
        config.api.endpoint(),
        config.polling.interval_secs,
        if config.push.enabled { config.push.url.as_str() } else { "disabled" }
    );
    handle.start().await?;

    tokio::signal::ctrl_c().await.context("Failed to listen for Ctrl-C")?;
    info!("Interrupt received, stopping");

    handle.stop().await?;
    let metrics = handle.metrics().await?;
    handle.shutdown().await?;
    task.await.context("Delivery coordinator task failed")?;
    printer.abort();

    println!(
        "\n{} delivered {}, acknowledged {}, ack failures {}, fetch failures {}",
        "Stopped:".yellow().bold(),
        metrics.delivered,
        metrics.acks_ok,
        metrics.acks_failed,
        metrics.fetch_failures
    );
    Ok(())
}

/// Print bus activity that the popups themselves don't show
async fn print_events(mut rx: broadcast::Receiver<MonitorEvent>) {
    loop {
        let event = match rx.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "Event printer lagged");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        let stamp = chrono::Local::now().format("%H:%M:%S").to_string();
        let line = match &event {
            MonitorEvent::PrimaryChannelChanged { channel } => format!("primary channel: {}", channel).yellow(),
            MonitorEvent::ChannelStatusChanged { status } => format!("push {}", status).yellow(),
            MonitorEvent::AcknowledgeFailed { id, message } => {
                format!("acknowledge failed for {}: {}", id, message).red()
            }
            MonitorEvent::FetchFailed { message, retryable: true } => {
                format!("fetch failed: {}", message).red()
            }
            MonitorEvent::FetchFailed { message, retryable: false } => {
                format!("fetch failed (check configuration): {}", message).red()
            }
            _ => continue,
        };
        println!("{} {}", stamp.dimmed(), line);
    }
}

/// Probe the notifications API
async fn cmd_test_api(config: &Config) -> Result<()> {
    debug!("cmd_test_api: called");
    let client = HttpApiClient::from_config(&config.api)?;

    match client.probe().await {
        Ok(elapsed) => {
            println!(
                "\u{2705} API reachable at {} ({} ms)",
                client.endpoint(),
                elapsed.as_millis()
            );
            Ok(())
        }
        Err(e) => {
            println!("\u{274C} API not reachable at {}: {}", client.endpoint(), e);
            Err(e.into())
        }
    }
}

/// Show one sample popup and wait for it to go away
async fn cmd_test_notification(config: &Config) -> Result<()> {
    debug!("cmd_test_notification: called");
    let bus = create_event_bus();
    let presenter = PopupPresenter::from_config(TerminalHost::stdout(), &config.popups, &bus);

    presenter.show(&Notification::sample()).await?;

    let deadline = tokio::time::Instant::now() + config.popups.duration() + Duration::from_secs(1);
    while !presenter.is_empty().await {
        if tokio::time::Instant::now() >= deadline {
            warn!("cmd_test_notification: popup still open at deadline");
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    Ok(())
}

fn cmd_config_show(config: &Config) -> Result<()> {
    debug!("cmd_config_show: called");
    print!("{}", serde_yaml::to_string(config)?);
    Ok(())
}

fn cmd_config_init(path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = path.unwrap_or_else(default_config_path);
    debug!(path = %path.display(), force, "cmd_config_init: called");
    if path.exists() && !force {
        return Err(eyre!("{} already exists (use --force to overwrite)", path.display()));
    }
    Config::default().save(&path)?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}
