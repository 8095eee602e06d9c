use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use relaybot_core::config;
use relaybot_core::http::{self, AppState};
use relaybot_core::store::file::FileKvStore;
use relaybot_core::telegram::TelegramClient;

#[derive(Parser)]
#[command(
    name = "relaybot",
    about = "Telegram to LLM chat relay",
    version = relaybot_core::VERSION,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the webhook server
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,
        /// Listen port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Manage the Telegram webhook registration
    Webhook {
        #[command(subcommand)]
        command: WebhookCommands,
    },
    /// Show the effective configuration
    Config,
}

#[derive(Subcommand)]
enum WebhookCommands {
    /// Register the webhook with Telegram
    Set {
        /// Public domain Telegram should call back
        #[arg(long)]
        domain: Option<String>,
    },
    /// Remove the webhook registration
    Delete,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("relaybot=info".parse().unwrap())
                .add_directive("relaybot_core=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { host, port } => cmd_serve(host, port).await?,
        Commands::Webhook { command } => match command {
            WebhookCommands::Set { domain } => cmd_webhook_set(domain).await?,
            WebhookCommands::Delete => cmd_webhook_delete().await?,
        },
        Commands::Config => cmd_config()?,
    }

    Ok(())
}

// ====== Commands ======

async fn cmd_serve(host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut cfg = config::load_from_env();
    if let Some(host) = host {
        cfg.server.host = host;
    }
    if let Some(port) = port {
        cfg.server.port = port;
    }

    if cfg.telegram.token.is_empty() {
        eprintln!("Error: TELEGRAM_BOT_TOKEN is not set.");
        std::process::exit(1);
    }
    if cfg.openai.api_key.is_empty() {
        eprintln!("Warning: OPENAI_API_KEY is not set; completions will fail.");
    }

    let store = Arc::new(FileKvStore::new(config::get_data_dir().join("store")));
    let addr = format!("{}:{}", cfg.server.host, cfg.server.port);
    let state = Arc::new(AppState::new(cfg, store));

    println!("Starting relaybot on {}...", addr);
    http::serve(&addr, state).await
}

async fn cmd_webhook_set(domain: Option<String>) -> Result<()> {
    let cfg = config::load_from_env();
    if cfg.telegram.token.is_empty() {
        eprintln!("Error: TELEGRAM_BOT_TOKEN is not set.");
        std::process::exit(1);
    }

    let domain = domain.unwrap_or_else(|| cfg.telegram.webhook_domain.clone());
    if domain.is_empty() {
        eprintln!("Error: no webhook domain. Pass --domain or set TELEGRAM_WEBHOOK_DOMAIN.");
        std::process::exit(1);
    }

    let webhook_url = format!("https://{}/telegram/{}/webhook", domain, cfg.telegram.token);
    let client = TelegramClient::new(cfg.telegram.token.clone());
    client.set_webhook(&webhook_url).await?;
    println!("✓ Webhook registered for {}", domain);

    Ok(())
}

async fn cmd_webhook_delete() -> Result<()> {
    let cfg = config::load_from_env();
    if cfg.telegram.token.is_empty() {
        eprintln!("Error: TELEGRAM_BOT_TOKEN is not set.");
        std::process::exit(1);
    }

    let client = TelegramClient::new(cfg.telegram.token);
    client.delete_webhook().await?;
    println!("✓ Webhook removed");

    Ok(())
}

fn cmd_config() -> Result<()> {
    let cfg = config::load_from_env();

    println!("relaybot Configuration\n");
    println!(
        "Telegram token: {}",
        if cfg.telegram.token.is_empty() {
            "not set"
        } else {
            "✓"
        }
    );
    println!(
        "Webhook domain: {}",
        if cfg.telegram.webhook_domain.is_empty() {
            "not set"
        } else {
            &cfg.telegram.webhook_domain
        }
    );
    println!(
        "OpenAI API key: {}",
        if cfg.openai.api_key.is_empty() {
            "not set"
        } else {
            "✓"
        }
    );
    println!(
        "API base: {}",
        cfg.openai.api_base.as_deref().unwrap_or("default")
    );
    println!("Model: {}", cfg.openai.model);
    if cfg.access.open_access {
        println!("Access: open to everyone");
    } else if cfg.access.allow_from.is_empty() {
        println!("Access: nobody (allowlist is empty)");
    } else {
        println!("Access: {} allowed chat(s)", cfg.access.allow_from.len());
    }
    println!("Data dir: {}", config::get_data_dir().display());

    Ok(())
}
