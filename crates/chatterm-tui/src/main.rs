use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use chatterm_core::config::SERVER_URL_ENV;
use chatterm_core::{init_logging, ChatBackend, ChatClient, Config, Sender, Session};
use clap::{Parser, Subcommand};

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "chatterm", version)]
#[command(about = "Terminal chat client for a local chat service")]
struct Cli {
    /// Chat service base URL (overrides config and CHATTERM_SERVER_URL)
    #[arg(short, long)]
    server: Option<String>,
    /// Path to a config file instead of the default location
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Reset the service memory, send one message and print the reply
    Send {
        /// The message to send
        message: String,
    },
    /// Reset the service's conversation memory
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    }
    .with_overrides(std::env::var(SERVER_URL_ENV).ok(), cli.server);

    // Logging failures are not fatal
    let _log_guard = match init_logging(&config.resolved_log_dir(), &config.log_level) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("warning: logging disabled: {}", e);
            None
        }
    };
    tracing::info!(
        server = %config.server_url,
        "chatterm v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let client = ChatClient::new(&config.server_url);

    match cli.command {
        None => run_tui(client, &config).await,
        Some(Commands::Send { message }) => send_once(client, &message).await,
        Some(Commands::Reset) => reset(client).await,
    }
}

async fn run_tui(client: ChatClient, config: &Config) -> Result<()> {
    let session = Session::new(Arc::new(client));
    // Not awaited: the first frame must not wait on the service
    let _reset_task = session.initialize();

    let mut app = App::new(session, config);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn run_loop(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    let sender = events.sender();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event, &sender),
            None => break,
        }
    }

    tracing::info!(
        turns = app.message_count(Sender::User),
        messages = app.session.log().len(),
        "chatterm exiting"
    );
    Ok(())
}

async fn send_once(client: ChatClient, message: &str) -> Result<()> {
    let mut session = Session::new(Arc::new(client));
    session.initialize().await?;

    if session.submit(message).await.is_none() {
        bail!("message is empty");
    }

    if let Some(reply) = session.log().last() {
        println!("{}", reply.text);
    }
    Ok(())
}

async fn reset(client: ChatClient) -> Result<()> {
    client.reset().await?;
    println!("Chat service memory reset.");
    Ok(())
}
