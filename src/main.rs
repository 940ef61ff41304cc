use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use conjure::app;
use conjure::completion::{CommandCompleter, CompletionClient};
use conjure::config::Config;
use conjure::context::gather_context;
use conjure::event::EventHandler;
use conjure::output::emit_command;
use conjure::session::Session;
use conjure::ui::{RawModeGuard, TerminalUi};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs share stderr with the prompt, so stay quiet unless asked
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error")))
        .with_writer(io::stderr)
        .init();

    let matches = Command::new("conjure")
        .about("Describe what you want, get a shell command back")
        .long_about(
            "conjure asks a chat-completion endpoint for a single shell command matching \
             your request and the current shell context. Accepted commands are printed to \
             stdout, or written to OUTPUT when given (for shell widgets).",
        )
        .arg(Arg::new("output")
            .help("File to write the accepted command to instead of stdout")
            .value_name("OUTPUT")
            .value_parser(clap::value_parser!(PathBuf)))
        .arg(Arg::new("set-api-key")
            .long("set-api-key")
            .help("Store the completion endpoint API key in the config file")
            .value_name("API_KEY")
            .num_args(1))
        .arg(Arg::new("set-endpoint")
            .long("set-endpoint")
            .help("Store the chat-completion endpoint URL in the config file")
            .value_name("URL")
            .num_args(1))
        .arg(Arg::new("config")
            .long("config")
            .help("Show configuration information")
            .action(ArgAction::SetTrue))
        .get_matches();

    // Handle configuration commands
    let mut configured = false;
    if let Some(api_key) = matches.get_one::<String>("set-api-key") {
        Config::set_api_key(api_key.clone())?;
        println!("✅ API key saved successfully");
        configured = true;
    }
    if let Some(endpoint) = matches.get_one::<String>("set-endpoint") {
        Config::set_endpoint(endpoint.clone())?;
        println!("✅ Endpoint saved successfully");
        configured = true;
    }
    if matches.get_flag("config") {
        Config::show_config_info()?;
        configured = true;
    }
    if configured {
        return Ok(());
    }

    let target = matches.get_one::<PathBuf>("output").cloned();
    let config = Config::load()?;
    let session = Session::new(gather_context());
    let completer: Arc<dyn CommandCompleter> = Arc::new(CompletionClient::new(&config));

    let Some(command) = run_interactive(session, completer).await? else {
        info!("No command accepted");
        return Ok(());
    };

    emit_command(&command, target.as_deref(), &mut io::stdout().lock())
}

/// Runs the session on the terminal and returns the accepted command.
async fn run_interactive(session: Session, completer: Arc<dyn CommandCompleter>) -> Result<Option<String>> {
    let mut events = EventHandler::new();
    let raw_mode = RawModeGuard::enable()?;
    events.spawn_terminal_reader();

    let mut ui = TerminalUi::new(io::stderr());
    let result = app::run(session, completer, &mut events, &mut ui).await;
    ui.clear()?;
    drop(raw_mode);

    Ok(result?.into_accepted_command())
}
