use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use parley::voice::avatar;
use parley::{ApiServer, ApiState, ChatApp, Config, GeminiModel, TerminalView};

/// Parley - voice conversation practice with an AI partner
#[derive(Parser)]
#[command(name = "parley", version, about)]
struct Cli {
    /// Backend base URL for the chat client
    #[arg(long, env = "PARLEY_BACKEND_URL")]
    backend_url: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable speech recognition and synthesis
    #[arg(long, env = "PARLEY_DISABLE_VOICE")]
    disable_voice: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Chat with the AI partner in the terminal (default)
    Chat,
    /// Run the conversation backend
    Serve {
        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
    },
    /// Write the avatar SVG
    Avatar {
        /// Render the open-mouth speaking frame
        #[arg(long)]
        speaking: bool,
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn,parley=info",
        1 => "info,parley=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load_with_options(cli.disable_voice);
    if let Some(url) = cli.backend_url {
        config.client.backend_url = url;
    }
    tracing::debug!(?config, "loaded configuration");

    match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => chat(&config).await,
        Command::Serve { port } => serve(&config, port).await,
        Command::Avatar { speaking, output } => write_avatar(speaking, output),
    }
}

/// Run the interactive terminal client
async fn chat(config: &Config) -> anyhow::Result<()> {
    tracing::info!(backend = %config.client.backend_url, "starting chat");

    let mut app = ChatApp::from_config(config, Arc::new(TerminalView::new()))?;

    println!("Parley - practise your English. Type /help for commands.");

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    app.run(stdin).await?;

    Ok(())
}

/// Run the conversation backend
async fn serve(config: &Config, port: Option<u16>) -> anyhow::Result<()> {
    let api_key = config
        .api_keys
        .gemini
        .clone()
        .ok_or_else(|| anyhow::anyhow!("GEMINI_API_KEY is required to run the backend"))?;

    let model = GeminiModel::new(api_key, &config.server.model_url, config.server.model.clone())?;
    let port = port.unwrap_or(config.server.port);

    tracing::info!(port, model = %config.server.model, "starting backend");

    ApiServer::new(ApiState::new(Arc::new(model)), port)
        .static_dir(config.server.static_dir.clone())
        .run()
        .await?;

    Ok(())
}

/// Write the avatar markup
fn write_avatar(speaking: bool, output: Option<PathBuf>) -> anyhow::Result<()> {
    let mouth = if speaking {
        avatar::MOUTH_FRAMES[1]
    } else {
        avatar::MOUTH_FRAMES[0]
    };
    let svg = avatar::render_svg(mouth, speaking);

    match output {
        Some(path) => {
            std::fs::write(&path, svg)?;
            println!("Avatar written to {}", path.display());
        }
        None => print!("{svg}"),
    }

    Ok(())
}
