use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use printfarm_gateway::api::{ApiServer, ApiState};
use printfarm_gateway::dispatch::{HttpTransport, Upload};
use printfarm_gateway::{Action, ActionKind, Config, Dispatcher, StateBroadcaster, StateStore};

/// Printfarm - control plane for a farm of networked 3D printers
#[derive(Parser)]
#[command(name = "printfarm", version, about)]
struct Cli {
    /// Config file (defaults to ~/.config/printfarm/config.toml)
    #[arg(short, long, env = "PRINTFARM_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides the config file)
    #[arg(long)]
    port: Option<u16>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// List configured printers
    Printers,
    /// Dispatch one command and print the outcomes as JSON
    Send {
        /// Action: print, pause, resume, cancel, load, load-file, preheat, shutdown, finish
        action: ActionKind,
        /// Comma-separated printer ids
        #[arg(short, long)]
        printers: String,
        /// File to upload (load) or stored file name (load-file)
        #[arg(short, long)]
        file: Option<String>,
        /// Tool target temperature (preheat)
        #[arg(long)]
        tool: Option<u16>,
        /// Bed target temperature (preheat)
        #[arg(long)]
        bed: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,printfarm_gateway=info",
        1 => "info,printfarm_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
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
    let config = Config::load(cli.config.as_deref())?;
    tracing::debug!(
        printers = config.printers.len(),
        state_file = %config.paths.state_file.display(),
        timeout = ?config.dispatch.request_timeout,
        "loaded configuration"
    );

    let store = Arc::new(StateStore::new(
        &config.paths.state_file,
        &config.paths.active_file,
    ));
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::new(HttpTransport::new()),
        Arc::clone(&store),
        config.dispatch.clone(),
    ));

    match cli.command {
        Some(Command::Printers) => {
            for printer in &config.printers {
                println!("{}\t{}:{}", printer.id, printer.address, printer.port);
            }
            Ok(())
        }
        Some(Command::Send {
            action,
            printers,
            file,
            tool,
            bed,
        }) => {
            let action = build_action(action, file, tool, bed).await?;
            let devices = config.farm().select(&printers)?;
            let outcomes = dispatcher.dispatch(&action, &devices).await?;
            println!("{}", serde_json::to_string_pretty(&outcomes)?);
            Ok(())
        }
        None => serve(config, cli.port, store, dispatcher).await,
    }
}

/// Run the API server and the state broadcaster until the server stops
async fn serve(
    config: Config,
    port: Option<u16>,
    store: Arc<StateStore>,
    dispatcher: Arc<Dispatcher>,
) -> anyhow::Result<()> {
    let port = port.unwrap_or(config.server.port);
    tracing::info!(port, printers = config.printers.len(), "starting farm gateway");

    let broadcaster = StateBroadcaster::new(store, config.broadcast_interval);
    let state_updates = broadcaster.subscribe();
    let broadcast_task = broadcaster.spawn();

    let state = Arc::new(ApiState {
        farm: config.farm(),
        dispatcher,
        api_key: config.server.api_key.clone(),
        upload_dir: config.paths.upload_dir.clone(),
        shutdown_script: config.paths.shutdown_script.clone(),
        state_updates,
    });

    let result = ApiServer::new(state, port).run().await;
    broadcast_task.abort();
    result?;
    Ok(())
}

/// Assemble an action from CLI arguments
async fn build_action(
    kind: ActionKind,
    file: Option<String>,
    tool: Option<u16>,
    bed: Option<u16>,
) -> anyhow::Result<Action> {
    Ok(match kind {
        ActionKind::Print => Action::Print,
        ActionKind::Pause => Action::Pause,
        ActionKind::Resume => Action::Resume,
        ActionKind::Cancel => Action::Cancel,
        ActionKind::Shutdown => Action::Shutdown,
        ActionKind::Finish => Action::Finish,
        ActionKind::LoadFile => Action::LoadFile {
            file_name: file.ok_or_else(|| anyhow::anyhow!("load-file needs --file"))?,
        },
        ActionKind::Load => {
            let path = PathBuf::from(file.ok_or_else(|| anyhow::anyhow!("load needs --file"))?);
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| anyhow::anyhow!("invalid file path: {}", path.display()))?
                .to_string();
            let content = tokio::fs::read(&path).await?;
            Action::Load(Upload {
                file_name,
                content: content.into(),
            })
        }
        ActionKind::Preheat => Action::Preheat {
            tool: tool.ok_or_else(|| anyhow::anyhow!("preheat needs --tool"))?,
            bed: bed.ok_or_else(|| anyhow::anyhow!("preheat needs --bed"))?,
        },
    })
}
