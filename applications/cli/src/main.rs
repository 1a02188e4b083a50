/// Tunez - terminal music player
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tunez_cli::{
    app::{self, PreferenceSnapshot},
    shell, CliConfig,
};

#[derive(Parser)]
#[command(name = "tunez")]
#[command(about = "Tunez terminal player", long_about = None)]
struct Cli {
    /// Configuration file path (defaults to ./tunez.toml if present)
    #[arg(short, long, global = true, env = "TUNEZ_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive player
    Play {
        /// JSON file with tracks to replace the stored queue
        #[arg(short, long)]
        queue: Option<PathBuf>,
    },
    /// Inspect the stored queue
    Queue {
        #[command(subcommand)]
        command: QueueCommand,
    },
    /// Inspect or reset stored preferences
    Prefs {
        #[command(subcommand)]
        command: PrefsCommand,
    },
}

#[derive(Subcommand)]
enum QueueCommand {
    /// Print the stored queue
    Show,
}

#[derive(Subcommand)]
enum PrefsCommand {
    /// Print stored preferences as JSON
    Show,
    /// Restore every preference to its default
    Reset,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.as_deref())?;

    // Logs go to stderr so they never interleave with shell output
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Play { queue } => {
            let queue = queue.as_deref().map(app::load_queue_file).transpose()?;
            println!("tunez - type 'help' for commands");
            let stdin = BufReader::new(tokio::io::stdin());
            app::play(&config, queue, stdin, &mut std::io::stdout()).await?;
        }
        Commands::Queue {
            command: QueueCommand::Show,
        } => {
            let prefs = app::open_preferences(&config)?;
            println!(
                "{}",
                shell::render_queue(&prefs.queue.get(), prefs.current_index.get())
            );
        }
        Commands::Prefs {
            command: PrefsCommand::Show,
        } => {
            let prefs = app::open_preferences(&config)?;
            let snapshot = PreferenceSnapshot::capture(&prefs);
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Commands::Prefs {
            command: PrefsCommand::Reset,
        } => {
            let prefs = app::open_preferences(&config)?;
            prefs.reset();
            tracing::info!(path = %config.storage.path.display(), "Preferences reset");
        }
    }

    Ok(())
}
