use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use helpsort::{server, ModelPaths, ServerConfig, TicketClassifier};
use log::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding the trained artifacts (defaults to $HELPSORT_MODELS
    /// or the platform data directory)
    #[arg(short, long, global = true)]
    models_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the classification API (default)
    Serve {
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        #[arg(short, long, default_value_t = 5000)]
        port: u16,
    },
    /// Classify a single ticket and print the result as JSON
    Classify {
        /// Ticket text
        text: String,
    },
    /// Print the label sequences of all three models
    Labels,
    /// Print the loaded artifacts, their digests and sizes
    Info,
}

fn load_classifier(models_dir: PathBuf) -> anyhow::Result<TicketClassifier> {
    let start_time = Instant::now();
    info!("Loading models from {:?}", models_dir);
    let classifier = TicketClassifier::load(&ModelPaths::from_dir(&models_dir))
        .with_context(|| format!("failed to load models from {:?}", models_dir))?;
    info!("Models loaded in {:.2?}", start_time.elapsed());
    Ok(classifier)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    helpsort::init_logger();
    let args = Args::parse();
    let models_dir = args
        .models_dir
        .unwrap_or_else(ModelPaths::default_models_dir);

    let command = args.command.unwrap_or_else(|| {
        let defaults = ServerConfig::default();
        Command::Serve {
            host: defaults.host,
            port: defaults.port,
        }
    });

    match command {
        Command::Serve { host, port } => {
            let config = ServerConfig {
                host,
                port,
                models_dir,
            };
            let addrs = config
                .socket_addrs()
                .with_context(|| format!("invalid listen address {}:{}", config.host, config.port))?;
            // Fail fast: nothing is served until every artifact has loaded.
            let classifier = load_classifier(config.models_dir.clone())?;
            server::serve(classifier, &addrs).await?;
        }
        Command::Classify { text } => {
            if text.trim().is_empty() {
                anyhow::bail!("Empty text");
            }
            let classifier = load_classifier(models_dir)?;
            let result = classifier.classify_all(text.trim())?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Labels => {
            let classifier = load_classifier(models_dir)?;
            let labels = serde_json::json!({
                "topic_labels": classifier.topic_labels(),
                "priority_labels": classifier.priority_labels(),
                "routing_labels": classifier.routing_labels(),
            });
            println!("{}", serde_json::to_string_pretty(&labels)?);
        }
        Command::Info => {
            let classifier = load_classifier(models_dir)?;
            println!("{}", serde_json::to_string_pretty(classifier.registry().info())?);
        }
    }

    Ok(())
}
