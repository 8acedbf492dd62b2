use clap::{Parser, Subcommand};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use filingqa_chain::{SessionCacheMap, SessionHandle};
use filingqa_cli::{InteractionLoop, Outcome};
use filingqa_core::config::{expand_path, AppConfig};

#[derive(Parser, Debug)]
#[command(name = "filingqa", version, about = "Ask questions about companies based on their SEC 10-K filings")]
struct Cli {
    /// Base config file (defaults to ./config.toml)
    #[arg(long, short, global = true, env = "FILINGQA_CONFIG")]
    config: Option<String>,

    /// Hide the progress spinner
    #[arg(long, global = true)]
    no_spinner: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Answer a single question and exit
    Ask {
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// Connect, verify the vector index and print what was found
    Check,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing();

    let config_path: Option<PathBuf> = cli.config.as_deref().map(expand_path);
    let cache = SessionCacheMap::new();
    let opened = match AppConfig::load(config_path.as_deref()) {
        Ok(config) => SessionHandle::open(&cache, &config).await.map(|s| (s, config)),
        Err(e) => Err(e),
    };
    let (session, config) = match opened {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("Error initializing the system: {e}");
            return Ok(ExitCode::FAILURE);
        }
    };

    let mut stdout = io::stdout().lock();
    match cli.command {
        Some(Command::Check) => {
            let info = session.store.index_info();
            println!("✅ Connected to {}", config.neo4j.uri);
            println!("📊 Index: {} on :{}({})", info.name, info.label, info.property);
            if let Some(dims) = info.dimensions {
                println!("   dimensions: {dims}");
            }
            if let Some(sim) = &info.similarity {
                println!("   similarity: {sim}");
            }
            println!("   nodes: {}", info.node_count);
            println!("   chat model: {}", session.chain.model_id());
        }
        Some(Command::Ask { question }) => {
            let repl = InteractionLoop::new(session, config.display.wrap_width).without_spinner();
            if repl.handle(&question.join(" "), &mut stdout).await? != Outcome::Answered {
                return Ok(ExitCode::FAILURE);
            }
        }
        None => {
            let mut repl = InteractionLoop::new(session, config.display.wrap_width);
            if cli.no_spinner || !io::stderr().is_terminal() {
                repl = repl.without_spinner();
            }
            repl.run(io::stdin().lock(), &mut stdout).await?;
        }
    }
    Ok(ExitCode::SUCCESS)
}
