use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use analytics_assistant::{
    config::{Config, LogFormat},
    dataset::Dataset,
    intent::EXAMPLE_QUESTIONS,
    render::{TerminalChartRenderer, TerminalTranscript},
    ConversationSession, ServiceAdapter,
};

/// Ask questions about student exercise performance.
#[derive(Debug, Parser)]
#[command(name = "analytics-assistant", version, about)]
struct Args {
    /// Dataset file (overrides DATASET_PATH)
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// Ask a single question and exit
    #[arg(long, short)]
    question: Option<String>,

    /// Answer local questions without the simulated delay
    #[arg(long)]
    no_delay: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(path) = args.dataset {
        config.dataset.path = path;
    }
    if args.no_delay {
        config.assistant.local_delay_ms = 0;
    }

    init_logging(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Analytics assistant starting..."
    );

    // A missing dataset is not fatal: the authored answers still work
    let dataset = match Dataset::load(&config.dataset.path) {
        Ok(d) => Some(Arc::new(d)),
        Err(e) => {
            warn!(
                path = %config.dataset.path.display(),
                error = %e,
                "Dataset unavailable, using authored answers"
            );
            None
        }
    };

    let adapter = match ServiceAdapter::from_config(&config, dataset) {
        Ok(a) => a,
        Err(e) => {
            error!(error = %e, "Failed to initialize service adapter");
            return Err(e.into());
        }
    };

    let mut session = ConversationSession::new(Arc::new(adapter), TerminalChartRenderer::stdout())
        .with_observer(Box::new(TerminalTranscript::stdout()));

    if let Some(question) = args.question {
        session.submit(&question).await?;
        session.close();
        return Ok(());
    }

    println!("Ask about student performance. Some examples:");
    for example in EXAMPLE_QUESTIONS {
        println!("  - {}", example);
    }
    println!("Type 'quit' to exit.");

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }

        if let Err(e) = session.submit(line).await {
            // Blank input: nothing to send
            info!(error = %e, "Question not submitted");
        }
    }

    let transcript = session.close();
    info!(messages = transcript.len(), "Assistant shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
