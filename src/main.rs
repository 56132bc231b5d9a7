//! RefVault Binary
//!
//! Runs the command tokens given as arguments, then keeps reading batches
//! of tokens from stdin until QUIT or end of input.

use clap::Parser;
use refvault::{Config, Exit, Repl, Result, USAGE};
use std::path::PathBuf;
use std::process;
use tokio::io::BufReader;
use tokio::signal;
use tracing::error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "refvault", version, about = "In-memory key-value table with transaction support")]
struct Args {
    /// JSON config file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Command tokens to run first, e.g. PUT=A,1 GET=A
    #[arg(value_name = "COMMAND", allow_hyphen_values = true)]
    commands: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    init_tracing(&config);

    if args.commands.is_empty() {
        print!("{}", USAGE);
        return Ok(());
    }

    let mut repl = Repl::new(config);

    // Ctrl+C discards the session instead of committing it
    let handle = repl.shutdown_handle();
    tokio::spawn(async move {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            return;
        }
        if let Err(e) = handle.shutdown() {
            error!(error = %e, "failed to initiate shutdown");
        }
    });

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();

    // The error report has already been written by the loop.
    let code = match repl.run(&args.commands, stdin, &mut stdout).await {
        Ok(Exit::Interrupted) => 130,
        Ok(Exit::Quit) | Ok(Exit::EndOfInput) => 0,
        Err(_) => 1,
    };

    // A pending stdin read would otherwise hold the runtime open.
    process::exit(code);
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_env("REFVAULT_LOG")
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
