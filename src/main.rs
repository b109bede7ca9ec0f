use clap::Parser;
use std::io::IsTerminal;

use mask_detector::app;
use mask_detector::cli::{self, Args, Command};
use mask_detector::config::Config;

/// Logs go to stderr. With the terminal UI on screen they would corrupt it,
/// so they stay off unless stderr is redirected or `RUST_LOG` says otherwise.
fn init_logging(verbose: bool, tui: bool) {
    let default_level = if tui && std::io::stderr().is_terminal() {
        "off"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn main() {
    // .env may set RUST_LOG; it is fine for it not to exist.
    let _ = dotenv::dotenv();

    let args = Args::parse();
    let tui = args.command.is_none() && !args.headless;
    init_logging(args.verbose, tui);

    let mut config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    config.apply(&args.overrides());

    let result = match args.command {
        Some(Command::ListCameras) => cli::list_cameras().map_err(|e| e.to_string()),
        Some(Command::Config { action }) => {
            cli::handle_config_action(action, &config, args.config.as_deref())
                .map_err(|e| e.to_string())
        }
        None => run_detector(&config, args.headless),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run_detector(config: &Config, headless: bool) -> Result<(), String> {
    let runtime = tokio::runtime::Runtime::new().map_err(|e| e.to_string())?;
    runtime
        .block_on(app::run(config, headless))
        .map_err(|e| e.to_string())
}
