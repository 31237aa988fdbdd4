//! sfx-forge CLI
//!
//! Command-line interface for building derived sound assets.

use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;
use log::{debug, error};

use sfx_forge::cli::{commands, Cli, Commands};
use sfx_forge::Result;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    debug!("sfx-forge v{}", env!("CARGO_PKG_VERSION"));

    let result = match cli.command {
        Some(cmd) => handle_command(cmd),
        None => {
            println!("sfx-forge v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Hint: {}", e.recovery_hint());
            ExitCode::FAILURE
        }
    }
}

fn handle_command(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::BarkSequence {
            dir,
            output,
            bitrate,
        } => commands::bark_sequence(&dir, output.as_deref(), bitrate),
        Commands::WaterBoost {
            dir,
            gain_db,
            output,
            bitrate,
        } => commands::water_boost(&dir, gain_db, output.as_deref(), bitrate),
        Commands::Concat {
            dir,
            output,
            segments,
            bitrate,
        } => commands::concat(&dir, &output, &segments, bitrate),
        Commands::Gain {
            dir,
            input,
            output,
            db,
            bitrate,
        } => commands::gain(&dir, &input, &output, db, bitrate),
        Commands::Run { path, dir } => commands::run(&path, dir.as_deref()),
        Commands::Inspect { file } => commands::inspect(&file),
    }
}
