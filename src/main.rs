//! timer-sync CLI - A stopwatch mirrored between a phone and a watch
//!
//! Each device runs as a daemon (`timer-sync daemon --role phone|watch`);
//! the other subcommands talk to a daemon over its control socket.

use anyhow::Result;
use clap::{CommandFactory, Parser};

use timer_sync::cli::{Cli, Commands, Display, IpcClient};
use timer_sync::daemon::{self, DaemonOptions, DevicePaths};

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(default_log_level(&cli));

    // Execute command
    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Log level used when `RUST_LOG` is not set.
fn default_log_level(cli: &Cli) -> &'static str {
    if cli.verbose {
        "debug"
    } else if matches!(cli.command, Some(Commands::Daemon(_))) {
        "info"
    } else {
        "warn"
    }
}

/// Initializes the tracing subscriber for logging.
fn init_tracing(default_level: &str) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    if cli.verbose {
        tracing::debug!("Verbose mode enabled");
    }

    let Some(command) = cli.command else {
        // No command provided, show help
        Cli::command().print_help()?;
        return Ok(());
    };

    if let Commands::Completions { shell } = command {
        generate_completions(shell);
        return Ok(());
    }

    let paths = DevicePaths::resolve(cli.base_dir.as_deref())?;

    match command {
        Commands::Start(args) => {
            let response = IpcClient::for_device(&paths, args.device).start().await?;
            Display::show_start_success(&response);
        }
        Commands::Pause(args) => {
            let response = IpcClient::for_device(&paths, args.device).pause().await?;
            Display::show_pause_success(&response);
        }
        Commands::Stop(args) => {
            let response = IpcClient::for_device(&paths, args.device).stop().await?;
            Display::show_stop_success(&response);
        }
        Commands::Status(args) => {
            let response = IpcClient::for_device(&paths, args.device).status().await?;
            Display::show_status(args.device, &response);
        }
        Commands::Daemon(args) => {
            daemon::run(DaemonOptions {
                role: args.role,
                paths,
                config: args.to_config(),
            })
            .await?;
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================
