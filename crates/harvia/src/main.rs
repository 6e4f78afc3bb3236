mod cli;
mod commands;
mod config;
mod error;
mod mcp;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use harvia_core::{Actions, Controller, CoreError, ListingPolicy};

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a backend connection
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "harvia", &mut std::io::stdout());
            Ok(())
        }

        // MCP tool server: one signed-in session for the life of the stdio stream
        Command::Mcp => {
            let resolved = config::resolve(&cli.global)?;
            let device = resolved.device;
            Controller::new(resolved.controller)
                .run_scoped(|controller| async move {
                    controller.authenticate().await?;
                    let server = mcp::McpServer::new(Actions::new(controller), device);
                    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
                    let outcome = server.serve(stdin, tokio::io::stdout()).await;
                    Ok::<_, CoreError>(outcome.map_err(CliError::from))
                })
                .await?
        }

        // All other commands sign in first so bad credentials fail early
        cmd => {
            let mut resolved = config::resolve(&cli.global)?;
            if matches!(cmd, Command::Devices(ref args) if args.skip_failed) {
                resolved.controller.listing_policy = ListingPolicy::SkipFailed;
            }

            tracing::debug!(command = ?cmd, "dispatching command");
            let global = &cli.global;
            let device = resolved.device;
            Controller::new(resolved.controller)
                .run_scoped(|controller| async move {
                    controller.authenticate().await?;
                    let actions = Actions::new(controller);
                    let outcome = commands::dispatch(cmd, &actions, global, device.as_deref()).await;
                    Ok::<_, CoreError>(outcome)
                })
                .await?
        }
    }
}
