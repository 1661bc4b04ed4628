mod cli;
mod config;
mod errors;
mod render_cmd;
mod run_cmd;
mod validate_cmd;

use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()
        .ok();

    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Run {
            workflow,
            adapter,
            dry_run,
            max_cycles,
            session_name,
            resume,
            json_errors,
            cd,
            vars,
        } => {
            run_cmd::handle_run(
                workflow,
                adapter,
                dry_run,
                max_cycles,
                session_name,
                resume,
                json_errors,
                cd,
                vars,
            )
            .await
        }
        Commands::Render {
            workflow,
            cycle,
            cd,
            vars,
        } => match render_cmd::handle_render(workflow, cycle, cd, vars).await {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("error: {e}");
                2
            }
        },
        Commands::Validate {
            workflow,
            lenient,
            format,
        } => validate_cmd::handle_validate(workflow, lenient, format).await,
    };

    std::process::exit(exit_code);
}
