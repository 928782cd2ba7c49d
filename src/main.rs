use clap::Parser;
use hamly::cli::{Cli, Commands, attrs_command, escape_command, render_command, values_command};
use hamly::config::constants;
use hamly::logging;
use tracing::error;

#[tokio::main]
async fn main() {
    constants::init_constants();

    let log_file = match logging::create_log_file() {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!("Logging to file disabled: {}", e);
            None
        }
    };
    logging::init_tracing(log_file);

    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Cli::parse();
    match args.cmd {
        Commands::Escape {
            sources,
            output_dir,
            mode,
            watch,
        } => {
            escape_command(sources, output_dir, mode.into(), watch).await?;
        }
        Commands::Values { input, soft } => {
            values_command(input, soft).await?;
        }
        Commands::Attrs { input } => {
            attrs_command(input).await?;
        }
        Commands::Render {
            template,
            context,
            output,
        } => {
            render_command(template, context, output).await?;
        }
    }
    Ok(())
}
