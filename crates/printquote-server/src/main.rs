//! printquote binary: HTTP server plus offline quoting

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use printquote::{PricingParameters, Quoter, StepKernel};
use printquote_server::{start_server, AppState, ServerConfig, DEFAULT_MATERIAL};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "printquote", version, about = "3D-print quotes from STEP files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service
    Serve(ServerConfig),

    /// Price a STEP file and print the quote as JSON
    Quote {
        /// STEP file
        file: PathBuf,

        /// Filament name, as on the upload form
        #[arg(long, default_value = DEFAULT_MATERIAL)]
        material: String,

        /// Print every intermediate cost instead of the quote alone
        #[arg(long)]
        breakdown: bool,
    },

    /// Print units, solid count and measurements without pricing
    Inspect {
        /// STEP file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "printquote=info,printquote_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let quoter = Quoter::new(StepKernel);

    match cli.command {
        Command::Serve(config) => {
            start_server(&config, AppState::default()).await?;
        }
        Command::Quote {
            file,
            material,
            breakdown,
        } => {
            let params = PricingParameters::from_env();
            let report = tokio::task::spawn_blocking(move || quoter.report_file(&file, &material, &params))
                .await?
                .with_context(|| "failed to quote file")?;
            let json = if breakdown {
                serde_json::to_string_pretty(&report)?
            } else {
                serde_json::to_string_pretty(&report.quote)?
            };
            println!("{json}");
        }
        Command::Inspect { file } => {
            let inspection = tokio::task::spawn_blocking(move || quoter.inspect_file(&file))
                .await?
                .with_context(|| "failed to inspect file")?;
            println!("{}", serde_json::to_string_pretty(&inspection)?);
        }
    }

    Ok(())
}
