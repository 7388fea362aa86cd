use std::error::Error;
use std::sync::Arc;

use clap::Parser;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

use newscast::cli::{Cli, Command};
use newscast::newscast::{DefaultNewscastGenerator, GenerationOptions, OutputMode};
use newscast::output;
use newscast::server::{self, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    match args.command {
        Command::Generate {
            urls,
            dry_run,
            output_dir,
            style,
        } => {
            // Early check: ensure the output dir is writable before paying
            // for any provider calls.
            if let Err(e) = output::ensure_writable_dir(&output_dir).await {
                error!(
                    path = %output_dir.display(),
                    error = %e,
                    "Output directory is not writable (fix perms or choose a different path)"
                );
                return Err(e.into());
            }

            let mode = if dry_run {
                OutputMode::DryRun
            } else {
                OutputMode::FullAudio
            };
            let generator = DefaultNewscastGenerator::from_env(GenerationOptions {
                mode,
                style,
                output_dir,
            });

            let artifact = generator.generate(&urls).await?;
            info!(
                path = %artifact.path.display(),
                segments = artifact.summaries.len(),
                "Newscast complete"
            );
        }

        Command::Serve {
            host,
            port,
            output_dir,
            style,
        } => {
            if let Err(e) = output::ensure_writable_dir(&output_dir).await {
                error!(
                    path = %output_dir.display(),
                    error = %e,
                    "Output directory is not writable (fix perms or choose a different path)"
                );
                return Err(e.into());
            }

            let generator = DefaultNewscastGenerator::from_env(GenerationOptions {
                mode: OutputMode::FullAudio,
                style,
                output_dir,
            });
            let state = AppState {
                generator: Arc::new(generator),
            };

            let addr = format!("{host}:{port}");
            server::run(&addr, state).await?;
        }
    }

    let elapsed = start_time.elapsed();
    info!(?elapsed, "Execution complete");
    Ok(())
}
