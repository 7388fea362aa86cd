//! Command-line interface definitions.
//!
//! Two subcommands: `generate` runs the pipeline once over a URL list, and
//! `serve` exposes the same pipeline as an HTTP endpoint. Provider
//! credentials are not CLI arguments; they come from `OPENAI_API_KEY` and
//! `ELEVENLABS_API_KEY` and are only checked when first used.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::summarizer::SummaryStyle;

/// Command-line arguments for the newscast generator.
///
/// # Examples
///
/// ```sh
/// # One newscast from two articles
/// newscast generate https://example.com/story-1 https://example.com/story-2
///
/// # Transcript only, no speech synthesis
/// newscast generate --dry-run https://example.com/story-1
///
/// # HTTP API on port 8080
/// newscast serve --port 8080
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate one newscast from a list of article URLs
    Generate {
        /// Article URLs, processed in order
        #[arg(required = true)]
        urls: Vec<String>,

        /// Write a text transcript instead of synthesizing audio
        #[arg(long)]
        dry_run: bool,

        /// Directory for the output artifact
        #[arg(short, long, env = "NEWSCAST_OUTPUT_DIR", default_value = "output")]
        output_dir: PathBuf,

        /// Summary register: quick capsule or on-air segment
        #[arg(long, value_enum, default_value_t = SummaryStyle::Broadcast)]
        style: SummaryStyle,
    },

    /// Serve the pipeline as an HTTP API
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind
        #[arg(short, long, env = "NEWSCAST_PORT", default_value_t = 3000)]
        port: u16,

        /// Directory for output artifacts
        #[arg(short, long, env = "NEWSCAST_OUTPUT_DIR", default_value = "output")]
        output_dir: PathBuf,

        /// Summary register used for every request
        #[arg(long, value_enum, default_value_t = SummaryStyle::Broadcast)]
        style: SummaryStyle,
    },
}
