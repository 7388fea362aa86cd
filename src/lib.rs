//! # Newscast
//!
//! Turns a list of web article URLs into a single spoken-audio newscast:
//! each page is fetched and reduced to readable text, summarized by an LLM
//! into a broadcast-style segment, spoken by a text-to-speech voice, and the
//! resulting clips are joined with a one-second pause between stories into
//! one MP3 file, framed by a dated welcome and a goodbye. A dry-run mode
//! skips speech entirely and writes the segment transcript instead.
//!
//! ## Usage
//!
//! ```sh
//! newscast generate https://example.com/story-1 https://example.com/story-2
//! newscast serve --port 3000
//! ```
//!
//! ## Architecture
//!
//! The pipeline runs strictly forward, one URL at a time:
//! 1. **Extraction**: fetch the page and strip it to visible text
//! 2. **Summarization**: condense the text via an OpenAI-compatible API
//! 3. **Synthesis**: speak each summary with a fixed ElevenLabs voice
//! 4. **Assembly**: concatenate the clips with silence gaps into one file
//!
//! A URL that fails any stage is logged and skipped; the run fails only when
//! every URL fails, or when a whole-run stage (framing synthesis, assembly,
//! persistence) does. Each stage sits behind a small trait, so the
//! [`newscast::NewscastGenerator`] can be driven against test doubles or
//! alternative providers.

pub mod assembler;
pub mod cli;
pub mod extractor;
pub mod newscast;
pub mod output;
pub mod server;
pub mod summarizer;
pub mod synthesizer;

pub use assembler::{AssemblyError, AudioAssembler, Mp3Assembler};
pub use extractor::{ContentExtractor, FetchError, HttpContentExtractor};
pub use newscast::{
    DefaultNewscastGenerator, GenerationOptions, NewscastArtifact, NewscastError,
    NewscastGenerator, OutputMode, Segment,
};
pub use summarizer::{OpenAiSummarizer, SummarizationError, Summarizer, SummaryStyle};
pub use synthesizer::{ElevenLabsSynthesizer, SpeechSynthesizer, SynthesisError};
