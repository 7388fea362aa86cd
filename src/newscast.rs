//! Newscast orchestration.
//!
//! Drives the pipeline across an ordered URL list: extract → summarize →
//! synthesize per URL, then assemble everything into one artifact. A failure
//! at any stage of one URL is logged and that URL is skipped; the run only
//! fails outright when *no* URL survives, or when a whole-run stage (framing
//! synthesis, assembly, persistence) fails.
//!
//! The welcome and goodbye framing segments are held apart from the
//! URL-derived story segments, so an all-failures run can never pass the
//! empty-result check on the strength of its framing alone.

use std::path::PathBuf;

use chrono::Local;
use futures::stream::{self, StreamExt};
use tracing::{info, instrument, warn};

use crate::assembler::{AssemblyError, AudioAssembler, Mp3Assembler};
use crate::extractor::{ContentExtractor, FetchError, HttpContentExtractor};
use crate::output;
use crate::summarizer::{OpenAiSummarizer, SummarizationError, Summarizer, SummaryStyle};
use crate::synthesizer::{ElevenLabsSynthesizer, SpeechSynthesizer, SynthesisError};

const GOODBYE_MESSAGE: &str = "That's all for today's news. Thank you for listening, \
    and we'll be back tomorrow with more stories.";

/// One unit of the newscast.
///
/// Fields are set at construction from pipeline outputs and never mutated.
/// `audio` is either complete, decodable bytes or absent; dry runs and
/// not-yet-synthesized segments carry `None`.
#[derive(Debug, Clone)]
pub struct Segment {
    /// Source URL, or a fixed label for framing segments.
    pub title: String,
    /// Raw extracted text (the spoken message itself for framing segments).
    pub content: String,
    /// The text that was or will be spoken.
    pub summary: String,
    /// Encoded audio bytes, when synthesis has run.
    pub audio: Option<Vec<u8>>,
}

/// Whether the run produces audio or a text transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Skip synthesis and assembly; write the summaries as text.
    DryRun,
    /// Synthesize every segment and assemble one audio file.
    FullAudio,
}

/// Configuration handed to the pipeline entry point.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    pub mode: OutputMode,
    pub style: SummaryStyle,
    pub output_dir: PathBuf,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            mode: OutputMode::FullAudio,
            style: SummaryStyle::Broadcast,
            output_dir: PathBuf::from("output"),
        }
    }
}

/// The persisted result of one run.
#[derive(Debug, Clone)]
pub struct NewscastArtifact {
    /// Path of the written audio file or transcript.
    pub path: PathBuf,
    /// URL-derived summaries, in input order.
    pub summaries: Vec<String>,
}

/// Any per-URL stage failure. Caught at the orchestrator loop and downgraded
/// to skip-and-continue.
#[derive(Debug, thiserror::Error)]
pub enum SegmentError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Summarization(#[from] SummarizationError),
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),
}

/// Failures fatal to the whole run.
#[derive(Debug, thiserror::Error)]
pub enum NewscastError {
    /// Every URL failed; framing segments do not count.
    #[error("no URL-derived segments were successfully generated")]
    EmptyResult,
    /// Welcome or goodbye synthesis failed.
    #[error("failed to synthesize {label} segment: {source}")]
    FramingSynthesis {
        label: &'static str,
        #[source]
        source: SynthesisError,
    },
    #[error(transparent)]
    Assembly(#[from] AssemblyError),
    #[error("failed to write output artifact: {0}")]
    Io(#[from] std::io::Error),
}

/// The pipeline driver, generic over the four external capabilities.
pub struct NewscastGenerator<E, S, T, A> {
    extractor: E,
    summarizer: S,
    synthesizer: T,
    assembler: A,
    options: GenerationOptions,
}

/// Generator wired to the default HTTP-backed implementations.
pub type DefaultNewscastGenerator =
    NewscastGenerator<HttpContentExtractor, OpenAiSummarizer, ElevenLabsSynthesizer, Mp3Assembler>;

impl DefaultNewscastGenerator {
    /// Build the production stack, sourcing credentials from the environment.
    /// Missing credentials surface at the first call that needs them.
    pub fn from_env(options: GenerationOptions) -> Self {
        Self::new(
            HttpContentExtractor::new(),
            OpenAiSummarizer::from_env(),
            ElevenLabsSynthesizer::from_env(),
            Mp3Assembler::default(),
            options,
        )
    }
}

impl<E, S, T, A> NewscastGenerator<E, S, T, A>
where
    E: ContentExtractor,
    S: Summarizer,
    T: SpeechSynthesizer,
    A: AudioAssembler,
{
    pub fn new(extractor: E, summarizer: S, synthesizer: T, assembler: A, options: GenerationOptions) -> Self {
        Self {
            extractor,
            summarizer,
            synthesizer,
            assembler,
            options,
        }
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    /// Run the pipeline over `urls` and persist one artifact.
    ///
    /// URLs are processed strictly in order, one at a time; the artifact
    /// preserves that order.
    #[instrument(level = "info", skip_all, fields(url_count = urls.len(), mode = ?self.options.mode))]
    pub async fn generate(&self, urls: &[String]) -> Result<NewscastArtifact, NewscastError> {
        info!("Generating newscast");

        let intro = self.framing_segment("Welcome", welcome_message()).await?;

        // One URL at a time, in order; a failed URL leaves no trace beyond
        // the log line.
        let stories: Vec<Segment> = stream::iter(urls)
            .then(|url| async move {
                match self.process_url(url).await {
                    Ok(segment) => {
                        info!(%url, "Segment ready");
                        Some(segment)
                    }
                    Err(e) => {
                        warn!(%url, error = %e, "Skipping article");
                        None
                    }
                }
            })
            .filter_map(std::future::ready)
            .collect()
            .await;

        info!(
            total = urls.len(),
            successful = stories.len(),
            failed = urls.len() - stories.len(),
            "Completed article processing"
        );
        if stories.is_empty() {
            return Err(NewscastError::EmptyResult);
        }

        let outro = self
            .framing_segment("Goodbye", GOODBYE_MESSAGE.to_string())
            .await?;

        let summaries: Vec<String> = stories.iter().map(|s| s.summary.clone()).collect();

        let path = match self.options.mode {
            OutputMode::DryRun => {
                output::write_transcript(&self.options.output_dir, &summaries).await?
            }
            OutputMode::FullAudio => {
                let clips: Vec<Vec<u8>> = intro
                    .iter()
                    .chain(stories.iter())
                    .chain(outro.iter())
                    .filter_map(|segment| segment.audio.clone())
                    .collect();
                let combined = self.assembler.assemble(&clips)?;
                output::write_newscast_audio(&self.options.output_dir, &combined).await?
            }
        };

        Ok(NewscastArtifact { path, summaries })
    }

    /// Run one URL through extract → summarize → (synthesize).
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn process_url(&self, url: &str) -> Result<Segment, SegmentError> {
        let content = self.extractor.extract(url).await?;
        let summary = self
            .summarizer
            .summarize(&content, self.options.style)
            .await?;

        let audio = match self.options.mode {
            OutputMode::FullAudio => Some(self.synthesizer.synthesize(&summary).await?),
            OutputMode::DryRun => None,
        };

        Ok(Segment {
            title: url.to_string(),
            content,
            summary,
            audio,
        })
    }

    /// Build a welcome/goodbye segment. Full-audio mode only; unlike the
    /// per-URL stages, a framing synthesis failure is fatal to the run.
    async fn framing_segment(
        &self,
        label: &'static str,
        message: String,
    ) -> Result<Option<Segment>, NewscastError> {
        if self.options.mode == OutputMode::DryRun {
            return Ok(None);
        }

        let audio = self
            .synthesizer
            .synthesize(&message)
            .await
            .map_err(|source| NewscastError::FramingSynthesis { label, source })?;
        info!(label, "Framing segment ready");

        Ok(Some(Segment {
            title: label.to_string(),
            content: message.clone(),
            summary: message,
            audio: Some(audio),
        }))
    }
}

fn welcome_message() -> String {
    format!(
        "Welcome to your daily news summary for {}. Here are today's top stories.",
        Local::now().format("%B %d, %Y")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::path::Path;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubExtractor {
        fail: HashSet<String>,
    }

    #[async_trait]
    impl ContentExtractor for StubExtractor {
        async fn extract(&self, url: &str) -> Result<String, FetchError> {
            if self.fail.contains(url) {
                Err(FetchError::Status {
                    url: url.to_string(),
                    status: reqwest::StatusCode::FORBIDDEN,
                })
            } else {
                Ok(format!("content for {url}"))
            }
        }
    }

    struct StubSummarizer;

    #[async_trait]
    impl Summarizer for StubSummarizer {
        async fn summarize(
            &self,
            content: &str,
            _style: SummaryStyle,
        ) -> Result<String, SummarizationError> {
            Ok(format!("summary of {content}"))
        }
    }

    struct CountingSynthesizer {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl SpeechSynthesizer for CountingSynthesizer {
        async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SynthesisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SynthesisError::MissingCredentials);
            }
            Ok(format!("[audio:{text}]").into_bytes())
        }
    }

    struct JoiningAssembler {
        calls: Arc<AtomicUsize>,
    }

    impl AudioAssembler for JoiningAssembler {
        fn assemble(&self, segments: &[Vec<u8>]) -> Result<Vec<u8>, AssemblyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let valid: Vec<_> = segments.iter().filter(|s| !s.is_empty()).collect();
            if valid.is_empty() {
                return Err(AssemblyError::NoValidSegments);
            }
            let mut out = Vec::new();
            for (index, segment) in valid.iter().enumerate() {
                if index > 0 {
                    out.extend_from_slice(b"<gap>");
                }
                out.extend_from_slice(segment);
            }
            Ok(out)
        }
    }

    struct Harness {
        generator: NewscastGenerator<
            StubExtractor,
            StubSummarizer,
            CountingSynthesizer,
            JoiningAssembler,
        >,
        synth_calls: Arc<AtomicUsize>,
        assemble_calls: Arc<AtomicUsize>,
        dir: PathBuf,
    }

    fn harness(name: &str, mode: OutputMode, fail: &[&str]) -> Harness {
        let dir =
            std::env::temp_dir().join(format!("newscast-test-{}-{}", name, std::process::id()));
        let synth_calls = Arc::new(AtomicUsize::new(0));
        let assemble_calls = Arc::new(AtomicUsize::new(0));
        let generator = NewscastGenerator::new(
            StubExtractor {
                fail: fail.iter().map(|s| s.to_string()).collect(),
            },
            StubSummarizer,
            CountingSynthesizer {
                calls: Arc::clone(&synth_calls),
                fail: false,
            },
            JoiningAssembler {
                calls: Arc::clone(&assemble_calls),
            },
            GenerationOptions {
                mode,
                style: SummaryStyle::Brief,
                output_dir: dir.clone(),
            },
        );
        Harness {
            generator,
            synth_calls,
            assemble_calls,
            dir,
        }
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack
            .windows(needle.len())
            .position(|window| window == needle)
    }

    fn cleanup(dir: &Path) {
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_all_urls_failing_is_empty_result() {
        let h = harness(
            "all-fail",
            OutputMode::FullAudio,
            &["http://a.example", "http://b.example"],
        );
        let urls = vec!["http://a.example".to_string(), "http://b.example".to_string()];

        let err = h.generator.generate(&urls).await.unwrap_err();
        assert!(matches!(err, NewscastError::EmptyResult));
        // The welcome segment was synthesized, but did not rescue the run.
        assert_eq!(h.synth_calls.load(Ordering::SeqCst), 1);
        cleanup(&h.dir);
    }

    #[tokio::test]
    async fn test_dry_run_never_synthesizes_or_assembles() {
        let h = harness("dry-run", OutputMode::DryRun, &[]);
        let urls = vec!["http://a.example".to_string(), "http://b.example".to_string()];

        let artifact = h.generator.generate(&urls).await.unwrap();
        assert_eq!(h.synth_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.assemble_calls.load(Ordering::SeqCst), 0);

        let text = std::fs::read_to_string(&artifact.path).unwrap();
        assert_eq!(
            text,
            "summary of content for http://a.example\n\n\
             summary of content for http://b.example\n\n"
        );
        cleanup(&h.dir);
    }

    #[tokio::test]
    async fn test_full_audio_orders_framing_and_stories_with_gaps() {
        let h = harness("full-order", OutputMode::FullAudio, &[]);
        let urls = vec!["http://a.example".to_string(), "http://b.example".to_string()];

        let artifact = h.generator.generate(&urls).await.unwrap();
        // Welcome + two stories + goodbye.
        assert_eq!(h.synth_calls.load(Ordering::SeqCst), 4);
        assert_eq!(h.assemble_calls.load(Ordering::SeqCst), 1);

        let bytes = std::fs::read(&artifact.path).unwrap();
        let gaps = bytes
            .windows(b"<gap>".len())
            .filter(|window| *window == b"<gap>")
            .count();
        assert_eq!(gaps, 3);

        let welcome = find(&bytes, b"Welcome to your daily news summary").unwrap();
        let first = find(&bytes, b"summary of content for http://a.example").unwrap();
        let second = find(&bytes, b"summary of content for http://b.example").unwrap();
        let goodbye = find(&bytes, b"That's all for today's news").unwrap();
        assert!(welcome < first && first < second && second < goodbye);

        assert_eq!(artifact.summaries.len(), 2);
        cleanup(&h.dir);
    }

    #[tokio::test]
    async fn test_failed_url_is_skipped_without_aborting() {
        let h = harness("skip-one", OutputMode::DryRun, &["http://bad.example"]);
        let urls = vec![
            "http://bad.example".to_string(),
            "http://good.example".to_string(),
        ];

        let artifact = h.generator.generate(&urls).await.unwrap();
        assert_eq!(
            artifact.summaries,
            vec!["summary of content for http://good.example".to_string()]
        );

        let text = std::fs::read_to_string(&artifact.path).unwrap();
        assert!(!text.contains("bad.example"));
        cleanup(&h.dir);
    }

    #[tokio::test]
    async fn test_framing_synthesis_failure_is_fatal() {
        let dir = std::env::temp_dir().join(format!("newscast-test-framing-{}", std::process::id()));
        let generator = NewscastGenerator::new(
            StubExtractor {
                fail: HashSet::new(),
            },
            StubSummarizer,
            CountingSynthesizer {
                calls: Arc::new(AtomicUsize::new(0)),
                fail: true,
            },
            JoiningAssembler {
                calls: Arc::new(AtomicUsize::new(0)),
            },
            GenerationOptions {
                mode: OutputMode::FullAudio,
                style: SummaryStyle::Brief,
                output_dir: dir.clone(),
            },
        );

        let urls = vec!["http://a.example".to_string()];
        let err = generator.generate(&urls).await.unwrap_err();
        assert!(matches!(
            err,
            NewscastError::FramingSynthesis { label: "Welcome", .. }
        ));
        cleanup(&dir);
    }

    #[test]
    fn test_welcome_message_contains_date() {
        let message = welcome_message();
        assert!(message.starts_with("Welcome to your daily news summary for "));
        assert!(message.ends_with("Here are today's top stories."));
        let year = Local::now().format("%Y").to_string();
        assert!(message.contains(&year));
    }
}
