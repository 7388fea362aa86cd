//! Filesystem persistence for newscast artifacts.
//!
//! Artifacts land in a configurable output directory, created on demand, and
//! are named by generation time: `newscast_<unix_timestamp>.mp3` for audio,
//! `newscast_<unix_timestamp>.txt` for dry-run transcripts.

use std::fs as stdfs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::fs;
use tracing::{info, instrument};

/// Ensure a directory exists and is writable.
///
/// Creates the directory if absent, then performs a write test by creating
/// and immediately deleting a probe file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> std::io::Result<()> {
    fs::create_dir_all(path).await?;
    // Small sync probe write; simpler error surface than an async handle.
    let probe_path = path.join(".__probe_write__");
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}

/// Write the final newscast audio, returning the artifact path.
pub async fn write_newscast_audio(dir: &Path, audio: &[u8]) -> std::io::Result<PathBuf> {
    fs::create_dir_all(dir).await?;
    let path = dir.join(format!("newscast_{}.mp3", Utc::now().timestamp()));
    fs::write(&path, audio).await?;
    info!(path = %path.display(), bytes = audio.len(), "Wrote newscast audio");
    Ok(path)
}

/// Write a dry-run transcript: one block per summary, blank-line separated.
pub async fn write_transcript(dir: &Path, summaries: &[String]) -> std::io::Result<PathBuf> {
    fs::create_dir_all(dir).await?;
    let path = dir.join(format!("newscast_{}.txt", Utc::now().timestamp()));

    let mut text = String::new();
    for summary in summaries {
        text.push_str(summary);
        text.push_str("\n\n");
    }

    fs::write(&path, text).await?;
    info!(path = %path.display(), blocks = summaries.len(), "Wrote newscast transcript");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("newscast-output-{}-{}", name, std::process::id()))
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_missing_dirs() {
        let dir = scratch_dir("ensure").join("nested/deeper");
        ensure_writable_dir(&dir).await.unwrap();
        assert!(dir.is_dir());
        // Idempotent on the second call.
        ensure_writable_dir(&dir).await.unwrap();
        let _ = stdfs::remove_dir_all(scratch_dir("ensure"));
    }

    #[tokio::test]
    async fn test_write_newscast_audio_names_by_timestamp() {
        let dir = scratch_dir("audio");
        let path = write_newscast_audio(&dir, b"mp3-bytes").await.unwrap();

        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("newscast_"));
        assert!(name.ends_with(".mp3"));
        assert_eq!(stdfs::read(&path).unwrap(), b"mp3-bytes");
        let _ = stdfs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_write_transcript_blank_line_separates_blocks() {
        let dir = scratch_dir("transcript");
        let summaries = vec!["First story.".to_string(), "Second story.".to_string()];
        let path = write_transcript(&dir, &summaries).await.unwrap();

        let text = stdfs::read_to_string(&path).unwrap();
        assert_eq!(text, "First story.\n\nSecond story.\n\n");
        assert!(path.to_string_lossy().ends_with(".txt"));
        let _ = stdfs::remove_dir_all(dir);
    }
}
