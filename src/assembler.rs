//! Audio assembly: concatenate per-segment MP3 clips into one newscast.
//!
//! Each input clip is decoded to mono PCM, the clips are stitched together
//! with a fixed silence gap between every adjacent pair, and the result is
//! re-encoded as a single mono MP3 stream. Input order is preserved exactly.
//!
//! Empty inputs are tolerated: a segment whose synthesis produced no bytes is
//! skipped with a warning rather than failing the whole newscast. Only when
//! nothing survives does assembly fail.

use std::io::Cursor;

use mp3lame_encoder::{Bitrate, Builder, FlushNoGap, MonoPcm, Quality, max_required_buffer_size};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, info, instrument, warn};

/// Silence inserted between adjacent segments, in milliseconds.
pub const SEGMENT_GAP_MS: u32 = 1000;

/// Errors produced while combining segment audio.
#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    /// Every input was empty; there is nothing to combine.
    #[error("no valid audio segments to combine")]
    NoValidSegments,
    /// One of the inputs could not be decoded.
    #[error("failed to decode audio segment {index}: {reason}")]
    Decode { index: usize, reason: String },
    /// The inputs do not share a sample rate.
    #[error("audio segment {index} has sample rate {found}, expected {expected}")]
    SampleRateMismatch {
        index: usize,
        expected: u32,
        found: u32,
    },
    /// Re-encoding the concatenation failed.
    #[error("failed to encode combined audio: {0}")]
    Encode(String),
}

/// Capability: combine an ordered sequence of encoded audio clips into one.
pub trait AudioAssembler: Send + Sync {
    /// Concatenate `segments` in order, inserting the configured silence gap
    /// between each surviving pair.
    fn assemble(&self, segments: &[Vec<u8>]) -> Result<Vec<u8>, AssemblyError>;
}

/// [`AudioAssembler`] for MP3 clips.
#[derive(Debug, Clone)]
pub struct Mp3Assembler {
    gap_ms: u32,
}

impl Mp3Assembler {
    pub fn new(gap_ms: u32) -> Self {
        Self { gap_ms }
    }
}

impl Default for Mp3Assembler {
    fn default() -> Self {
        Self::new(SEGMENT_GAP_MS)
    }
}

impl AudioAssembler for Mp3Assembler {
    #[instrument(level = "info", skip_all, fields(count = segments.len()))]
    fn assemble(&self, segments: &[Vec<u8>]) -> Result<Vec<u8>, AssemblyError> {
        let mut clips = Vec::with_capacity(segments.len());
        for (index, segment) in segments.iter().enumerate() {
            if segment.is_empty() {
                warn!(index, "Skipping empty audio segment");
                continue;
            }
            let clip = decode_to_mono(segment)
                .map_err(|reason| AssemblyError::Decode { index, reason })?;
            debug!(
                index,
                samples = clip.samples.len(),
                sample_rate = clip.sample_rate,
                "Decoded segment"
            );
            clips.push(clip);
        }

        if clips.is_empty() {
            return Err(AssemblyError::NoValidSegments);
        }

        let (pcm, sample_rate) = stitch_with_gaps(&clips, self.gap_ms)?;
        let encoded = encode_mp3(&pcm, sample_rate)?;
        info!(
            segments = clips.len(),
            duration_secs = pcm.len() as f32 / sample_rate as f32,
            bytes = encoded.len(),
            "Assembled newscast audio"
        );
        Ok(encoded)
    }
}

/// A decoded clip: mono samples at the container's native rate.
struct PcmClip {
    samples: Vec<f32>,
    sample_rate: u32,
}

/// Concatenate clips with `gap_ms` of silence between each adjacent pair.
///
/// No gap precedes the first clip or follows the last. All clips must share
/// a sample rate; the stitched samples and that rate are returned.
fn stitch_with_gaps(clips: &[PcmClip], gap_ms: u32) -> Result<(Vec<f32>, u32), AssemblyError> {
    let Some(first) = clips.first() else {
        return Err(AssemblyError::NoValidSegments);
    };
    let sample_rate = first.sample_rate;
    for (index, clip) in clips.iter().enumerate() {
        if clip.sample_rate != sample_rate {
            return Err(AssemblyError::SampleRateMismatch {
                index,
                expected: sample_rate,
                found: clip.sample_rate,
            });
        }
    }

    let gap_len = (sample_rate as usize * gap_ms as usize) / 1000;
    let total: usize =
        clips.iter().map(|c| c.samples.len()).sum::<usize>() + gap_len * (clips.len() - 1);

    let mut out = Vec::with_capacity(total);
    for (index, clip) in clips.iter().enumerate() {
        if index > 0 {
            out.resize(out.len() + gap_len, 0.0);
        }
        out.extend_from_slice(&clip.samples);
    }
    Ok((out, sample_rate))
}

/// Decode an encoded clip to mono PCM at its native sample rate.
///
/// Multi-channel audio is downmixed by averaging. Corrupt frames are skipped;
/// a clip that yields no samples at all is an error.
fn decode_to_mono(data: &[u8]) -> Result<PcmClip, String> {
    let cursor = Cursor::new(data.to_vec());
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

    let hint = Hint::new();
    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| format!("probe: {e}"))?;

    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| "no audio track found".to_string())?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let sample_rate = codec_params
        .sample_rate
        .ok_or_else(|| "unknown sample rate".to_string())?;
    let channels = codec_params.channels.map(|c| c.count()).unwrap_or(1);

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| format!("codec: {e}"))?;

    let mut samples: Vec<f32> = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(format!("packet: {e}")),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(symphonia::core::errors::Error::DecodeError(e)) => {
                warn!(error = %e, "Skipping corrupt audio frame");
                continue;
            }
            Err(e) => return Err(format!("decode: {e}")),
        };

        let spec = *decoded.spec();
        let num_frames = decoded.frames();
        if num_frames == 0 {
            continue;
        }

        let mut sample_buf = SampleBuffer::<f32>::new(num_frames as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        let interleaved = sample_buf.samples();

        if channels > 1 {
            for frame in interleaved.chunks(channels) {
                let mono: f32 = frame.iter().sum::<f32>() / channels as f32;
                samples.push(mono);
            }
        } else {
            samples.extend_from_slice(interleaved);
        }
    }

    if samples.is_empty() {
        return Err("no audio samples decoded".to_string());
    }

    Ok(PcmClip {
        samples,
        sample_rate,
    })
}

/// Encode mono PCM as a 128 kbps MP3 stream.
fn encode_mp3(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, AssemblyError> {
    let pcm: Vec<i16> = samples
        .iter()
        .map(|s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
        .collect();

    let mut builder =
        Builder::new().ok_or_else(|| AssemblyError::Encode("failed to allocate encoder".into()))?;
    builder
        .set_num_channels(1)
        .map_err(|e| AssemblyError::Encode(format!("{e:?}")))?;
    builder
        .set_sample_rate(sample_rate)
        .map_err(|e| AssemblyError::Encode(format!("{e:?}")))?;
    builder
        .set_brate(Bitrate::Kbps128)
        .map_err(|e| AssemblyError::Encode(format!("{e:?}")))?;
    builder
        .set_quality(Quality::Best)
        .map_err(|e| AssemblyError::Encode(format!("{e:?}")))?;
    let mut encoder = builder
        .build()
        .map_err(|e| AssemblyError::Encode(format!("{e:?}")))?;

    let mut out: Vec<u8> = Vec::new();
    out.reserve(max_required_buffer_size(pcm.len()));
    let written = encoder
        .encode(MonoPcm(&pcm), out.spare_capacity_mut())
        .map_err(|e| AssemblyError::Encode(format!("{e:?}")))?;
    // Safety: the encoder initialized exactly `written` bytes of the
    // reserved spare capacity.
    unsafe { out.set_len(out.len() + written) };

    let written = encoder
        .flush::<FlushNoGap>(out.spare_capacity_mut())
        .map_err(|e| AssemblyError::Encode(format!("{e:?}")))?;
    // Safety: as above, for the flushed tail.
    unsafe { out.set_len(out.len() + written) };

    Ok(out)
}
