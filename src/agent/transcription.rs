// SYNOID Ear
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Dialogue text for candidate clips. Audio is pulled out with ffmpeg as
// 16 kHz mono WAV and handed to a whisper.cpp-compatible CLI.

use crate::agent::production_tools::safe_arg_path;
use crate::agent::source_tools::probe_stream;
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info, warn};

/// Turns a clip into its spoken text.
pub trait Transcriber: Send + Sync {
    fn transcribe(&self, clip: &Path) -> Result<String>;
}

/// Used when no speech engine is configured; every clip is silent.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTranscriber;

impl Transcriber for NullTranscriber {
    fn transcribe(&self, _clip: &Path) -> Result<String> {
        Ok(String::new())
    }
}

/// Shells out to `whisper-cli` (or any binary taking `-m MODEL -f WAV -nt`
/// and printing the transcript on stdout).
#[derive(Debug, Clone)]
pub struct WhisperCliTranscriber {
    pub ffmpeg: String,
    pub ffprobe: String,
    pub command: String,
    pub model: Option<PathBuf>,
    pub scratch_dir: PathBuf,
}

static SCRATCH_COUNTER: AtomicU64 = AtomicU64::new(0);

impl WhisperCliTranscriber {
    pub fn new(ffmpeg: &str, ffprobe: &str, command: &str, model: Option<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.to_string(),
            ffprobe: ffprobe.to_string(),
            command: command.to_string(),
            model,
            scratch_dir: std::env::temp_dir(),
        }
    }

    fn scratch_wav(&self) -> PathBuf {
        let n = SCRATCH_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.scratch_dir
            .join(format!("synoid_ear_{}_{}.wav", std::process::id(), n))
    }

    fn extract_audio(&self, clip: &Path, wav: &Path) -> Result<()> {
        let output = Command::new(&self.ffmpeg)
            .args(["-y", "-v", "error", "-nostdin", "-i"])
            .arg(safe_arg_path(clip))
            .args(["-vn", "-ac", "1", "-ar", "16000", "-c:a", "pcm_s16le"])
            .arg(safe_arg_path(wav))
            .output()
            .with_context(|| format!("Running {}", self.ffmpeg))?;

        if !output.status.success() {
            bail!(
                "audio extraction failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }

    fn run_whisper(&self, wav: &Path) -> Result<String> {
        let mut cmd = Command::new(&self.command);
        if let Some(model) = &self.model {
            cmd.arg("-m").arg(model);
        }
        let output = cmd
            .arg("-f")
            .arg(wav)
            .arg("-nt")
            .output()
            .with_context(|| format!("Running {}", self.command))?;

        if !output.status.success() {
            bail!(
                "whisper exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(normalize_transcript(&String::from_utf8_lossy(&output.stdout)))
    }
}

impl Transcriber for WhisperCliTranscriber {
    fn transcribe(&self, clip: &Path) -> Result<String> {
        let probe = probe_stream(&self.ffprobe, clip)?;
        if !probe.has_audio {
            info!("[EAR] No audio found in {:?}", clip);
            return Ok(String::new());
        }

        let wav = self.scratch_wav();
        let result = self
            .extract_audio(clip, &wav)
            .and_then(|_| self.run_whisper(&wav));
        let _ = std::fs::remove_file(&wav);
        result
    }
}

/// Collapse whisper's line-per-segment output into a single line.
/// Bracketed annotations such as `[BLANK_AUDIO]` are dropped.
pub fn normalize_transcript(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !(line.starts_with('[') && line.ends_with(']')))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Transcript of `clip`, or `""` on any failure.
pub fn dialogue_text<T: Transcriber + ?Sized>(transcriber: &T, clip: &Path) -> String {
    match transcriber.transcribe(clip) {
        Ok(text) => text,
        Err(e) => {
            warn!("[EAR] Transcription failed for {:?}: {:#}", clip, e);
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    impl Transcriber for Failing {
        fn transcribe(&self, _clip: &Path) -> Result<String> {
            bail!("engine crashed")
        }
    }

    #[test]
    fn test_failure_degrades_to_empty() {
        assert_eq!(dialogue_text(&Failing, Path::new("clip.mp4")), "");
    }

    #[test]
    fn test_null_transcriber_is_silent() {
        assert_eq!(dialogue_text(&NullTranscriber, Path::new("clip.mp4")), "");
    }

    #[test]
    fn test_normalize_transcript() {
        let raw = "\n  Hello there.\n[BLANK_AUDIO]\n General Kenobi! \n\n";
        assert_eq!(normalize_transcript(raw), "Hello there. General Kenobi!");
    }

    #[test]
    fn test_missing_clip_is_an_error_not_a_panic() {
        let t = WhisperCliTranscriber::new("ffmpeg", "ffprobe", "whisper-cli", None);
        assert!(t.transcribe(Path::new("no_such_clip.mp4")).is_err());
        assert_eq!(dialogue_text(&t, Path::new("no_such_clip.mp4")), "");
    }
}
