// SYNOID Source Tools - Clip Discovery & Probing
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// This module handles:
// 1. Stream probing via ffprobe (frame rate, frame count, audio presence)
// 2. Duration lookups for the render stage
// 3. Directory scanning for candidate clips

use crate::agent::production_tools::safe_arg_path;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv", "avi", "webm"];

/// What ffprobe reports about a clip's first video stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamProbe {
    pub fps: f64,
    pub frame_count: u64,
    pub duration: f64,
    pub has_audio: bool,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
    nb_frames: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Parse an ffprobe rational such as `30000/1001`. `0/0` gives 0.
pub fn parse_frame_rate(raw: &str) -> f64 {
    match raw.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().unwrap_or(0.0);
            let den: f64 = den.trim().parse().unwrap_or(0.0);
            if den > 0.0 {
                num / den
            } else {
                0.0
            }
        }
        None => raw.trim().parse().unwrap_or(0.0),
    }
}

fn parse_probe_json(json: &str) -> Result<StreamProbe> {
    let parsed: FfprobeOutput = serde_json::from_str(json).context("Parsing ffprobe JSON")?;

    let Some(video) = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
    else {
        bail!("no video stream");
    };

    let fps = [video.avg_frame_rate.as_deref(), video.r_frame_rate.as_deref()]
        .into_iter()
        .flatten()
        .map(parse_frame_rate)
        .find(|f| *f > 0.0)
        .unwrap_or(0.0);

    let stream_secs = video
        .duration
        .as_deref()
        .or(parsed.format.as_ref().and_then(|f| f.duration.as_deref()))
        .and_then(|d| d.trim().parse::<f64>().ok())
        .unwrap_or(0.0);

    let frame_count = video
        .nb_frames
        .as_deref()
        .and_then(|n| n.trim().parse::<u64>().ok())
        .filter(|n| *n > 0)
        .unwrap_or_else(|| (stream_secs * fps).round().max(0.0) as u64);

    let duration = if fps > 0.0 { frame_count as f64 / fps } else { 0.0 };
    let has_audio = parsed
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    Ok(StreamProbe {
        fps,
        frame_count,
        duration,
        has_audio,
    })
}

/// Probe a clip with ffprobe. Fails when the file cannot be opened or has
/// no video stream.
pub fn probe_stream(ffprobe: &str, path: &Path) -> Result<StreamProbe> {
    let output = std::process::Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-show_entries",
            "stream=codec_type,avg_frame_rate,r_frame_rate,nb_frames,duration:format=duration",
            "-of",
            "json",
        ])
        .arg(safe_arg_path(path))
        .output()
        .with_context(|| format!("Running {}", ffprobe))?;

    if !output.status.success() {
        bail!(
            "ffprobe failed on {:?}: {}",
            path,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    let probe = parse_probe_json(&String::from_utf8_lossy(&output.stdout))
        .with_context(|| format!("Probing {:?}", path))?;
    debug!("[SOURCE] {:?}: {:?}", path, probe);
    Ok(probe)
}

/// Container duration in seconds, with a timeout.
pub async fn get_video_duration(ffprobe: &str, path: &Path) -> Result<f64> {
    let safe_path = safe_arg_path(path);

    let output = tokio::time::timeout(
        tokio::time::Duration::from_secs(10),
        tokio::process::Command::new(ffprobe)
            .kill_on_drop(true)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(&safe_path)
            .output(),
    )
    .await
    .context("ffprobe duration check timed out")??;

    let duration: f64 = String::from_utf8_lossy(&output.stdout)
        .trim()
        .parse()
        .with_context(|| format!("Failed to parse duration of {:?}", path))?;
    Ok(duration)
}

pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// All video files under `dir`, sorted by path.
pub fn scan_directory_for_videos(dir: &Path) -> Vec<PathBuf> {
    let mut videos: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_video_file(e.path()))
        .map(|e| e.into_path())
        .collect();
    videos.sort();
    videos
}

/// Expand CLI inputs into clip ids: directories are scanned, files are
/// kept as given. Missing paths are skipped with a warning.
pub fn collect_clip_paths(inputs: &[PathBuf]) -> Vec<String> {
    let mut clips = Vec::new();
    for input in inputs {
        if input.is_dir() {
            clips.extend(
                scan_directory_for_videos(input)
                    .into_iter()
                    .map(|p| p.to_string_lossy().to_string()),
            );
        } else if input.is_file() {
            clips.push(input.to_string_lossy().to_string());
        } else {
            warn!("[SOURCE] Clip path not found: {:?}", input);
        }
    }
    clips
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate("30/1"), 30.0);
        assert!((parse_frame_rate("30000/1001") - 29.97).abs() < 0.01);
        assert_eq!(parse_frame_rate("0/0"), 0.0);
        assert_eq!(parse_frame_rate("25"), 25.0);
        assert_eq!(parse_frame_rate("garbage"), 0.0);
    }

    #[test]
    fn test_parse_probe_json_counts_frames() {
        let json = r#"{
            "streams": [
                {"codec_type": "video", "avg_frame_rate": "25/1", "r_frame_rate": "25/1", "nb_frames": "100"},
                {"codec_type": "audio"}
            ],
            "format": {"duration": "4.000000"}
        }"#;
        let probe = parse_probe_json(json).unwrap();
        assert_eq!(probe.fps, 25.0);
        assert_eq!(probe.frame_count, 100);
        assert_eq!(probe.duration, 4.0);
        assert!(probe.has_audio);
    }

    #[test]
    fn test_parse_probe_json_estimates_missing_frame_count() {
        let json = r#"{
            "streams": [{"codec_type": "video", "avg_frame_rate": "0/0", "r_frame_rate": "30/1"}],
            "format": {"duration": "2.0"}
        }"#;
        let probe = parse_probe_json(json).unwrap();
        assert_eq!(probe.fps, 30.0);
        assert_eq!(probe.frame_count, 60);
        assert!(!probe.has_audio);
    }

    #[test]
    fn test_parse_probe_json_without_video() {
        let json = r#"{"streams": [{"codec_type": "audio"}]}"#;
        assert!(parse_probe_json(json).is_err());
    }

    #[test]
    fn test_scan_directory_filters_extensions() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.MP4"), b"").unwrap();
        std::fs::write(dir.path().join("a.mov"), b"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("c.webm"), b"").unwrap();

        let found = scan_directory_for_videos(dir.path());
        let names: Vec<String> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.mov", "b.MP4", "c.webm"]);
    }

    #[test]
    fn test_collect_clip_paths_skips_missing() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("one.mp4");
        std::fs::write(&file, b"").unwrap();
        let clips = collect_clip_paths(&[file.clone(), dir.path().join("missing.mp4")]);
        assert_eq!(clips, vec![file.to_string_lossy().to_string()]);
    }
}
