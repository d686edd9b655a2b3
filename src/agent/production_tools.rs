// SYNOID Production Tools - Rough Cut Rendering
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// FFmpeg wrappers that turn a list of matches into a draft-quality video:
// each match is trimmed and normalised to a common format, then the
// segments are concatenated with the concat demuxer.

use crate::agent::ranking::Match;
use crate::agent::source_tools::get_video_duration;
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{info, warn};

/// Draft render settings.
pub const DRAFT_HEIGHT: u32 = 360;
pub const DRAFT_FPS: u32 = 20;
pub const DRAFT_VIDEO_BITRATE: &str = "300k";
pub const DRAFT_AUDIO_BITRATE: &str = "64k";

/// Prefix paths that start with `-` so ffmpeg does not read them as flags.
pub fn safe_arg_path(path: &Path) -> PathBuf {
    if path.to_string_lossy().starts_with('-') {
        Path::new(".").join(path)
    } else {
        path.to_path_buf()
    }
}

/// Result of a render
#[derive(Debug)]
pub struct RenderSummary {
    pub output_path: PathBuf,
    pub segments: usize,
    pub skipped: usize,
    pub size_mb: f64,
}

/// Trim window actually available in a clip of `clip_duration` seconds.
/// `None` when the match starts past the end of the clip.
pub fn trim_window(start: f64, end: f64, clip_duration: f64) -> Option<(f64, f64)> {
    if start >= clip_duration {
        return None;
    }
    let end = end.min(clip_duration);
    (end > start).then_some((start, end))
}

/// ffmpeg arguments for one normalised draft segment.
pub fn segment_args(input: &Path, start: f64, end: f64, has_audio: bool, output: &Path) -> Vec<String> {
    let seek = format!("{:.3}", start);
    let length = format!("{:.3}", end - start);
    let input = safe_arg_path(input).to_string_lossy().to_string();
    let output = safe_arg_path(output).to_string_lossy().to_string();
    let scale = format!("scale=-2:{}", DRAFT_HEIGHT);
    let fps = DRAFT_FPS.to_string();

    let mut args: Vec<&str> = vec!["-y", "-nostdin", "-v", "error", "-ss", seek.as_str(), "-t", length.as_str(), "-i", input.as_str()];

    if !has_audio {
        // Silent track keeps every segment's stream layout identical.
        args.extend([
            "-f",
            "lavfi",
            "-i",
            "anullsrc=channel_layout=stereo:sample_rate=44100",
            "-shortest",
        ]);
    }

    args.extend([
        "-map",
        "0:v:0",
        "-map",
        if has_audio { "0:a:0" } else { "1:a:0" },
        "-vf",
        scale.as_str(),
        "-r",
        fps.as_str(),
        "-c:v",
        "libx264",
        "-preset",
        "ultrafast",
        "-b:v",
        DRAFT_VIDEO_BITRATE,
        "-pix_fmt",
        "yuv420p",
        "-c:a",
        "aac",
        "-b:a",
        DRAFT_AUDIO_BITRATE,
        "-ar",
        "44100",
        "-ac",
        "2",
        output.as_str(),
    ]);
    args.into_iter().map(String::from).collect()
}

/// Concat demuxer list file body. Entries resolve relative to the list
/// file's directory.
pub fn concat_list(segments: &[PathBuf]) -> String {
    segments
        .iter()
        .map(|p| format!("file '{}'\n", p.to_string_lossy().replace('\'', "'\\''")))
        .collect()
}

async fn has_audio_stream(ffprobe: &str, path: &Path) -> bool {
    Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-select_streams",
            "a",
            "-show_entries",
            "stream=index",
            "-of",
            "csv=p=0",
        ])
        .arg(safe_arg_path(path))
        .output()
        .await
        .map(|o| o.status.success() && !String::from_utf8_lossy(&o.stdout).trim().is_empty())
        .unwrap_or(false)
}

async fn render_segment(
    ffmpeg: &str,
    ffprobe: &str,
    m: &Match,
    output: &Path,
) -> Result<Option<PathBuf>> {
    let input = Path::new(&m.clip_id);
    if !input.exists() {
        warn!("[RENDER] Video path not found: {}", m.clip_id);
        return Ok(None);
    }

    let clip_duration = get_video_duration(ffprobe, input).await?;
    let Some((start, end)) = trim_window(m.start, m.end, clip_duration) else {
        warn!(
            "[RENDER] Start time {:.2} is beyond video duration {:.2} for {}",
            m.start, clip_duration, m.clip_id
        );
        return Ok(None);
    };

    let has_audio = has_audio_stream(ffprobe, input).await;
    let args = segment_args(input, start, end, has_audio, output);
    let status = Command::new(ffmpeg).args(&args).status().await?;
    if !status.success() {
        bail!("FFmpeg segment render failed for {}", m.clip_id);
    }
    Ok(Some(output.to_path_buf()))
}

/// Render matches, in order, into one draft video at `output`.
pub async fn render_rough_cut(
    ffmpeg: &str,
    ffprobe: &str,
    matches: &[Match],
    output: &Path,
) -> Result<RenderSummary> {
    info!("[RENDER] Rendering {} matches into {:?}", matches.len(), output);

    let work_dir = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    tokio::fs::create_dir_all(&work_dir)
        .await
        .with_context(|| format!("Creating {:?}", work_dir))?;

    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "rough_cut".to_string());

    let mut segments = Vec::new();
    let mut skipped = 0;
    let mut failure = None;

    for (i, m) in matches.iter().enumerate() {
        let seg_path = work_dir.join(format!(".{}_seg{:03}.mp4", stem, i));
        match render_segment(ffmpeg, ffprobe, m, &seg_path).await {
            Ok(Some(path)) => segments.push(path),
            Ok(None) => skipped += 1,
            Err(e) => {
                warn!("[RENDER] Error loading clip {}: {:#}", m.clip_id, e);
                skipped += 1;
            }
        }
    }

    if segments.is_empty() {
        failure = Some(anyhow::anyhow!("no clips to concatenate"));
    }

    let list_path = work_dir.join(format!(".{}_concat.txt", stem));
    if failure.is_none() {
        let result = async {
            let names: Vec<PathBuf> = segments
                .iter()
                .filter_map(|p| p.file_name().map(PathBuf::from))
                .collect();
            tokio::fs::write(&list_path, concat_list(&names)).await?;
            let status = Command::new(ffmpeg)
                .args(["-y", "-nostdin", "-v", "error", "-f", "concat", "-safe", "0", "-i"])
                .arg(&list_path)
                .args(["-c", "copy"])
                .arg(safe_arg_path(output))
                .status()
                .await?;
            if !status.success() {
                bail!("FFmpeg concat failed");
            }
            Ok::<(), anyhow::Error>(())
        }
        .await;
        failure = result.err();
    }

    for seg in &segments {
        let _ = tokio::fs::remove_file(seg).await;
    }
    let _ = tokio::fs::remove_file(&list_path).await;

    if let Some(e) = failure {
        return Err(e);
    }

    let size_mb = std::fs::metadata(output)?.len() as f64 / 1_048_576.0;
    info!(
        "[RENDER] Rough cut complete: {} segments ({} skipped), {:.2} MB",
        segments.len(),
        skipped,
        size_mb
    );

    Ok(RenderSummary {
        output_path: output.to_path_buf(),
        segments: segments.len(),
        skipped,
        size_mb,
    })
}
