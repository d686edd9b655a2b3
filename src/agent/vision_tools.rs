// SYNOID Vision Tools
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Visual statistics for candidate clips: frame rate and length from
// ffprobe, mean colour of the middle frame decoded by ffmpeg.

use crate::agent::clip_features::{classify_emotion, Emotion, VisualStats};
use crate::agent::production_tools::safe_arg_path;
use crate::agent::source_tools::probe_stream;
use anyhow::{bail, Context, Result};
use image::DynamicImage;
use std::path::Path;
use std::process::Command;
use tracing::{info, warn};

/// Mean colour of an image in BGR order.
pub fn average_bgr(img: &DynamicImage) -> [f64; 3] {
    let rgb = img.to_rgb8();
    let pixels = (rgb.width() as u64 * rgb.height() as u64) as f64;
    if pixels == 0.0 {
        return [0.0; 3];
    }

    let mut sums = [0u64; 3];
    for pixel in rgb.pixels() {
        sums[0] += pixel[2] as u64;
        sums[1] += pixel[1] as u64;
        sums[2] += pixel[0] as u64;
    }
    sums.map(|s| s as f64 / pixels)
}

/// Decode frame `index` of `path` through an ffmpeg PNG pipe.
pub fn extract_frame(ffmpeg: &str, path: &Path, index: u64) -> Result<DynamicImage> {
    let select = format!("select=eq(n\\,{})", index);
    let output = Command::new(ffmpeg)
        .args(["-v", "error", "-nostdin", "-i"])
        .arg(safe_arg_path(path))
        .args([
            "-vf",
            select.as_str(),
            "-vframes",
            "1",
            "-f",
            "image2pipe",
            "-vcodec",
            "png",
            "-",
        ])
        .output()
        .with_context(|| format!("Running {}", ffmpeg))?;

    if !output.status.success() || output.stdout.is_empty() {
        bail!(
            "ffmpeg could not decode frame {} of {:?}: {}",
            index,
            path,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    image::load_from_memory(&output.stdout).context("Decoding sampled frame")
}

/// Duration, frame rate and middle-frame colour of a clip.
///
/// `None` when the clip cannot be opened. An unreadable middle frame only
/// zeroes the colour.
pub fn extract_visual_stats(ffmpeg: &str, ffprobe: &str, path: &Path) -> Option<VisualStats> {
    let probe = match probe_stream(ffprobe, path) {
        Ok(p) => p,
        Err(e) => {
            warn!("[EYES] Cannot open {:?}: {:#}", path, e);
            return None;
        }
    };

    let avg_color = if probe.frame_count > 0 {
        match extract_frame(ffmpeg, path, probe.frame_count / 2) {
            Ok(frame) => average_bgr(&frame),
            Err(e) => {
                warn!("[EYES] Middle frame unreadable for {:?}: {:#}", path, e);
                [0.0; 3]
            }
        }
    } else {
        [0.0; 3]
    };

    Some(VisualStats {
        duration: probe.duration,
        fps: probe.fps,
        avg_color,
    })
}

/// Emotion of a still image (webcam snapshot, thumbnail).
/// Undecodable images are neutral.
pub fn detect_image_emotion(path: &Path) -> Emotion {
    match image::open(path) {
        Ok(img) => emotion_of_image(&img),
        Err(e) => {
            warn!("[EYES] Cannot decode image {:?}: {}", path, e);
            Emotion::Neutral
        }
    }
}

/// Emotion of in-memory encoded image bytes.
pub fn detect_emotion_from_bytes(bytes: &[u8]) -> Emotion {
    match image::load_from_memory(bytes) {
        Ok(img) => emotion_of_image(&img),
        Err(e) => {
            warn!("[EYES] Cannot decode image bytes: {}", e);
            Emotion::Neutral
        }
    }
}

fn emotion_of_image(img: &DynamicImage) -> Emotion {
    let stats = VisualStats {
        duration: 0.0,
        fps: 0.0,
        avg_color: average_bgr(img),
    };
    let emotion = classify_emotion(Some(&stats));
    info!("[EYES] Image brightness {:.1} -> {}", stats.brightness(), emotion);
    emotion
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn solid(r: u8, g: u8, b: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([r, g, b])))
    }

    #[test]
    fn test_average_is_bgr() {
        assert_eq!(average_bgr(&solid(200, 100, 10)), [10.0, 100.0, 200.0]);
    }

    #[test]
    fn test_average_mixed_pixels() {
        let mut img = RgbImage::from_pixel(2, 1, Rgb([0, 0, 0]));
        img.put_pixel(1, 0, Rgb([100, 50, 20]));
        assert_eq!(average_bgr(&DynamicImage::ImageRgb8(img)), [10.0, 25.0, 50.0]);
    }

    #[test]
    fn test_image_emotions() {
        assert_eq!(emotion_of_image(&solid(250, 250, 250)), Emotion::Happy);
        assert_eq!(emotion_of_image(&solid(150, 30, 30)), Emotion::Angry);
        assert_eq!(emotion_of_image(&solid(20, 30, 120)), Emotion::Sad);
        assert_eq!(emotion_of_image(&solid(80, 80, 80)), Emotion::Neutral);
    }

    #[test]
    fn test_garbage_bytes_are_neutral() {
        assert_eq!(detect_emotion_from_bytes(b"not an image"), Emotion::Neutral);
        assert_eq!(detect_image_emotion(Path::new("does/not/exist.png")), Emotion::Neutral);
    }

    #[test]
    fn test_missing_clip_has_no_visuals() {
        assert!(extract_visual_stats("ffmpeg", "ffprobe", Path::new("no_such_clip.mp4")).is_none());
    }
}
