use std::path::{Path, PathBuf};
use std::process::Command;

use synoid_roughcut::agent::assignment::match_scenes_to_videos;
use synoid_roughcut::agent::clip_features::{ClipFeatureExtractor, Emotion, MediaFeatureExtractor};
use synoid_roughcut::agent::production_tools::render_rough_cut;
use synoid_roughcut::agent::ranking::{Preferences, RankingEngine};
use synoid_roughcut::agent::script_segmenter::segment;
use synoid_roughcut::agent::source_tools::{get_video_duration, probe_stream};
use synoid_roughcut::agent::transcription::NullTranscriber;
use synoid_roughcut::agent::vision_tools::extract_visual_stats;

fn ffmpeg_available() -> bool {
    let ok = |bin: &str| {
        Command::new(bin)
            .arg("-version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    };
    ok("ffmpeg") && ok("ffprobe")
}

/// Solid-colour test clip generated from the lavfi colour source.
fn make_clip(dir: &Path, name: &str, color: &str, seconds: u32) -> PathBuf {
    let path = dir.join(name);
    let status = Command::new("ffmpeg")
        .args([
            "-y",
            "-v",
            "error",
            "-f",
            "lavfi",
            "-i",
            &format!("color=c={}:size=320x240:rate=25:duration={}", color, seconds),
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
        ])
        .arg(&path)
        .output()
        .expect("Failed to execute ffmpeg");

    if !status.status.success() {
        panic!("Failed to create test clip: {}", String::from_utf8_lossy(&status.stderr));
    }
    path
}

#[test]
fn test_visual_stats_of_generated_clips() {
    if !ffmpeg_available() {
        eprintln!("ffmpeg not installed, skipping");
        return;
    }
    let dir = tempfile::tempdir().unwrap();

    let white = make_clip(dir.path(), "white.mp4", "white", 3);
    let stats = extract_visual_stats("ffmpeg", "ffprobe", &white).expect("clip should decode");
    assert!((stats.fps - 25.0).abs() < 0.01);
    assert!((stats.duration - 3.0).abs() < 0.2, "duration {}", stats.duration);
    assert!(stats.brightness() > 200.0);

    let probe = probe_stream("ffprobe", &white).unwrap();
    assert!(!probe.has_audio);
    assert!(probe.frame_count >= 70);

    let navy = make_clip(dir.path(), "navy.mp4", "0x000080", 1);
    let extractor = MediaFeatureExtractor::new("ffmpeg", "ffprobe", Box::new(NullTranscriber));
    let features = extractor.extract(&navy.to_string_lossy());
    assert_eq!(features.emotion, Emotion::Sad);
    assert_eq!(features.dialogue_text, "");
}

#[test]
fn test_corrupt_clip_degrades_to_neutral() {
    let dir = tempfile::tempdir().unwrap();
    let bogus = dir.path().join("bogus.mp4");
    std::fs::write(&bogus, b"this is not a video").unwrap();

    let extractor = MediaFeatureExtractor::new("ffmpeg", "ffprobe", Box::new(NullTranscriber));
    let features = extractor.extract(&bogus.to_string_lossy());
    assert!(features.visual.is_none());
    assert_eq!(features.emotion, Emotion::Neutral);
}

#[tokio::test]
async fn test_match_and_render_rough_cut() {
    if !ffmpeg_available() {
        eprintln!("ffmpeg not installed, skipping");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let bright = make_clip(dir.path(), "bright.mp4", "white", 4);
    let dark = make_clip(dir.path(), "dark.mp4", "0x800000", 4);

    let scenes = segment("INT. STAGE\nThe crowd smiles.\nEXT. ALLEY\nA man shouts.");
    let clips = vec![
        dark.to_string_lossy().to_string(),
        bright.to_string_lossy().to_string(),
    ];
    let extractor = MediaFeatureExtractor::new("ffmpeg", "ffprobe", Box::new(NullTranscriber));
    let prefs = Preferences::from_strs(None, Some("fast"), None);

    let result = match_scenes_to_videos(&RankingEngine::default(), &extractor, &scenes, &clips, &prefs);
    assert_eq!(result.matches.len(), 2);
    assert_eq!(result.matches[0].clip_id, clips[1]);
    assert_eq!(result.matches[1].clip_id, clips[0]);
    assert!((88..=99).contains(&result.confidence));

    let output = dir.path().join("out").join("cut.mp4");
    let summary = render_rough_cut("ffmpeg", "ffprobe", &result.matches, &output)
        .await
        .expect("render should succeed");
    assert_eq!(summary.segments, 2);
    assert_eq!(summary.skipped, 0);
    assert!(summary.size_mb > 0.0);

    // Each 3-word scene is 6.5s * 0.7, trimmed to the 4s clip.
    let duration = get_video_duration("ffprobe", &output).await.unwrap();
    assert!((duration - 8.0).abs() < 0.6, "got {}", duration);

    let leftovers: Vec<_> = std::fs::read_dir(output.parent().unwrap())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with('.'))
        .collect();
    assert!(leftovers.is_empty(), "temporary segments should be removed");
}
